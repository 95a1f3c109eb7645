//! Deep structural equality for plain data values
//!
//! Objects are equal when they have the same key set and every value is
//! deeply equal. Arrays are compared element-wise and must have the same
//! length. Strings and scalars compare with `==`, so `1` and `1.0` differ
//! exactly when their JSON representations differ.

use serde_json::Value;

/// Deep comparison of two plain values
///
/// # Example
/// ```
/// use serde_json::json;
/// use suthing::compare::equals;
///
/// assert!(equals(&json!({"a": [1, {"b": "c"}]}), &json!({"a": [1, {"b": "c"}]})));
/// assert!(!equals(&json!({"a": 1}), &json!({"b": 1})));
/// ```
pub fn equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(left), Value::Object(right)) => {
            if left.len() != right.len() || left.keys().any(|k| !right.contains_key(k)) {
                tracing::debug!(
                    left = ?left.keys().collect::<Vec<_>>(),
                    right = ?right.keys().collect::<Vec<_>>(),
                    "key sets differ"
                );
                return false;
            }
            left.iter().all(|(k, v)| equals(v, &right[k]))
        }
        (Value::Array(left), Value::Array(right)) => {
            if left.len() != right.len() {
                tracing::debug!(left = left.len(), right = right.len(), "sequence lengths differ");
                return false;
            }
            left.iter().zip(right).all(|(x, y)| equals(x, y))
        }
        _ => a == b,
    }
}

/// Paths (`$.a[0].b`) at which two values differ
///
/// Useful for diagnostics when [`equals`] returns `false`. An empty result
/// means the values are deeply equal.
pub fn differences(a: &Value, b: &Value) -> Vec<String> {
    let mut out = Vec::new();
    collect_differences("$", a, b, &mut out);
    out
}

fn collect_differences(path: &str, a: &Value, b: &Value, out: &mut Vec<String>) {
    match (a, b) {
        (Value::Object(left), Value::Object(right)) => {
            for (k, v) in left {
                let child = format!("{}.{}", path, k);
                match right.get(k) {
                    Some(other) => collect_differences(&child, v, other, out),
                    None => out.push(child),
                }
            }
            for k in right.keys().filter(|k| !left.contains_key(*k)) {
                out.push(format!("{}.{}", path, k));
            }
        }
        (Value::Array(left), Value::Array(right)) => {
            for i in 0..left.len().max(right.len()) {
                let child = format!("{}[{}]", path, i);
                match (left.get(i), right.get(i)) {
                    (Some(x), Some(y)) => collect_differences(&child, x, y, out),
                    _ => out.push(child),
                }
            }
        }
        _ if a != b => out.push(path.to_string()),
        _ => {}
    }
}
