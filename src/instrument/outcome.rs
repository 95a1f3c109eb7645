use serde::{Deserialize, Deserializer, Serialize};

/// Reduced metadata of one instrumented call, as stored in a parent's
/// `sub_outcomes`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Call key (possibly disambiguated with a `:N` suffix)
    pub key: String,
    /// Elapsed wall-clock time in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed: Option<f64>,
    /// Whether the call completed without error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub succeeded: Option<bool>,
    /// Rendered failure, including its cause chain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

/// Insertion-ordered map from call key to [`Report`]
///
/// Keys are unique. A colliding key is rewritten to `key:N` with the smallest
/// `N >= 1` that is still free.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SubOutcomes(Vec<Report>);

impl FromIterator<Report> for SubOutcomes {
    fn from_iter<I: IntoIterator<Item = Report>>(reports: I) -> Self {
        let mut subs = Self::default();
        for report in reports {
            subs.insert(report);
        }
        subs
    }
}

/// Stored reports go through [`SubOutcomes::insert`], so duplicate keys in
/// the input are disambiguated like any other collision
impl<'de> Deserialize<'de> for SubOutcomes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Vec::<Report>::deserialize(deserializer)?.into_iter().collect())
    }
}

impl SubOutcomes {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Report> {
        self.0.iter().find(|report| report.key == key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|report| report.key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Report> {
        self.0.iter()
    }

    /// Insert a report and return the key it was stored under
    pub fn insert(&mut self, mut report: Report) -> String {
        if self.contains_key(&report.key) {
            report.key = self.free_key(&report.key);
        }
        let key = report.key.clone();
        self.0.push(report);
        key
    }

    fn free_key(&self, key: &str) -> String {
        (1..)
            .map(|n| format!("{}:{}", key, n))
            .find(|candidate| !self.contains_key(candidate))
            .unwrap_or_else(|| key.to_string())
    }
}

impl<'a> IntoIterator for &'a SubOutcomes {
    type Item = &'a Report;
    type IntoIter = std::slice::Iter<'a, Report>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Result of one instrumented invocation
///
/// Created by the innermost layer around the user function. Each wrapper
/// layer only touches the fields it owns: `timeit` sets `elapsed`,
/// `secureit` sets `succeeded` and `failure`.
#[derive(Debug)]
pub struct Outcome<T> {
    key: String,
    value: Option<T>,
    elapsed: Option<f64>,
    succeeded: Option<bool>,
    failure: Option<anyhow::Error>,
    sub_outcomes: SubOutcomes,
}

impl<T> Outcome<T> {
    /// Outcome of a call that returned `value`
    pub fn new(key: impl Into<String>, value: T) -> Self {
        Self {
            key: key.into(),
            value: Some(value),
            elapsed: None,
            succeeded: None,
            failure: None,
            sub_outcomes: SubOutcomes::default(),
        }
    }

    /// Outcome of a call whose failure was captured
    pub(crate) fn failed(key: String, failure: anyhow::Error) -> Self {
        Self {
            key,
            value: None,
            elapsed: None,
            succeeded: Some(false),
            failure: Some(failure),
            sub_outcomes: SubOutcomes::default(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Return value; `None` if the call failed
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn into_value(self) -> Option<T> {
        self.value
    }

    /// Elapsed seconds, set once a timing wrapper has run
    pub fn elapsed(&self) -> Option<f64> {
        self.elapsed
    }

    /// Success flag, set once a failure-capturing wrapper has run
    pub fn succeeded(&self) -> Option<bool> {
        self.succeeded
    }

    /// Captured error; present iff `succeeded() == Some(false)`
    pub fn failure(&self) -> Option<&anyhow::Error> {
        self.failure.as_ref()
    }

    pub fn sub_outcomes(&self) -> &SubOutcomes {
        &self.sub_outcomes
    }

    /// Reduced metadata of this outcome, suitable for merging into a parent
    pub fn report(&self) -> Report {
        Report {
            key: self.key.clone(),
            elapsed: self.elapsed,
            succeeded: self.succeeded,
            failure: self.failure.as_ref().map(|e| format!("{:#}", e)),
        }
    }

    /// Merge nested call reports into `sub_outcomes`
    ///
    /// Nested reports never carry their own sub-outcomes, so the tree is at
    /// most one level deep. Colliding keys are disambiguated, never
    /// overwritten.
    pub fn update<I>(&mut self, reports: I)
    where
        I: IntoIterator<Item = Report>,
    {
        for report in reports {
            let original = report.key.clone();
            let stored = self.sub_outcomes.insert(report);
            if stored != original {
                tracing::debug!(key = %original, stored = %stored, "disambiguated colliding call key");
            }
        }
    }

    pub(crate) fn set_elapsed_if_unset(&mut self, elapsed: f64) {
        self.elapsed.get_or_insert(elapsed);
    }

    pub(crate) fn mark_succeeded(&mut self) {
        self.succeeded = Some(true);
    }
}
