//! Call-key keyed metric accumulator
//!
//! [`SProfiler`] is the store behind the `profile` wrapper: every profiled
//! call appends its elapsed time (seconds) to the list kept for its call key.
//!
//! There is no process-wide instance. Callers create one and pass it to each
//! profiled call they want measured. Access is through `&mut`, so a profiler
//! is never mutated from two places at once; use one profiler per thread.

use serde::Serialize;
use std::collections::BTreeMap;

/// Aggregate statistics for one call key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileSummary {
    pub key: String,
    pub calls: usize,
    /// Total time across all calls (seconds)
    pub total: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Accumulates metric samples per call key
#[derive(Debug, Default, Clone)]
pub struct SProfiler {
    /// Map from call key to samples, in call order
    accumulator: BTreeMap<String, Vec<f64>>,
}

impl SProfiler {
    /// Create an empty profiler
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample under `key`
    pub(crate) fn record(&mut self, key: String, sample: f64) {
        tracing::trace!(key = %key, sample, "profiled call");
        self.accumulator.entry(key).or_default().push(sample);
    }

    /// Copy of all samples collected so far
    pub fn view_stats(&self) -> BTreeMap<String, Vec<f64>> {
        self.accumulator.clone()
    }

    /// Samples for a single key
    pub fn samples(&self, key: &str) -> Option<&[f64]> {
        self.accumulator.get(key).map(Vec::as_slice)
    }

    /// Number of distinct call keys
    pub fn len(&self) -> usize {
        self.accumulator.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accumulator.is_empty()
    }

    /// Per-key statistics sorted by total time (descending)
    pub fn summary(&self) -> Vec<ProfileSummary> {
        let mut rows: Vec<_> = self
            .accumulator
            .iter()
            .filter(|(_, samples)| !samples.is_empty())
            .map(|(key, samples)| {
                let total: f64 = samples.iter().sum();
                ProfileSummary {
                    key: key.clone(),
                    calls: samples.len(),
                    total,
                    mean: total / samples.len() as f64,
                    min: samples.iter().copied().fold(f64::INFINITY, f64::min),
                    max: samples.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                }
            })
            .collect();
        rows.sort_by(|a, b| b.total.total_cmp(&a.total));
        rows
    }

    /// Print a timing summary table to stderr
    pub fn print_summary(&self) {
        let rows = self.summary();
        if rows.is_empty() {
            eprintln!("\nNo profiling data collected.");
            return;
        }

        eprintln!("\n╔════════════════════════════════════════════════════════════════════════════════╗");
        eprintln!("║  Call Timing Summary (sorted by total time)                                   ║");
        eprintln!("╚════════════════════════════════════════════════════════════════════════════════╝");
        eprintln!();
        eprintln!("{:<50} {:>10} {:>12} {:>12}", "Call", "Calls", "Total Time", "Avg Time");
        eprintln!("{}", "─".repeat(88));

        for row in rows {
            eprintln!(
                "{:<50} {:>10} {:>11.6}s {:>11.6}s",
                row.key, row.calls, row.total, row.mean
            );
        }

        eprintln!("{}", "─".repeat(88));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiler_new() {
        let profiler = SProfiler::new();
        assert!(profiler.is_empty());
        assert!(profiler.view_stats().is_empty());
    }

    #[test]
    fn test_profiler_record_appends() {
        let mut profiler = SProfiler::new();
        profiler.record("main()".to_string(), 1.0);
        profiler.record("main()".to_string(), 2.0);
        profiler.record("helper(x=1)".to_string(), 0.5);

        assert_eq!(profiler.len(), 2);
        assert_eq!(profiler.samples("main()"), Some(&[1.0, 2.0][..]));
        assert_eq!(profiler.samples("helper(x=1)"), Some(&[0.5][..]));
        assert_eq!(profiler.samples("missing()"), None);
    }

    #[test]
    fn test_view_stats_is_a_copy() {
        let mut profiler = SProfiler::new();
        profiler.record("a(x=1)".to_string(), 1.0);

        let mut view = profiler.view_stats();
        view.get_mut("a(x=1)").unwrap().push(99.0);
        view.insert("b()".to_string(), vec![1.0]);

        assert_eq!(profiler.samples("a(x=1)"), Some(&[1.0][..]));
        assert_eq!(profiler.len(), 1);
    }

    #[test]
    fn test_summary_sorted_by_total_time() {
        let mut profiler = SProfiler::new();
        profiler.record("fast()".to_string(), 0.1);
        profiler.record("slow()".to_string(), 5.0);
        profiler.record("medium()".to_string(), 0.5);
        profiler.record("medium()".to_string(), 0.5);

        let keys: Vec<_> = profiler.summary().into_iter().map(|row| row.key).collect();
        assert_eq!(keys, vec!["slow()", "medium()", "fast()"]);
    }

    #[test]
    fn test_summary_statistics() {
        let mut profiler = SProfiler::new();
        profiler.record("f()".to_string(), 1.0);
        profiler.record("f()".to_string(), 2.0);
        profiler.record("f()".to_string(), 3.0);

        let row = &profiler.summary()[0];
        assert_eq!(row.calls, 3);
        assert_eq!(row.total, 6.0);
        assert_eq!(row.mean, 2.0);
        assert_eq!(row.min, 1.0);
        assert_eq!(row.max, 3.0);
    }

    #[test]
    fn test_print_summary_empty() {
        let profiler = SProfiler::new();
        // Should not panic
        profiler.print_summary();
    }

    #[test]
    fn test_print_summary_with_data() {
        let mut profiler = SProfiler::new();
        profiler.record("main()".to_string(), 1.0);
        profiler.record("helper(x=2)".to_string(), 0.25);
        profiler.print_summary();
        assert_eq!(profiler.len(), 2);
    }
}
