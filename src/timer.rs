//! Wall-clock timer for bounded spans of work
//!
//! Backed by [`Instant`], so elapsed values are monotonic and never negative
//! even when the system clock is adjusted.

use std::time::{Duration, Instant};

const SECONDS_PER_MINUTE: u64 = 60;
/// Finest rounding `format_elapsed` applies (nanoseconds)
const MAX_DIGITS: u32 = 9;

/// Measures elapsed wall-clock time between [`Timer::start`] and [`Timer::stop`]
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    start: Instant,
    elapsed: Option<Duration>,
}

impl Timer {
    /// Start a new timer at the current instant
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
            elapsed: None,
        }
    }

    /// Stop the timer and return the elapsed time in seconds
    ///
    /// Calling `stop` again re-measures from the original start instant.
    pub fn stop(&mut self) -> f64 {
        let elapsed = self.start.elapsed();
        self.elapsed = Some(elapsed);
        elapsed.as_secs_f64()
    }

    /// Elapsed seconds recorded by the last [`Timer::stop`], or the running
    /// time if the timer has not been stopped yet
    pub fn elapsed(&self) -> f64 {
        self.duration().as_secs_f64()
    }

    /// Elapsed time as a [`Duration`]
    pub fn duration(&self) -> Duration {
        self.elapsed.unwrap_or_else(|| self.start.elapsed())
    }

    /// Whether [`Timer::stop`] has been called
    pub fn is_stopped(&self) -> bool {
        self.elapsed.is_some()
    }

    /// Human readable elapsed time, e.g. `"1 min 30.5 sec"`
    pub fn elapsed_str(&self, digits: u32) -> String {
        format_elapsed(self.duration(), digits)
    }

    /// Run `f` and return its result together with the time it took
    ///
    /// The duration is always produced, including when `f` returns an `Err`.
    ///
    /// # Example
    /// ```
    /// use suthing::timer::Timer;
    ///
    /// let (value, elapsed) = Timer::measure(|| 40 + 2);
    /// assert_eq!(value, 42);
    /// assert!(elapsed.as_secs_f64() >= 0.0);
    /// ```
    pub fn measure<F, R>(f: F) -> (R, Duration)
    where
        F: FnOnce() -> R,
    {
        let mut timer = Self::start();
        let result = f();
        timer.stop();
        (result, timer.duration())
    }
}

/// Format a duration as `"<secs> sec"` or `"<mins> min <secs> sec"`
///
/// `digits` is capped at nanosecond resolution.
pub fn format_elapsed(elapsed: Duration, digits: u32) -> String {
    let mins = elapsed.as_secs() / SECONDS_PER_MINUTE;
    let secs = elapsed.as_secs_f64() - (mins * SECONDS_PER_MINUTE) as f64;
    let scale = 10f64.powi(digits.min(MAX_DIGITS) as i32);
    let secs = (secs * scale).round() / scale;

    if mins > 0 {
        format!("{} min {} sec", mins, secs)
    } else {
        format!("{} sec", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_stop_records_elapsed() {
        let mut timer = Timer::start();
        thread::sleep(Duration::from_millis(10));
        let secs = timer.stop();

        assert!(timer.is_stopped());
        assert!(secs >= 0.010);
        assert_eq!(timer.elapsed(), secs);
    }

    #[test]
    fn test_elapsed_is_frozen_after_stop() {
        let mut timer = Timer::start();
        timer.stop();
        let first = timer.elapsed();
        thread::sleep(Duration::from_millis(5));
        assert_eq!(timer.elapsed(), first);
    }

    #[test]
    fn test_running_timer_reports_progress() {
        let timer = Timer::start();
        thread::sleep(Duration::from_millis(5));
        assert!(!timer.is_stopped());
        assert!(timer.elapsed() >= 0.005);
    }

    #[test]
    fn test_measure_returns_value_and_duration() {
        let (result, elapsed) = Timer::measure(|| {
            thread::sleep(Duration::from_millis(10));
            "done"
        });

        assert_eq!(result, "done");
        assert!(elapsed >= Duration::from_millis(10));
    }

    #[test]
    fn test_measure_err_still_timed() {
        let (result, elapsed): (Result<(), &str>, _) = Timer::measure(|| Err("boom"));
        assert!(result.is_err());
        assert!(elapsed.as_secs_f64() >= 0.0);
    }

    #[test]
    fn test_format_elapsed_seconds_only() {
        assert_eq!(format_elapsed(Duration::from_millis(1500), 2), "1.5 sec");
    }

    #[test]
    fn test_format_elapsed_with_minutes() {
        assert_eq!(format_elapsed(Duration::from_millis(90_500), 2), "1 min 30.5 sec");
    }

    #[test]
    fn test_format_elapsed_rounds_digits() {
        assert_eq!(format_elapsed(Duration::from_millis(1234), 1), "1.2 sec");
    }

    #[test]
    fn test_format_elapsed_caps_digits() {
        assert_eq!(format_elapsed(Duration::from_millis(1234), u32::MAX), "1.234 sec");
        assert_eq!(format_elapsed(Duration::from_millis(90_500), 40), "1 min 30.5 sec");
    }
}
