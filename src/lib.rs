//! suthing - developer utilities with a call-instrumentation core
//!
//! This library provides composable timing and failure-capturing wrappers
//! around function calls, a caller-owned profiling accumulator, multi-format
//! file loading/dumping, deep equality for plain values and connection
//! configuration objects.
//!
//! # Example
//! ```
//! use suthing::instrument::{infallible, secureit, timeit, Guarded};
//!
//! let add_two = timeit(secureit(infallible("add_two", |x: i64| x + 2)));
//! let outcome = add_two.outcome(40);
//! assert_eq!(outcome.value(), Some(&42));
//! assert_eq!(outcome.succeeded(), Some(true));
//! assert!(outcome.elapsed().is_some());
//! ```

pub mod cli;
pub mod compare;
pub mod connection;
pub mod file_handle;
pub mod instrument;
pub mod profiler;
pub mod timer;

pub use compare::equals;
pub use file_handle::{FileError, FileHandle, FileType};
pub use instrument::{profile, secureit, timeit, ArgSpec, Outcome, Report};
pub use profiler::SProfiler;
pub use timer::Timer;
