// Call-boundary instrumentation
//
// Wrappers compose explicitly:
//
//   timeit(secureit(infallible("a", f).keyed_by("x")))
//
// A leaf (`Func`, `Scoped`) runs the user function and creates the `Outcome`.
// `Timed` fills in `elapsed`, `Secured` fills in `succeeded`/`failure`; both
// update the single outcome produced underneath them. Nested instrumented calls
// made through a `Scope` are merged into the enclosing outcome's `sub_outcomes`,
// also when the body fails after making them.
//
// `profile` is separate: it returns the raw value and appends elapsed time to
// a caller-supplied `SProfiler`.

mod key;
mod outcome;
mod wrap;

pub use key::{
    content_hash, derive_id, ArgList, ArgSpec, CallArgs, CallSite, InstrumentError,
    HASH_PREFIX_LEN,
};
pub use outcome::{Outcome, Report, SubOutcomes};
pub use wrap::{
    infallible, profile, secureit, timeit, Func, Guarded, Instrumented, Interrupted, Profiled, Scope,
    Scoped, Secured, Timed,
};
