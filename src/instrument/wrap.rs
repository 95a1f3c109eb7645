use super::key::{ArgSpec, CallArgs, CallSite, InstrumentError, Result};
use super::outcome::{Outcome, Report};
use crate::profiler::SProfiler;
use crate::timer::Timer;
use std::convert::Infallible;

/// One layer of instrumentation around a call
///
/// Leaves ([`Func`], [`Scoped`]) run the user function and create the
/// [`Outcome`]. Wrappers ([`Timed`], [`Secured`]) delegate to an inner layer
/// and update the outcome it returns in place, so any stack of wrappers over
/// one call yields exactly one outcome.
pub trait Instrumented<A: CallArgs> {
    /// Value produced by the wrapped function
    type Value;
    /// Error that escapes this layer
    type Error;

    /// Name and key specifier shared by every layer of the stack
    fn site(&self) -> &CallSite;

    /// Run the call under an already derived key
    ///
    /// An error carries the reports of nested calls that completed before it.
    fn invoke(
        &self,
        key: String,
        args: A,
    ) -> std::result::Result<Outcome<Self::Value>, Interrupted<Self::Error>>;

    /// Derive the call key and run the call
    fn call(&self, args: A) -> std::result::Result<Outcome<Self::Value>, Self::Error> {
        let key = self.key_for(&args);
        self.invoke(key, args).map_err(Interrupted::into_error)
    }

    fn key_for(&self, args: &A) -> String {
        self.site().key(&args.call_args())
    }
}

/// Error leaving a layer, with the nested reports recorded before it
#[derive(Debug)]
pub struct Interrupted<E> {
    pub error: E,
    pub reports: Vec<Report>,
}

impl<E> Interrupted<E> {
    pub fn new(error: E) -> Self {
        Self {
            error,
            reports: Vec::new(),
        }
    }

    pub fn with_reports(error: E, reports: Vec<Report>) -> Self {
        Self { error, reports }
    }

    pub fn into_error(self) -> E {
        self.error
    }
}

/// Calls through a stack whose failures are all captured
pub trait Guarded<A: CallArgs>: Instrumented<A, Error = Infallible> {
    fn outcome(&self, args: A) -> Outcome<Self::Value> {
        match self.call(args) {
            Ok(outcome) => outcome,
            Err(never) => match never {},
        }
    }
}

impl<A: CallArgs, L: Instrumented<A, Error = Infallible>> Guarded<A> for L {}

/// Leaf layer around a fallible function `Fn(A) -> Result<T, E>`
#[derive(Debug, Clone)]
pub struct Func<F> {
    site: CallSite,
    f: F,
}

impl<F> Func<F> {
    pub fn new<A, T, E>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(A) -> std::result::Result<T, E>,
    {
        Self {
            site: CallSite::new(name),
            f,
        }
    }

    /// Embed the given argument(s) in the call key instead of a content hash
    pub fn keyed_by(mut self, spec: impl Into<ArgSpec>) -> Self {
        self.site = self.site.with_spec(spec.into());
        self
    }
}

/// Leaf layer around a function that cannot fail
pub fn infallible<A, T, G>(
    name: impl Into<String>,
    g: G,
) -> Func<impl Fn(A) -> std::result::Result<T, Infallible>>
where
    G: Fn(A) -> T,
{
    Func::new(name, move |args: A| Ok::<T, Infallible>(g(args)))
}

impl<A, F, T, E> Instrumented<A> for Func<F>
where
    A: CallArgs,
    F: Fn(A) -> std::result::Result<T, E>,
{
    type Value = T;
    type Error = E;

    fn site(&self) -> &CallSite {
        &self.site
    }

    fn invoke(&self, key: String, args: A) -> std::result::Result<Outcome<T>, Interrupted<E>> {
        (self.f)(args)
            .map(|value| Outcome::new(key, value))
            .map_err(Interrupted::new)
    }
}

/// Collects the outcomes of instrumented calls made inside a [`Scoped`] body
#[derive(Debug, Default)]
pub struct Scope {
    reports: Vec<Report>,
}

impl Scope {
    /// Run an instrumented call and record its outcome
    pub fn call<A, L>(
        &mut self,
        layer: &L,
        args: A,
    ) -> std::result::Result<Outcome<L::Value>, L::Error>
    where
        A: CallArgs,
        L: Instrumented<A>,
    {
        let outcome = layer.call(args)?;
        self.record(&outcome);
        Ok(outcome)
    }

    /// Record an outcome obtained elsewhere
    pub fn record<T>(&mut self, outcome: &Outcome<T>) {
        self.reports.push(outcome.report());
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn into_reports(self) -> Vec<Report> {
        self.reports
    }
}

/// Leaf layer whose body makes nested instrumented calls
///
/// Everything recorded in the [`Scope`] is merged into the body's outcome.
#[derive(Debug, Clone)]
pub struct Scoped<F> {
    site: CallSite,
    f: F,
}

impl<F> Scoped<F> {
    pub fn new<A, T, E>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut Scope, A) -> std::result::Result<T, E>,
    {
        Self {
            site: CallSite::new(name),
            f,
        }
    }

    pub fn keyed_by(mut self, spec: impl Into<ArgSpec>) -> Self {
        self.site = self.site.with_spec(spec.into());
        self
    }
}

impl<A, F, T, E> Instrumented<A> for Scoped<F>
where
    A: CallArgs,
    F: Fn(&mut Scope, A) -> std::result::Result<T, E>,
{
    type Value = T;
    type Error = E;

    fn site(&self) -> &CallSite {
        &self.site
    }

    fn invoke(&self, key: String, args: A) -> std::result::Result<Outcome<T>, Interrupted<E>> {
        let mut scope = Scope::default();
        match (self.f)(&mut scope, args) {
            Ok(value) => {
                let mut outcome = Outcome::new(key, value);
                outcome.update(scope.into_reports());
                Ok(outcome)
            }
            Err(e) => Err(Interrupted::with_reports(e, scope.into_reports())),
        }
    }
}

/// Timing wrapper; owns [`Outcome::elapsed`]
#[derive(Debug, Clone)]
pub struct Timed<L> {
    inner: L,
}

/// Measure wall-clock time of every call through `inner`
///
/// Errors from `inner` propagate unchanged.
pub fn timeit<L>(inner: L) -> Timed<L> {
    Timed { inner }
}

impl<L> Timed<L> {
    pub fn into_inner(self) -> L {
        self.inner
    }
}

impl<A, L> Instrumented<A> for Timed<L>
where
    A: CallArgs,
    L: Instrumented<A>,
{
    type Value = L::Value;
    type Error = L::Error;

    fn site(&self) -> &CallSite {
        self.inner.site()
    }

    fn invoke(
        &self,
        key: String,
        args: A,
    ) -> std::result::Result<Outcome<L::Value>, Interrupted<L::Error>> {
        let mut timer = Timer::start();
        let result = self.inner.invoke(key, args);
        let elapsed = timer.stop();

        match result {
            Ok(mut outcome) => {
                outcome.set_elapsed_if_unset(elapsed);
                Ok(outcome)
            }
            Err(e) => {
                tracing::debug!(call = %self.inner.site().name(), elapsed, "timed call returned an error");
                Err(e)
            }
        }
    }
}

/// Failure-capturing wrapper; owns [`Outcome::succeeded`] and
/// [`Outcome::failure`]
#[derive(Debug, Clone)]
pub struct Secured<L> {
    inner: L,
}

/// Convert errors from `inner` into failed outcomes
pub fn secureit<L>(inner: L) -> Secured<L> {
    Secured { inner }
}

impl<L> Secured<L> {
    pub fn into_inner(self) -> L {
        self.inner
    }
}

impl<A, L> Instrumented<A> for Secured<L>
where
    A: CallArgs,
    L: Instrumented<A>,
    <L as Instrumented<A>>::Error: Into<anyhow::Error>,
{
    type Value = L::Value;
    type Error = Infallible;

    fn site(&self) -> &CallSite {
        self.inner.site()
    }

    fn invoke(
        &self,
        key: String,
        args: A,
    ) -> std::result::Result<Outcome<L::Value>, Interrupted<Infallible>> {
        match self.inner.invoke(key.clone(), args) {
            Ok(mut outcome) => {
                outcome.mark_succeeded();
                Ok(outcome)
            }
            Err(Interrupted { error, reports }) => {
                let failure: anyhow::Error = error.into();
                tracing::debug!(key = %key, error = %failure, nested = reports.len(), "captured failure");
                let mut outcome = Outcome::failed(key, failure);
                outcome.update(reports);
                Ok(outcome)
            }
        }
    }
}

/// Metric-accumulating wrapper
///
/// The body receives the accumulator (if any) back so it can thread it into
/// nested profiled calls.
#[derive(Debug, Clone)]
pub struct Profiled<F> {
    site: CallSite,
    f: F,
}

/// Record the elapsed time of calls made with an [`SProfiler`]
pub fn profile<A, R, F>(name: impl Into<String>, f: F) -> Profiled<F>
where
    F: Fn(A, Option<&mut SProfiler>) -> R,
{
    Profiled {
        site: CallSite::new(name),
        f,
    }
}

impl<F> Profiled<F> {
    /// Embed one designated argument in the call key
    ///
    /// Only a single name is accepted.
    pub fn keyed_by(mut self, spec: impl Into<ArgSpec>) -> Result<Self> {
        let spec = spec.into();
        if let ArgSpec::Names(names) = &spec {
            return Err(InstrumentError::InvalidArgumentType {
                wrapper: "profile",
                reason: format!("argument specifier must be a single name, got {:?}", names),
            });
        }
        self.site = self.site.with_spec(spec);
        Ok(self)
    }

    pub fn site(&self) -> &CallSite {
        &self.site
    }

    /// Call the wrapped function
    ///
    /// Without a profiler this is a plain call. With one, the elapsed time
    /// is appended under the derived call key.
    pub fn call<A, R>(&self, args: A, profiler: Option<&mut SProfiler>) -> R
    where
        A: CallArgs,
        F: Fn(A, Option<&mut SProfiler>) -> R,
    {
        match profiler {
            None => (self.f)(args, None),
            Some(profiler) => {
                let key = self.site.key(&args.call_args());
                let (result, elapsed) = Timer::measure(|| (self.f)(args, Some(&mut *profiler)));
                profiler.record(key, elapsed.as_secs_f64());
                result
            }
        }
    }
}
