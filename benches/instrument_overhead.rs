//! Instrumentation overhead benchmark
//!
//! Measures the cost each wrapper layer adds on top of a trivial call:
//!
//! 1. bare function call (baseline)
//! 2. `timeit` with a content-hash key
//! 3. `timeit` with a named-argument key
//! 4. `timeit(secureit(...))`
//! 5. `profile` with an accumulator
//!
//! # Run Instructions
//!
//! ```bash
//! cargo bench --bench instrument_overhead
//! ```

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use suthing::instrument::{infallible, profile, secureit, timeit, Guarded, Instrumented};
use suthing::profiler::SProfiler;

fn add_two(x: i64) -> i64 {
    x + 2
}

fn bench_wrappers(c: &mut Criterion) {
    let mut group = c.benchmark_group("instrument");

    group.bench_function("bare", |b| b.iter(|| add_two(black_box(40))));

    let hashed = timeit(infallible("add_two", add_two));
    group.bench_function("timeit_hash_key", |b| {
        b.iter(|| hashed.call(black_box(40)))
    });

    let named = timeit(infallible("add_two", add_two).keyed_by("x"));
    group.bench_function("timeit_named_key", |b| b.iter(|| named.call(black_box(40))));

    let secured = timeit(secureit(infallible("add_two", add_two).keyed_by("x")));
    group.bench_function("timeit_secureit", |b| {
        b.iter(|| secured.outcome(black_box(40)))
    });

    group.finish();
}

fn bench_profile(c: &mut Criterion) {
    let profiled = profile("add_two", |x: i64, _: Option<&mut SProfiler>| add_two(x));

    c.bench_function("profile_passthrough", |b| {
        b.iter(|| profiled.call(black_box(40), None))
    });

    c.bench_function("profile_accumulate", |b| {
        let mut profiler = SProfiler::new();
        b.iter(|| profiled.call(black_box(40), Some(&mut profiler)))
    });
}

criterion_group!(benches, bench_wrappers, bench_profile);
criterion_main!(benches);
