//! Property-based tests for the instrumentation wrappers
//!
//! Properties covered:
//! 1. Timing preserves the wrapped value
//! 2. Key derivation is deterministic
//! 3. Failure capture never panics and never loses the key
//! 4. One profiler sample per profiled call
//! 5. Nested merges keep every report

use proptest::prelude::*;
use suthing::instrument::{
    infallible, profile, secureit, timeit, ArgList, ArgSpec, CallSite, Func, Guarded,
    Instrumented, Outcome, Report, HASH_PREFIX_LEN,
};
use suthing::profiler::SProfiler;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_timeit_preserves_value(x in -10_000i64..10_000) {
        let square = timeit(infallible("square", |v: i64| v * v));
        let outcome = square.call(x).unwrap();

        prop_assert_eq!(outcome.value(), Some(&(x * x)));
        prop_assert!(outcome.elapsed().unwrap() >= 0.0);
        prop_assert!(outcome.sub_outcomes().is_empty());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_key_derivation_deterministic(
        positional in prop::collection::vec("[a-z0-9]{0,8}", 0..4),
        keyword in prop::collection::btree_map("[a-z]{1,5}", "[a-z0-9]{0,5}", 0..3),
    ) {
        let args = keyword
            .iter()
            .fold(
                positional.iter().fold(ArgList::new(), |l, p| l.arg(p)),
                |l, (k, v)| l.kwarg(k.clone(), v),
            );

        let site = CallSite::new("f");
        let first = site.key(&args);
        prop_assert_eq!(&first, &site.key(&args.clone()));
        prop_assert!(first.starts_with("f("));
        prop_assert!(first.ends_with(')'));

        if keyword.is_empty() || positional.is_empty() {
            prop_assert_eq!(first.len(), "f()".len() + HASH_PREFIX_LEN);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_named_key_embeds_argument(x in 0u32..1_000_000) {
        let add = timeit(infallible("add_two", |v: u32| v + 2).keyed_by("x"));
        let outcome = add.call(x).unwrap();
        prop_assert_eq!(outcome.key(), format!("add_two(x={})", x));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_secureit_captures_every_failure(x in -1000i32..1000) {
        let checked = timeit(secureit(Func::new("checked", |v: i32| {
            if v < 0 {
                Err(anyhow::anyhow!("negative input {}", v))
            } else {
                Ok(v)
            }
        }).keyed_by("v")));

        let outcome = checked.outcome(x);
        prop_assert_eq!(outcome.key(), format!("checked(v={})", x));
        prop_assert!(outcome.elapsed().is_some());
        if x < 0 {
            prop_assert_eq!(outcome.succeeded(), Some(false));
            prop_assert!(outcome.value().is_none());
            let report = outcome.report();
            prop_assert!(report.failure.unwrap().contains("negative input"));
        } else {
            prop_assert_eq!(outcome.succeeded(), Some(true));
            prop_assert_eq!(outcome.value(), Some(&x));
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_profile_one_sample_per_call(calls in 1usize..40, distinct in 1u32..5) {
        let work = profile("work", |x: u32, _: Option<&mut SProfiler>| x + 1)
            .keyed_by("x")
            .unwrap();
        let mut profiler = SProfiler::new();

        for i in 0..calls {
            let arg = i as u32 % distinct;
            prop_assert_eq!(work.call(arg, Some(&mut profiler)), arg + 1);
        }

        let total: usize = profiler.view_stats().values().map(Vec::len).sum();
        prop_assert_eq!(total, calls);
        prop_assert!(profiler.len() <= distinct as usize);
        prop_assert!(profiler
            .view_stats()
            .values()
            .flatten()
            .all(|sample| *sample >= 0.0));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_update_keeps_every_report(keys in prop::collection::vec("[ab]", 0..12)) {
        let mut parent = Outcome::new("parent()", ());
        parent.update(keys.iter().map(|k| Report {
            key: k.clone(),
            elapsed: Some(0.0),
            succeeded: Some(true),
            failure: None,
        }));

        let subs = parent.sub_outcomes();
        prop_assert_eq!(subs.len(), keys.len());
        let mut seen: Vec<&str> = subs.keys().collect();
        seen.sort_unstable();
        seen.dedup();
        prop_assert_eq!(seen.len(), keys.len());
    }
}

#[test]
fn test_profile_without_profiler_is_plain_call() {
    let work = profile("work", |x: u32, p: Option<&mut SProfiler>| {
        assert!(p.is_none());
        x * 3
    });
    assert_eq!(work.call(7, None), 21);
}

#[test]
fn test_arg_spec_from_names() {
    let spec = ArgSpec::from(vec!["a", "b"]);
    assert_eq!(spec, ArgSpec::Names(vec!["a".to_string(), "b".to_string()]));
    assert!(profile("f", |_: (), _: Option<&mut SProfiler>| ()).keyed_by(spec).is_err());
}
