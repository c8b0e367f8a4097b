use std::path::Path;

use perf_core::errors::{ErrorInfo, SweepError};
use perf_results::RunRecord;
use perf_search::{Objective, ParameterKind, SearchDomain};
use perf_sweep::{
    CheckpointSettings, CheckpointStore, FailurePolicy, Measure, RunOpts, Sweep, SweepConfig,
    FAILED_METRIC,
};
use serde_json::json;
use tempfile::tempdir;

/// Fake load generator: throughput grows with concurrency, optional failures.
#[derive(Default)]
struct FakeMeasurer {
    calls: Vec<String>,
    fail_on: Vec<String>,
}

impl Measure for FakeMeasurer {
    fn measure(&mut self, run_name: &str, objective: &Objective) -> Result<RunRecord, SweepError> {
        self.calls.push(run_name.to_string());
        if self.fail_on.iter().any(|name| name == run_name) {
            return Err(SweepError::Measurement(ErrorInfo::new("fake", "endpoint unavailable")));
        }
        let concurrency = objective
            .value("concurrency")
            .and_then(|value| value.as_f64())
            .unwrap_or(1.0);
        Ok(RunRecord::new(
            run_name,
            objective.clone(),
            [("throughput", 100.0 * concurrency), ("latency", 5.0 + concurrency)],
        ))
    }
}

fn sweep_config(root: &Path) -> SweepConfig {
    let domain = SearchDomain::new()
        .with_parameter("llama", "concurrency", ParameterKind::exponential(0, 2).unwrap())
        .unwrap()
        .with_parameter("llama", "batch_size", ParameterKind::Categorical(vec![json!(1), json!(2)]))
        .unwrap()
        .with_parameter("mistral", "concurrency", ParameterKind::Categorical(vec![json!(8)]))
        .unwrap();
    SweepConfig::from_domain(
        Some("nightly".to_string()),
        domain,
        CheckpointSettings {
            directory: root.join("ckpt"),
            interval: 1,
        },
    )
}

#[test]
fn full_sweep_measures_every_objective_once() {
    let dir = tempdir().expect("tmp dir");
    let config = sweep_config(dir.path());
    let sweep = Sweep::new(&config, CheckpointStore::for_config(&config));
    let mut measurer = FakeMeasurer::default();

    let outcome = sweep.run(&mut measurer, &RunOpts::default()).expect("sweep");
    assert_eq!(outcome.measured, 7);
    assert_eq!(outcome.skipped, 0);
    assert!(outcome.is_complete());
    assert_eq!(measurer.calls.first().map(String::as_str), Some("llama_run_0"));
    assert_eq!(measurer.calls.last().map(String::as_str), Some("mistral_run_0"));
    assert_eq!(measurer.calls[5], "llama_run_5");
}

#[test]
fn resume_measures_only_missing_objectives() {
    let dir = tempdir().expect("tmp dir");
    let config = sweep_config(dir.path());
    let sweep = Sweep::new(&config, CheckpointStore::for_config(&config));

    let mut first = FakeMeasurer::default();
    let partial = sweep
        .run(
            &mut first,
            &RunOpts {
                limit: Some(3),
                ..RunOpts::default()
            },
        )
        .expect("partial sweep");
    assert_eq!(partial.measured, 3);
    assert_eq!(partial.remaining, 4);
    assert!(!partial.is_complete());

    let mut second = FakeMeasurer::default();
    let resumed = sweep.run(&mut second, &RunOpts::default()).expect("resumed sweep");
    assert_eq!(resumed.skipped, 3);
    assert_eq!(resumed.measured, 4);
    assert_eq!(
        second.calls,
        vec!["llama_run_3", "llama_run_4", "llama_run_5", "mistral_run_0"]
    );
    assert_eq!(resumed.results.len(), 7);

    let mut third = FakeMeasurer::default();
    let idle = sweep.run(&mut third, &RunOpts::default()).expect("idle sweep");
    assert!(third.calls.is_empty());
    assert_eq!(idle.skipped, 7);
}

#[test]
fn skipped_failures_are_retried_on_resume() {
    let dir = tempdir().expect("tmp dir");
    let config = sweep_config(dir.path());
    let sweep = Sweep::new(&config, CheckpointStore::for_config(&config));

    let mut flaky = FakeMeasurer {
        fail_on: vec!["llama_run_1".to_string()],
        ..FakeMeasurer::default()
    };
    let outcome = sweep.run(&mut flaky, &RunOpts::default()).expect("sweep");
    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.measured, 6);
    assert!(outcome.results.get("llama_run_1").is_err());

    let mut healthy = FakeMeasurer::default();
    let retried = sweep.run(&mut healthy, &RunOpts::default()).expect("retry");
    assert_eq!(healthy.calls, vec!["llama_run_1"]);
    assert!(retried.is_complete());
}

#[test]
fn record_policy_stores_failed_marker() {
    let dir = tempdir().expect("tmp dir");
    let config = sweep_config(dir.path());
    let sweep = Sweep::new(&config, CheckpointStore::for_config(&config));

    let mut flaky = FakeMeasurer {
        fail_on: vec!["mistral_run_0".to_string()],
        ..FakeMeasurer::default()
    };
    let opts = RunOpts {
        failure_policy: FailurePolicy::Record,
        ..RunOpts::default()
    };
    let outcome = sweep.run(&mut flaky, &opts).expect("sweep");
    let marker = outcome.results.get("mistral_run_0").expect("failed record");
    assert_eq!(marker.metric(FAILED_METRIC), Some(1.0));
    assert_eq!(marker.model_name(), "mistral");

    let mut again = FakeMeasurer::default();
    sweep.run(&mut again, &RunOpts::default()).expect("resume");
    assert!(again.calls.is_empty());
}

#[test]
fn clean_discards_previous_progress() {
    let dir = tempdir().expect("tmp dir");
    let config = sweep_config(dir.path());
    let sweep = Sweep::new(&config, CheckpointStore::for_config(&config));
    sweep
        .run(&mut FakeMeasurer::default(), &RunOpts::default())
        .expect("first sweep");

    let mut fresh = FakeMeasurer::default();
    let opts = RunOpts {
        clean: true,
        ..RunOpts::default()
    };
    let outcome = sweep.run(&mut fresh, &opts).expect("clean sweep");
    assert_eq!(outcome.skipped, 0);
    assert_eq!(fresh.calls.len(), 7);
}

#[test]
fn final_save_happens_without_interval_saves() {
    let dir = tempdir().expect("tmp dir");
    let config = sweep_config(dir.path());
    let store = CheckpointStore::for_config(&config);
    let sweep = Sweep::new(&config, store.clone());
    let opts = RunOpts {
        checkpoint_interval: 0,
        limit: Some(2),
        ..RunOpts::default()
    };
    sweep.run(&mut FakeMeasurer::default(), &opts).expect("sweep");
    let restored = store.load(&config).expect("load").into_results();
    assert_eq!(restored.len(), 2);
}

#[test]
fn changed_configuration_aborts_the_sweep() {
    let dir = tempdir().expect("tmp dir");
    let config = sweep_config(dir.path());
    Sweep::new(&config, CheckpointStore::for_config(&config))
        .run(&mut FakeMeasurer::default(), &RunOpts::default())
        .expect("first sweep");

    let domain = config
        .domain()
        .clone()
        .with_parameter("mistral", "batch_size", ParameterKind::Fixed(json!(4)))
        .expect("extend");
    let changed = SweepConfig::from_domain(config.name.clone(), domain, config.checkpoint.clone());
    let mut measurer = FakeMeasurer::default();
    let err = Sweep::new(&changed, CheckpointStore::for_config(&changed))
        .run(&mut measurer, &RunOpts::default())
        .unwrap_err();
    assert!(matches!(err, SweepError::Checkpoint(_)));
    assert!(measurer.calls.is_empty());
}

fn single_point_config(root: &Path, models: &[&str]) -> SweepConfig {
    let mut domain = SearchDomain::new();
    for model in models {
        domain
            .add_parameter(model, "batch_size", ParameterKind::Categorical(vec![json!(1)]))
            .expect("declare");
    }
    SweepConfig::from_domain(
        None,
        domain,
        CheckpointSettings {
            directory: root.join("ckpt"),
            interval: 1,
        },
    )
}

#[test]
fn non_finite_metrics_are_measurement_failures() {
    let dir = tempdir().expect("tmp dir");
    let config = single_point_config(dir.path(), &["m"]);
    let store = CheckpointStore::for_config(&config);
    let sweep = Sweep::new(&config, store.clone());
    let mut nan = |name: &str, objective: &Objective| {
        Ok::<_, SweepError>(RunRecord::new(name, objective.clone(), [("throughput", f64::NAN)]))
    };

    let outcome = sweep.run(&mut nan, &RunOpts::default()).expect("sweep");
    assert_eq!(outcome.failed, 1);
    assert!(outcome.results.is_empty());
    assert!(store.load(&config).expect("loadable checkpoint").into_results().is_empty());

    let mut infinite = |name: &str, objective: &Objective| {
        Ok::<_, SweepError>(RunRecord::new(name, objective.clone(), [("latency", f64::INFINITY)]))
    };
    let opts = RunOpts {
        failure_policy: FailurePolicy::Record,
        ..RunOpts::default()
    };
    let recorded = sweep.run(&mut infinite, &opts).expect("sweep");
    let restored = store.load(&config).expect("loadable checkpoint").into_results();
    assert_eq!(restored, recorded.results);
    let marker = restored.get("m_run_0").expect("failed marker");
    assert_eq!(marker.metric(FAILED_METRIC), Some(1.0));
    assert_eq!(marker.metric("latency"), None);
}

#[test]
fn models_differing_only_in_case_are_swept_separately() {
    let dir = tempdir().expect("tmp dir");
    let config = single_point_config(dir.path(), &["m", "M", "a/b", "a_b"]);
    let sweep = Sweep::new(&config, CheckpointStore::for_config(&config));
    let mut measurer = FakeMeasurer::default();

    let outcome = sweep.run(&mut measurer, &RunOpts::default()).expect("sweep");
    assert_eq!(outcome.measured, 4);
    assert_eq!(
        measurer.calls,
        vec!["m_run_0", "M_run_0", "a/b_run_0", "a_b_run_0"]
    );
    let restored = CheckpointStore::for_config(&config)
        .load(&config)
        .expect("load")
        .into_results();
    assert_eq!(restored.len(), 4);
}

#[test]
fn case_differing_identities_keep_separate_checkpoints() {
    let dir = tempdir().expect("tmp dir");
    let lower = single_point_config(dir.path(), &["m"]);
    let upper = single_point_config(dir.path(), &["M"]);
    for config in [&lower, &upper] {
        Sweep::new(config, CheckpointStore::for_config(config))
            .run(&mut FakeMeasurer::default(), &RunOpts::default())
            .expect("sweep");
    }
    let store = CheckpointStore::for_config(&lower);
    assert_ne!(store.path_for(&lower), store.path_for(&upper));
    assert_eq!(store.load(&lower).expect("lower").into_results().len(), 1);
    assert_eq!(store.load(&upper).expect("upper").into_results().len(), 1);
}
