use std::iter::FusedIterator;

use perf_core::errors::{ErrorInfo, SweepError};
use perf_results::{ResultSet, RunRecord};
use perf_search::{Objective, ObjectiveGenerator, ObjectiveIter, SearchDomain};
use serde::{Deserialize, Serialize};

use crate::checkpoint::CheckpointStore;
use crate::config::SweepConfig;

/// Metric stored on records produced by [`FailurePolicy::Record`].
pub const FAILED_METRIC: &str = "failed";

/// Measures a single objective.
pub trait Measure {
    /// Runs the objective and returns its record. The record must carry the
    /// requested model and grid point.
    fn measure(&mut self, run_name: &str, objective: &Objective) -> Result<RunRecord, SweepError>;
}

impl<F> Measure for F
where
    F: FnMut(&str, &Objective) -> Result<RunRecord, SweepError>,
{
    fn measure(&mut self, run_name: &str, objective: &Objective) -> Result<RunRecord, SweepError> {
        self(run_name, objective)
    }
}

/// What to do with an objective whose measurement failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Leave it unrecorded so a later resume retries it.
    #[default]
    Skip,
    /// Record it with a `failed = 1.0` metric.
    Record,
}

/// Options for a single sweep invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOpts {
    /// Discard any existing checkpoint before starting.
    pub clean: bool,
    /// Save after this many new records (0 keeps only the final save).
    pub checkpoint_interval: usize,
    /// Handling of failed measurements.
    pub failure_policy: FailurePolicy,
    /// Maximum number of measurements attempted by this invocation.
    pub limit: Option<usize>,
}

impl Default for RunOpts {
    fn default() -> Self {
        Self {
            clean: false,
            checkpoint_interval: 1,
            failure_policy: FailurePolicy::Skip,
            limit: None,
        }
    }
}

impl RunOpts {
    /// Default options using the configured checkpoint interval.
    pub fn from_config(config: &SweepConfig) -> Self {
        Self {
            checkpoint_interval: config.checkpoint.interval,
            ..Self::default()
        }
    }
}

/// Summary of a sweep invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepOutcome {
    /// Objectives measured successfully by this invocation.
    pub measured: usize,
    /// Objectives already present in the restored checkpoint.
    pub skipped: usize,
    /// Objectives whose measurement failed.
    pub failed: usize,
    /// Objectives left untouched because the limit was reached.
    pub remaining: usize,
    /// Every record known after the invocation.
    pub results: ResultSet,
}

impl SweepOutcome {
    /// Returns true when every objective has a record.
    pub fn is_complete(&self) -> bool {
        self.remaining == 0 && self.failed == 0
    }
}

/// Stable run name for the `index`-th objective of `model`.
///
/// The model name is kept verbatim. Splitting at the last `_run_` recovers
/// both parts, so distinct models never share a run name.
pub fn run_name(model: &str, index: usize) -> String {
    format!("{model}_run_{index}")
}

/// Objectives of a domain paired with their stable run names.
#[derive(Debug, Clone)]
pub struct NamedObjectives<'a> {
    inner: ObjectiveIter<'a>,
    current_model: Option<String>,
    index: usize,
}

impl<'a> NamedObjectives<'a> {
    /// Iterates `domain` in generation order.
    pub fn new(domain: &'a SearchDomain) -> Self {
        Self {
            inner: ObjectiveGenerator::new(domain).objectives(),
            current_model: None,
            index: 0,
        }
    }
}

impl Iterator for NamedObjectives<'_> {
    type Item = (String, Objective);

    fn next(&mut self) -> Option<Self::Item> {
        let objective = self.inner.next()?;
        if self.current_model.as_deref() != Some(objective.model_name()) {
            self.current_model = Some(objective.model_name().to_string());
            self.index = 0;
        }
        let name = run_name(objective.model_name(), self.index);
        self.index += 1;
        Some((name, objective))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for NamedObjectives<'_> {}

impl FusedIterator for NamedObjectives<'_> {}

fn non_finite_metric(run_name: &str, record: &RunRecord) -> Option<SweepError> {
    record
        .metrics()
        .iter()
        .find(|(_, value)| !value.is_finite())
        .map(|(metric, value)| {
            SweepError::Measurement(
                ErrorInfo::new("measure-metric", "metric is not a finite number")
                    .with_context("run", run_name)
                    .with_context("metric", metric.as_str())
                    .with_context("value", value.to_string()),
            )
        })
}

fn contract_violation(run_name: &str, objective: &Objective, record: &RunRecord) -> SweepError {
    SweepError::Measurement(
        ErrorInfo::new(
            "measure-contract",
            "measurement returned a record for a different objective",
        )
        .with_context("run", run_name)
        .with_context("expected_model", objective.model_name())
        .with_context("returned_model", record.model_name())
        .with_context("expected_point", objective.grid_key())
        .with_context("returned_point", record.objective().grid_key()),
    )
}

/// Resumable sweep over every objective of a configuration.
#[derive(Debug, Clone)]
pub struct Sweep<'a> {
    config: &'a SweepConfig,
    store: CheckpointStore,
}

impl<'a> Sweep<'a> {
    /// Sweep over `config`, checkpointing through `store`.
    pub fn new(config: &'a SweepConfig, store: CheckpointStore) -> Self {
        Self { config, store }
    }

    /// Checkpoint store backing this sweep.
    pub fn store(&self) -> &CheckpointStore {
        &self.store
    }

    /// Restores progress, measures every missing objective and saves the result.
    pub fn run<M: Measure + ?Sized>(
        &self,
        measurer: &mut M,
        opts: &RunOpts,
    ) -> Result<SweepOutcome, SweepError> {
        if opts.clean {
            self.store.discard(self.config)?;
        }
        let mut results = self.store.load(self.config)?.into_results();

        let generator = ObjectiveGenerator::new(self.config.domain());
        let total = generator.count();
        tracing::info!(
            objectives = total,
            restored = results.len(),
            "starting sweep"
        );

        let mut measured = 0usize;
        let mut skipped = 0usize;
        let mut failed = 0usize;
        let mut remaining = 0usize;
        let mut unsaved = 0usize;

        for (name, objective) in NamedObjectives::new(self.config.domain()) {
            if results.contains_objective(objective.model_name(), &objective) {
                tracing::debug!(run = %name, "objective already measured");
                skipped += 1;
                continue;
            }
            if opts.limit.is_some_and(|limit| measured + failed >= limit) {
                remaining += 1;
                continue;
            }

            let measurement = match measurer.measure(&name, &objective) {
                Ok(record) => {
                    if record.model_name() != objective.model_name()
                        || !record.objective().same_point(&objective)
                    {
                        return Err(contract_violation(&name, &objective, &record));
                    }
                    match non_finite_metric(&name, &record) {
                        Some(err) => Err(err),
                        None => Ok(record),
                    }
                }
                Err(err) => Err(err),
            };

            match measurement {
                Ok(record) => {
                    results.add(record)?;
                    measured += 1;
                    unsaved += 1;
                }
                Err(err) => {
                    tracing::warn!(run = %name, error = %err, "measurement failed");
                    failed += 1;
                    if opts.failure_policy == FailurePolicy::Record {
                        results.add(RunRecord::new(name, objective, [(FAILED_METRIC, 1.0)]))?;
                        unsaved += 1;
                    }
                }
            }

            if opts.checkpoint_interval > 0 && unsaved >= opts.checkpoint_interval {
                self.store.save(self.config, &results)?;
                unsaved = 0;
            }
        }

        self.store.save(self.config, &results)?;
        tracing::info!(
            measured,
            skipped,
            failed,
            remaining,
            records = results.len(),
            "sweep finished"
        );
        Ok(SweepOutcome {
            measured,
            skipped,
            failed,
            remaining,
            results,
        })
    }
}
