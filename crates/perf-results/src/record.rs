use std::collections::BTreeMap;

use perf_search::Objective;
use serde::{Deserialize, Serialize};

/// Observed metrics keyed by name.
pub type Metrics = BTreeMap<String, f64>;

/// Result of measuring one objective. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    name: String,
    model_name: String,
    objective: Objective,
    metrics: Metrics,
}

impl RunRecord {
    /// Creates a record for `objective`; the model name is taken from the objective.
    pub fn new<K, I>(name: impl Into<String>, objective: Objective, metrics: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, f64)>,
    {
        Self {
            name: name.into(),
            model_name: objective.model_name().to_string(),
            objective,
            metrics: metrics
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        }
    }

    /// Adds or replaces a metric before the record is handed to a result set.
    pub fn with_metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(name.into(), value);
        self
    }

    /// Unique, stable run name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Model the run measured.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Objective that was measured.
    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    /// All observed metrics.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Looks up a single metric.
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}
