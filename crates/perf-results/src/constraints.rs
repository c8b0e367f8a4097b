use serde::{Deserialize, Serialize};

use crate::record::RunRecord;

/// Inclusive bounds a record's metric must fall within.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricConstraint {
    /// Metric the bounds apply to.
    pub metric: String,
    /// Lower bound, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Upper bound, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl MetricConstraint {
    /// Constraint requiring `metric <= max`.
    pub fn at_most(metric: impl Into<String>, max: f64) -> Self {
        Self {
            metric: metric.into(),
            min: None,
            max: Some(max),
        }
    }

    /// Constraint requiring `metric >= min`.
    pub fn at_least(metric: impl Into<String>, min: f64) -> Self {
        Self {
            metric: metric.into(),
            min: Some(min),
            max: None,
        }
    }

    /// Returns true when the record carries the metric and it lies within bounds.
    pub fn satisfied_by(&self, record: &RunRecord) -> bool {
        let Some(value) = record.metric(&self.metric) else {
            return false;
        };
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::set::ResultSet;
    use perf_search::Objective;
    use serde_json::json;

    fn record(name: &str, latency: f64) -> RunRecord {
        RunRecord::new(
            name,
            Objective::new("m", [("concurrency", json!(name))]),
            [("latency", latency)],
        )
    }

    #[test]
    fn bounds_are_inclusive() {
        let constraint = MetricConstraint::at_most("latency", 100.0);
        assert!(constraint.satisfied_by(&record("a", 100.0)));
        assert!(!constraint.satisfied_by(&record("b", 100.5)));
        assert!(MetricConstraint::at_least("latency", 100.0).satisfied_by(&record("c", 100.0)));
    }

    #[test]
    fn missing_metric_fails_constraint() {
        let constraint = MetricConstraint::at_least("throughput", 1.0);
        assert!(!constraint.satisfied_by(&record("a", 1.0)));
    }

    #[test]
    fn sets_partition_by_constraints() {
        let mut set = ResultSet::new();
        set.add(record("fast", 50.0)).unwrap();
        set.add(record("slow", 250.0)).unwrap();
        set.add(record("ok", 90.0)).unwrap();
        let constraints = vec![MetricConstraint::at_most("latency", 100.0)];
        let passing: Vec<_> = set.passing(&constraints).into_iter().map(RunRecord::name).collect();
        let failing: Vec<_> = set.failing(&constraints).into_iter().map(RunRecord::name).collect();
        assert_eq!(passing, vec!["fast", "ok"]);
        assert_eq!(failing, vec!["slow"]);
        assert_eq!(set.passing(&[]).len(), 3);
    }
}
