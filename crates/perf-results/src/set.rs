use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use perf_core::errors::{ErrorInfo, ResultError};
use perf_search::Objective;
use serde::{Deserialize, Serialize, Serializer};

use crate::constraints::MetricConstraint;
use crate::record::RunRecord;

/// Optimisation direction for metric queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Larger values are better (throughput).
    Maximize,
    /// Smaller values are better (latency).
    Minimize,
}

impl Direction {
    /// Orders two metric values so that the preferred one compares as `Less`.
    fn rank(self, a: f64, b: f64) -> Ordering {
        match self {
            Direction::Maximize => b.total_cmp(&a),
            Direction::Minimize => a.total_cmp(&b),
        }
    }
}

/// Ordered, name-indexed collection of run records.
///
/// Insertion order is preserved; names are unique. The set is a plain owned
/// value, so concurrent producers must serialize their calls to [`ResultSet::add`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(try_from = "Vec<RunRecord>")]
pub struct ResultSet {
    records: Vec<RunRecord>,
    by_name: HashMap<String, usize>,
    points: HashSet<(String, String)>,
}

impl ResultSet {
    /// Creates an empty result set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record. Fails without modifying the set when the name is taken.
    pub fn add(&mut self, record: RunRecord) -> Result<(), ResultError> {
        if self.by_name.contains_key(record.name()) {
            return Err(ResultError::DuplicateName(
                ErrorInfo::new("result-duplicate-name", "run name already present")
                    .with_context("name", record.name())
                    .with_context("model", record.model_name()),
            ));
        }
        self.by_name
            .insert(record.name().to_string(), self.records.len());
        self.points.insert(point_key(record.model_name(), record.objective()));
        self.records.push(record);
        Ok(())
    }

    /// Returns the record with the given name.
    pub fn get(&self, name: &str) -> Result<&RunRecord, ResultError> {
        self.by_name
            .get(name)
            .map(|idx| &self.records[*idx])
            .ok_or_else(|| {
                ResultError::NotFound(
                    ErrorInfo::new("result-not-found", "no run with that name")
                        .with_context("name", name),
                )
            })
    }

    /// Returns true when a record for `model_name` already covers the objective's grid point.
    pub fn contains_objective(&self, model_name: &str, objective: &Objective) -> bool {
        self.points.contains(&point_key(model_name, objective))
    }

    /// Returns the record with the best value of `metric`.
    ///
    /// Records without the metric are ignored; ties keep the earliest record.
    pub fn best(&self, metric: &str, direction: Direction) -> Result<&RunRecord, ResultError> {
        if self.records.is_empty() {
            return Err(ResultError::EmptySet(
                ErrorInfo::new("result-empty", "result set has no records")
                    .with_context("metric", metric),
            ));
        }
        let mut best: Option<(&RunRecord, f64)> = None;
        for record in &self.records {
            let Some(value) = record.metric(metric) else {
                continue;
            };
            match best {
                Some((_, current)) if direction.rank(value, current) != Ordering::Less => {}
                _ => best = Some((record, value)),
            }
        }
        best.map(|(record, _)| record)
            .ok_or_else(|| missing_metric(metric, self.records.len()))
    }

    /// Returns up to `n` records carrying `metric`, best first, ties in insertion order.
    pub fn top_n(&self, metric: &str, direction: Direction, n: usize) -> Vec<&RunRecord> {
        let mut ranked: Vec<(&RunRecord, f64)> = self
            .records
            .iter()
            .filter_map(|record| record.metric(metric).map(|value| (record, value)))
            .collect();
        ranked.sort_by(|(_, a), (_, b)| direction.rank(*a, *b));
        ranked.into_iter().take(n).map(|(record, _)| record).collect()
    }

    /// Records satisfying every constraint, in insertion order.
    pub fn passing(&self, constraints: &[MetricConstraint]) -> Vec<&RunRecord> {
        self.records
            .iter()
            .filter(|record| constraints.iter().all(|c| c.satisfied_by(record)))
            .collect()
    }

    /// Records violating at least one constraint, in insertion order.
    pub fn failing(&self, constraints: &[MetricConstraint]) -> Vec<&RunRecord> {
        self.records
            .iter()
            .filter(|record| !constraints.iter().all(|c| c.satisfied_by(record)))
            .collect()
    }

    /// Records belonging to `model_name`, in insertion order.
    pub fn records_for_model<'a>(
        &'a self,
        model_name: &'a str,
    ) -> impl Iterator<Item = &'a RunRecord> + 'a {
        self.records
            .iter()
            .filter(move |record| record.model_name() == model_name)
    }

    /// Iterates over records in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, RunRecord> {
        self.records.iter()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true when the set holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn point_key(model_name: &str, objective: &Objective) -> (String, String) {
    (model_name.to_string(), objective.grid_key())
}

fn missing_metric(metric: &str, records: usize) -> ResultError {
    ResultError::MetricMissing(
        ErrorInfo::new("result-metric-missing", "no record carries the metric")
            .with_context("metric", metric)
            .with_context("records", records.to_string()),
    )
}

impl PartialEq for ResultSet {
    fn eq(&self, other: &Self) -> bool {
        self.records == other.records
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a RunRecord;
    type IntoIter = std::slice::Iter<'a, RunRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl TryFrom<Vec<RunRecord>> for ResultSet {
    type Error = ResultError;

    fn try_from(records: Vec<RunRecord>) -> Result<Self, Self::Error> {
        let mut set = ResultSet::new();
        for record in records {
            set.add(record)?;
        }
        Ok(set)
    }
}

impl Serialize for ResultSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.records.serialize(serializer)
    }
}
