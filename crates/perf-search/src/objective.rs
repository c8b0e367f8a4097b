use indexmap::IndexMap;
use perf_core::serde::canonicalize;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::Distribution;

/// One fully resolved configuration to benchmark for a single model.
///
/// `values` holds every fixed and categorical parameter; `distributions`
/// carries the sampling metadata for content generation and has no grid
/// identity. Derived equality is structural; use [`Objective::same_point`]
/// for grid identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    model_name: String,
    values: IndexMap<String, Value>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    distributions: IndexMap<String, Distribution>,
}

impl Objective {
    /// Creates an objective from resolved parameter values.
    pub fn new<K, I>(model_name: impl Into<String>, values: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self {
            model_name: model_name.into(),
            values: values
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
            distributions: IndexMap::new(),
        }
    }

    /// Attaches distribution metadata for downstream content generation.
    pub fn with_distribution(mut self, name: impl Into<String>, distribution: Distribution) -> Self {
        self.distributions.insert(name.into(), distribution);
        self
    }

    pub(crate) fn from_parts(
        model_name: &str,
        values: IndexMap<String, Value>,
        distributions: IndexMap<String, Distribution>,
    ) -> Self {
        Self {
            model_name: model_name.to_string(),
            values,
            distributions,
        }
    }

    /// Model the objective belongs to.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Resolved fixed and categorical values in declaration order.
    pub fn values(&self) -> &IndexMap<String, Value> {
        &self.values
    }

    /// Looks up a single resolved value.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Distribution metadata attached to the objective.
    pub fn distributions(&self) -> &IndexMap<String, Distribution> {
        &self.distributions
    }

    /// Returns true when both objectives denote the same grid point.
    pub fn same_point(&self, other: &Objective) -> bool {
        self.model_name == other.model_name && self.values == other.values
    }

    /// Canonical string identifying the grid point (model name plus values).
    ///
    /// Key order in `values` does not affect the result; distributions are excluded.
    pub fn grid_key(&self) -> String {
        let values: Map<String, Value> = self
            .values
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        canonicalize(Value::Array(vec![
            Value::String(self.model_name.clone()),
            Value::Object(values),
        ]))
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn grid_identity_ignores_distributions() {
        let a = Objective::new("m", [("batch_size", json!(1))])
            .with_distribution("isl", Distribution::new(100.0, 0.0));
        let b = Objective::new("m", [("batch_size", json!(1))])
            .with_distribution("isl", Distribution::new(900.0, 5.0));
        assert!(a.same_point(&b));
        assert_eq!(a.grid_key(), b.grid_key());
        assert_ne!(a, b);
    }

    #[test]
    fn grid_identity_ignores_key_order() {
        let a = Objective::new("m", [("a", json!(1)), ("b", json!("x"))]);
        let b = Objective::new("m", [("b", json!("x")), ("a", json!(1))]);
        assert!(a.same_point(&b));
        assert_eq!(a.grid_key(), b.grid_key());
    }

    #[test]
    fn grid_identity_tracks_model_and_values() {
        let a = Objective::new("m", [("a", json!(1))]);
        assert!(!a.same_point(&Objective::new("n", [("a", json!(1))])));
        assert!(!a.same_point(&Objective::new("m", [("a", json!(2))])));
        assert!(!a.same_point(&Objective::new("m", [("a", json!("1"))])));
        assert_ne!(a.grid_key(), Objective::new("n", [("a", json!(1))]).grid_key());
    }
}
