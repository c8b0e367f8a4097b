use indexmap::IndexMap;
use perf_core::errors::{DomainError, ErrorInfo};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Largest exponent accepted by [`ParameterKind::exponential`].
const MAX_EXPONENT: u32 = 62;

/// Mean and spread used to bias downstream content sampling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    /// Centre of the sampled distribution.
    pub mean: f64,
    /// Standard deviation around the mean; zero means every sample equals the mean.
    pub stddev: f64,
}

impl Distribution {
    /// Creates a distribution descriptor. Validation happens on declaration.
    pub const fn new(mean: f64, stddev: f64) -> Self {
        Self { mean, stddev }
    }
}

/// How a single parameter varies across the sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    /// One literal value shared by every objective.
    Fixed(Value),
    /// Ordered candidates; each one becomes a grid axis point.
    Categorical(Vec<Value>),
    /// Sampling metadata passed through to content generation, never expanded.
    Distribution(Distribution),
}

impl ParameterKind {
    /// Builds a categorical axis `[min, min + step, ...]` bounded by `max`.
    pub fn linear(min: i64, max: i64, step: i64) -> Result<Self, DomainError> {
        if step <= 0 || min > max {
            return Err(DomainError::InvalidParameter(
                ErrorInfo::new("domain-linear-range", "linear range is empty")
                    .with_context("min", min.to_string())
                    .with_context("max", max.to_string())
                    .with_context("step", step.to_string())
                    .with_hint("use min <= max and a positive step"),
            ));
        }
        let mut values = Vec::new();
        let mut current = Some(min);
        while let Some(value) = current.filter(|value| *value <= max) {
            values.push(Value::from(value));
            current = value.checked_add(step);
        }
        Ok(ParameterKind::Categorical(values))
    }

    /// Builds a categorical axis of powers of two, `2^min_exp ..= 2^max_exp`.
    pub fn exponential(min_exp: u32, max_exp: u32) -> Result<Self, DomainError> {
        if min_exp > max_exp || max_exp > MAX_EXPONENT {
            return Err(DomainError::InvalidParameter(
                ErrorInfo::new("domain-exponential-range", "exponential range is empty")
                    .with_context("min", min_exp.to_string())
                    .with_context("max", max_exp.to_string())
                    .with_hint(format!("use min <= max <= {MAX_EXPONENT}")),
            ));
        }
        let values = (min_exp..=max_exp)
            .map(|exp| Value::from(1u64 << exp))
            .collect();
        Ok(ParameterKind::Categorical(values))
    }

    /// Number of grid points contributed by this parameter.
    pub fn cardinality(&self) -> usize {
        match self {
            ParameterKind::Fixed(_) | ParameterKind::Distribution(_) => 1,
            ParameterKind::Categorical(values) => values.len(),
        }
    }

    /// Returns true when the parameter takes part in grid expansion.
    pub fn is_grid(&self) -> bool {
        !matches!(self, ParameterKind::Distribution(_))
    }

    fn validate(&self, model: &str, name: &str) -> Result<(), DomainError> {
        match self {
            ParameterKind::Fixed(_) => Ok(()),
            ParameterKind::Categorical(values) if values.is_empty() => {
                Err(DomainError::InvalidParameter(
                    ErrorInfo::new("domain-empty-categorical", "categorical list is empty")
                        .with_context("model", model)
                        .with_context("parameter", name),
                ))
            }
            ParameterKind::Categorical(_) => Ok(()),
            ParameterKind::Distribution(dist) => {
                if !dist.mean.is_finite() || !dist.stddev.is_finite() || dist.stddev < 0.0 {
                    return Err(DomainError::InvalidParameter(
                        ErrorInfo::new(
                            "domain-invalid-distribution",
                            "distribution needs a finite mean and a finite, non-negative spread",
                        )
                        .with_context("model", model)
                        .with_context("parameter", name)
                        .with_context("mean", dist.mean.to_string())
                        .with_context("stddev", dist.stddev.to_string()),
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Parameters of one model keyed by name, in declaration order.
pub type Parameters = IndexMap<String, ParameterKind>;

/// Declared space of parameters for one or more models.
///
/// Models and parameters keep their declaration order; that order drives the
/// objective sequence and therefore checkpoint resume.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SearchDomain {
    models: IndexMap<String, Parameters>,
}

impl SearchDomain {
    /// Creates an empty domain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a model without parameters. Declaring an existing model is a no-op.
    pub fn add_model(&mut self, model: &str) -> Result<(), DomainError> {
        if model.trim().is_empty() {
            return Err(DomainError::InvalidParameter(ErrorInfo::new(
                "domain-empty-model",
                "model name must not be empty",
            )));
        }
        self.models.entry(model.to_string()).or_default();
        Ok(())
    }

    /// Declares a parameter for `model`, declaring the model when needed.
    pub fn add_parameter(
        &mut self,
        model: &str,
        name: &str,
        kind: ParameterKind,
    ) -> Result<(), DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::InvalidParameter(
                ErrorInfo::new("domain-empty-parameter", "parameter name must not be empty")
                    .with_context("model", model),
            ));
        }
        kind.validate(model, name)?;
        if self
            .models
            .get(model)
            .is_some_and(|params| params.contains_key(name))
        {
            return Err(DomainError::InvalidParameter(
                ErrorInfo::new("domain-duplicate-parameter", "parameter already declared")
                    .with_context("model", model)
                    .with_context("parameter", name),
            ));
        }
        self.add_model(model)?;
        if let Some(params) = self.models.get_mut(model) {
            params.insert(name.to_string(), kind);
        }
        Ok(())
    }

    /// Builder form of [`SearchDomain::add_parameter`].
    pub fn with_parameter(
        mut self,
        model: &str,
        name: &str,
        kind: ParameterKind,
    ) -> Result<Self, DomainError> {
        self.add_parameter(model, name, kind)?;
        Ok(self)
    }

    /// Returns the parameters declared for `model`.
    pub fn parameters_for(&self, model: &str) -> Result<&Parameters, DomainError> {
        self.models.get(model).ok_or_else(|| {
            DomainError::UnknownModel(
                ErrorInfo::new("domain-unknown-model", "model was never declared")
                    .with_context("model", model),
            )
        })
    }

    /// Model names in declaration order.
    pub fn models(&self) -> impl Iterator<Item = &str> + '_ {
        self.models.keys().map(String::as_str)
    }

    /// Number of declared models.
    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Returns true when no model has been declared.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&String, &Parameters)> + '_ {
        self.models.iter()
    }
}
