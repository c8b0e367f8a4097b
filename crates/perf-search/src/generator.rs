use std::iter::FusedIterator;

use indexmap::IndexMap;
use serde_json::Value;

use crate::domain::{Distribution, ParameterKind, Parameters, SearchDomain};
use crate::objective::Objective;

/// Deterministic enumerator over every grid point of a [`SearchDomain`].
///
/// Models are visited in declaration order. Within a model the parameters form
/// an odometer whose last declared parameter turns fastest, and categorical
/// values are taken in list order.
#[derive(Debug, Clone, Copy)]
pub struct ObjectiveGenerator<'a> {
    domain: &'a SearchDomain,
}

impl<'a> ObjectiveGenerator<'a> {
    /// Creates a generator bound to `domain`.
    pub fn new(domain: &'a SearchDomain) -> Self {
        Self { domain }
    }

    /// Returns a fresh iterator starting from the first objective.
    pub fn objectives(&self) -> ObjectiveIter<'a> {
        ObjectiveIter::new(self.domain)
    }

    /// Total number of objectives, computed without materializing them.
    pub fn count(&self) -> usize {
        self.domain
            .iter()
            .map(|(_, params)| model_cardinality(params))
            .fold(0usize, usize::saturating_add)
    }

    /// Number of objectives produced for a single model, if declared.
    pub fn count_for(&self, model: &str) -> Option<usize> {
        self.domain.parameters_for(model).ok().map(model_cardinality)
    }
}

fn model_cardinality(params: &Parameters) -> usize {
    params
        .values()
        .filter(|kind| kind.is_grid())
        .map(ParameterKind::cardinality)
        .fold(1usize, usize::saturating_mul)
}

#[derive(Debug, Clone)]
struct ModelAxes<'a> {
    name: &'a str,
    axes: Vec<(&'a str, &'a [Value])>,
    distributions: IndexMap<String, Distribution>,
}

impl<'a> ModelAxes<'a> {
    fn new(name: &'a str, params: &'a Parameters) -> Self {
        let mut axes = Vec::with_capacity(params.len());
        let mut distributions = IndexMap::new();
        for (param, kind) in params {
            match kind {
                ParameterKind::Fixed(value) => {
                    axes.push((param.as_str(), std::slice::from_ref(value)));
                }
                ParameterKind::Categorical(values) => axes.push((param.as_str(), values.as_slice())),
                ParameterKind::Distribution(dist) => {
                    distributions.insert(param.clone(), *dist);
                }
            }
        }
        Self {
            name,
            axes,
            distributions,
        }
    }

    fn resolve(&self, odometer: &[usize]) -> Objective {
        let values = self
            .axes
            .iter()
            .zip(odometer)
            .map(|((param, values), idx)| (param.to_string(), values[*idx].clone()))
            .collect();
        Objective::from_parts(self.name, values, self.distributions.clone())
    }

    /// Advances the odometer; returns false once every combination was visited.
    fn advance(&self, odometer: &mut [usize]) -> bool {
        for (slot, (_, values)) in odometer.iter_mut().zip(&self.axes).rev() {
            *slot += 1;
            if *slot < values.len() {
                return true;
            }
            *slot = 0;
        }
        false
    }
}

/// Lazy, finite iterator over the objectives of a [`SearchDomain`].
#[derive(Debug, Clone)]
pub struct ObjectiveIter<'a> {
    models: Vec<ModelAxes<'a>>,
    model_idx: usize,
    odometer: Vec<usize>,
    remaining: usize,
}

impl<'a> ObjectiveIter<'a> {
    fn new(domain: &'a SearchDomain) -> Self {
        let models: Vec<_> = domain
            .iter()
            .map(|(name, params)| ModelAxes::new(name, params))
            .collect();
        let odometer = vec![0; models.first().map_or(0, |model| model.axes.len())];
        let remaining = ObjectiveGenerator::new(domain).count();
        Self {
            models,
            model_idx: 0,
            odometer,
            remaining,
        }
    }
}

impl Iterator for ObjectiveIter<'_> {
    type Item = Objective;

    fn next(&mut self) -> Option<Objective> {
        let model = self.models.get(self.model_idx)?;
        let objective = model.resolve(&self.odometer);
        if !model.advance(&mut self.odometer) {
            self.model_idx += 1;
            let width = self
                .models
                .get(self.model_idx)
                .map_or(0, |next| next.axes.len());
            self.odometer = vec![0; width];
        }
        self.remaining = self.remaining.saturating_sub(1);
        Some(objective)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for ObjectiveIter<'_> {}

impl FusedIterator for ObjectiveIter<'_> {}
