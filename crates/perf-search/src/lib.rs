#![deny(missing_docs)]
#![doc = "Search domain declaration and deterministic objective enumeration."]

/// Per-model parameter declarations.
pub mod domain;
/// Lazy Cartesian enumeration of objectives.
pub mod generator;
/// Fully resolved configurations.
pub mod objective;

pub use domain::{Distribution, ParameterKind, Parameters, SearchDomain};
pub use generator::{ObjectiveGenerator, ObjectiveIter};
pub use objective::Objective;
