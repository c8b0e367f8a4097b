#![deny(missing_docs)]
#![doc = "Run records and the ordered, name-indexed result set."]

/// Metric bounds used to partition results.
pub mod constraints;
/// Measured outcome of a single objective.
pub mod record;
/// Ordered collection of run records with query helpers.
pub mod set;

pub use constraints::MetricConstraint;
pub use record::{Metrics, RunRecord};
pub use set::{Direction, ResultSet};
