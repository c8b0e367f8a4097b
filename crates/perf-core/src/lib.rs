#![deny(missing_docs)]
#![doc = "Shared error taxonomy, canonical serialization and hashing for perf-sweep."]

pub mod errors;
pub mod hash;
pub mod serde;
mod slug;

pub use errors::{CheckpointError, DomainError, ErrorInfo, ResultError, SweepError};
pub use hash::stable_hash_string;
pub use slug::slugify;
