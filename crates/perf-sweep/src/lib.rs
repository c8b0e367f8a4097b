#![deny(missing_docs)]
#![doc = "Sweep configuration, checkpointing and the resumable sweep driver."]

/// Durable save and restore of result sets.
pub mod checkpoint;
/// Measurement through an external program.
pub mod command;
/// YAML sweep configuration.
pub mod config;
/// Resumable sweep loop and the measurement trait.
pub mod driver;
/// Configuration identity and fingerprinting.
pub mod fingerprint;

pub use checkpoint::{CheckpointPayload, CheckpointState, CheckpointStore, CHECKPOINT_SCHEMA_VERSION};
pub use command::CommandMeasurer;
pub use config::{CheckpointSettings, ModelDecl, ParameterDecl, ParameterSpec, SweepConfig, SweepFile};
pub use driver::{
    run_name, FailurePolicy, Measure, NamedObjectives, RunOpts, Sweep, SweepOutcome, FAILED_METRIC,
};
pub use fingerprint::{checkpoint_file_name, fingerprint, identity};
