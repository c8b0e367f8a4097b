use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use perf_core::errors::{CheckpointError, ErrorInfo};
use perf_results::ResultSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::config::SweepConfig;
use crate::fingerprint::{checkpoint_file_name, fingerprint};

/// Schema version written by this build.
pub const CHECKPOINT_SCHEMA_VERSION: u32 = 1;

const SUPPORTED_SCHEMA_VERSIONS: &[u32] = &[CHECKPOINT_SCHEMA_VERSION];

fn io_failure(code: &str, err: impl ToString, path: &Path) -> CheckpointError {
    CheckpointError::IoFailure(
        ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()),
    )
}

fn corrupt(code: &str, err: impl ToString, path: &Path) -> CheckpointError {
    CheckpointError::Corrupt(
        ErrorInfo::new(code, err.to_string())
            .with_context("path", path.display().to_string())
            .with_hint("delete the checkpoint (clean) and rerun the sweep"),
    )
}

/// Serializable checkpoint payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointPayload {
    /// Layout version of this payload.
    pub schema_version: u32,
    /// Fingerprint of the configuration that produced the results.
    pub fingerprint: String,
    /// RFC 3339 timestamp of the write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<String>,
    /// Results in insertion order.
    pub results: ResultSet,
}

#[derive(Serialize)]
struct PayloadRef<'a> {
    schema_version: u32,
    fingerprint: &'a str,
    saved_at: Option<String>,
    results: &'a ResultSet,
}

/// Outcome of [`CheckpointStore::load`].
#[derive(Debug, Clone, PartialEq)]
pub enum CheckpointState {
    /// Nothing stored for this configuration yet.
    NoCheckpoint,
    /// Results restored from a matching checkpoint.
    Restored(ResultSet),
}

impl CheckpointState {
    /// Returns true when a checkpoint was restored.
    pub fn is_restored(&self) -> bool {
        matches!(self, CheckpointState::Restored(_))
    }

    /// Restored results, or an empty set when nothing was stored.
    pub fn into_results(self) -> ResultSet {
        match self {
            CheckpointState::NoCheckpoint => ResultSet::new(),
            CheckpointState::Restored(results) => results,
        }
    }
}

/// Durable save and restore of result sets, one file per configuration identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointStore {
    directory: PathBuf,
}

impl CheckpointStore {
    /// Store rooted at `directory`.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Store rooted at the configuration's checkpoint directory.
    pub fn for_config(config: &SweepConfig) -> Self {
        Self::new(config.checkpoint.directory.clone())
    }

    /// Directory holding checkpoint files.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Deterministic checkpoint path for `config`.
    pub fn path_for(&self, config: &SweepConfig) -> PathBuf {
        self.directory.join(checkpoint_file_name(config))
    }

    /// Returns true when a checkpoint file exists for `config`.
    pub fn exists(&self, config: &SweepConfig) -> bool {
        self.path_for(config).is_file()
    }

    /// Writes `results` atomically, replacing any previous checkpoint.
    pub fn save(&self, config: &SweepConfig, results: &ResultSet) -> Result<PathBuf, CheckpointError> {
        let path = self.path_for(config);
        let fingerprint = fingerprint(config).map_err(CheckpointError::IoFailure)?;
        let payload = PayloadRef {
            schema_version: CHECKPOINT_SCHEMA_VERSION,
            fingerprint: &fingerprint,
            saved_at: Some(Utc::now().to_rfc3339()),
            results,
        };
        let json = serde_json::to_vec_pretty(&payload)
            .map_err(|err| io_failure("checkpoint-serialize", err, &path))?;

        fs::create_dir_all(&self.directory)
            .map_err(|err| io_failure("checkpoint-mkdir", err, &self.directory))?;
        let mut tmp = NamedTempFile::new_in(&self.directory)
            .map_err(|err| io_failure("checkpoint-tempfile", err, &self.directory))?;
        tmp.write_all(&json)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|err| io_failure("checkpoint-write", err, tmp.path()))?;
        tmp.persist(&path)
            .map_err(|err| io_failure("checkpoint-persist", err.error, &path))?;

        tracing::info!(
            path = %path.display(),
            records = results.len(),
            "saved checkpoint"
        );
        Ok(path)
    }

    /// Restores the checkpoint for `config`, if one exists.
    pub fn load(&self, config: &SweepConfig) -> Result<CheckpointState, CheckpointError> {
        let path = self.path_for(config);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no checkpoint found");
                return Ok(CheckpointState::NoCheckpoint);
            }
            Err(err) => return Err(io_failure("checkpoint-read", err, &path)),
        };

        let raw: Value =
            serde_json::from_slice(&bytes).map_err(|err| corrupt("checkpoint-parse", err, &path))?;
        let version = raw
            .get("schema_version")
            .and_then(Value::as_u64)
            .ok_or_else(|| corrupt("checkpoint-schema-missing", "schema_version is missing", &path))?;
        if !SUPPORTED_SCHEMA_VERSIONS
            .iter()
            .any(|supported| u64::from(*supported) == version)
        {
            return Err(CheckpointError::SchemaMismatch(
                ErrorInfo::new("checkpoint-schema", "unsupported checkpoint schema version")
                    .with_context("path", path.display().to_string())
                    .with_context("found", version.to_string())
                    .with_context("expected", CHECKPOINT_SCHEMA_VERSION.to_string()),
            ));
        }
        let payload: CheckpointPayload =
            serde_json::from_value(raw).map_err(|err| corrupt("checkpoint-decode", err, &path))?;

        let expected = fingerprint(config).map_err(CheckpointError::IoFailure)?;
        if payload.fingerprint != expected {
            return Err(CheckpointError::ConfigMismatch(
                ErrorInfo::new(
                    "checkpoint-fingerprint",
                    "checkpoint was written for a different search domain",
                )
                .with_context("path", path.display().to_string())
                .with_context("stored", payload.fingerprint)
                .with_context("expected", expected)
                .with_hint("restore the original configuration or discard the checkpoint"),
            ));
        }

        tracing::info!(
            path = %path.display(),
            records = payload.results.len(),
            "restored checkpoint"
        );
        Ok(CheckpointState::Restored(payload.results))
    }

    /// Deletes the checkpoint for `config`. Returns whether a file was removed.
    pub fn discard(&self, config: &SweepConfig) -> Result<bool, CheckpointError> {
        let path = self.path_for(config);
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "discarded checkpoint");
                Ok(true)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(io_failure("checkpoint-remove", err, &path)),
        }
    }
}
