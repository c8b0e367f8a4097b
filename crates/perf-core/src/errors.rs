//! Structured error types shared across perf-sweep crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every error variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (model names, paths, fingerprints, ...).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorInfo {}

/// Errors raised while declaring a search domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "kind", content = "detail")]
pub enum DomainError {
    /// The requested model was never declared.
    #[error("unknown model: {0}")]
    UnknownModel(ErrorInfo),
    /// A parameter declaration violated a domain invariant.
    #[error("invalid parameter: {0}")]
    InvalidParameter(ErrorInfo),
}

impl DomainError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            DomainError::UnknownModel(info) | DomainError::InvalidParameter(info) => info,
        }
    }
}

/// Errors raised by result set insertion and queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "kind", content = "detail")]
pub enum ResultError {
    /// A record with the same name is already present.
    #[error("duplicate run name: {0}")]
    DuplicateName(ErrorInfo),
    /// No record carries the requested name.
    #[error("run not found: {0}")]
    NotFound(ErrorInfo),
    /// The query needs at least one record.
    #[error("empty result set: {0}")]
    EmptySet(ErrorInfo),
    /// No record carries the requested metric.
    #[error("metric missing: {0}")]
    MetricMissing(ErrorInfo),
}

impl ResultError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            ResultError::DuplicateName(info)
            | ResultError::NotFound(info)
            | ResultError::EmptySet(info)
            | ResultError::MetricMissing(info) => info,
        }
    }
}

/// Errors raised while persisting or restoring checkpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "kind", content = "detail")]
pub enum CheckpointError {
    /// The stored schema version is not understood by this build.
    #[error("checkpoint schema mismatch: {0}")]
    SchemaMismatch(ErrorInfo),
    /// The stored payload could not be parsed.
    #[error("corrupt checkpoint: {0}")]
    Corrupt(ErrorInfo),
    /// The stored fingerprint belongs to a different configuration.
    #[error("checkpoint config mismatch: {0}")]
    ConfigMismatch(ErrorInfo),
    /// Filesystem access failed.
    #[error("checkpoint io failure: {0}")]
    IoFailure(ErrorInfo),
}

impl CheckpointError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            CheckpointError::SchemaMismatch(info)
            | CheckpointError::Corrupt(info)
            | CheckpointError::ConfigMismatch(info)
            | CheckpointError::IoFailure(info) => info,
        }
    }
}

/// Top level error surfaced by the sweep driver and configuration loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum SweepError {
    /// Search domain declaration errors.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    /// Result set contract violations.
    #[error("result error: {0}")]
    Results(#[from] ResultError),
    /// Checkpoint persistence errors.
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
    /// Configuration file errors.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Measurement collaborator failures and contract violations.
    #[error("measurement error: {0}")]
    Measurement(ErrorInfo),
    /// Serialization errors outside checkpoint handling.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl SweepError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            SweepError::Domain(err) => err.info(),
            SweepError::Results(err) => err.info(),
            SweepError::Checkpoint(err) => err.info(),
            SweepError::Config(info) | SweepError::Measurement(info) | SweepError::Serde(info) => {
                info
            }
        }
    }
}
