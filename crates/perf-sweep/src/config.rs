use std::fs;
use std::path::{Path, PathBuf};

use perf_core::errors::{ErrorInfo, SweepError};
use perf_core::serde::from_yaml_slice;
use perf_results::MetricConstraint;
use perf_search::{Distribution, ParameterKind, SearchDomain};
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn config_error(code: &str, err: impl ToString, path: &Path) -> SweepError {
    SweepError::Config(
        ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()),
    )
}

/// Where and how often checkpoints are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointSettings {
    /// Directory holding checkpoint files. Relative paths resolve against the config file.
    #[serde(default = "default_checkpoint_directory")]
    pub directory: PathBuf,
    /// Save after this many new measurements (0 keeps only the final save).
    #[serde(default = "default_checkpoint_interval")]
    pub interval: usize,
}

fn default_checkpoint_directory() -> PathBuf {
    PathBuf::from("checkpoints")
}

fn default_checkpoint_interval() -> usize {
    1
}

impl Default for CheckpointSettings {
    fn default() -> Self {
        Self {
            directory: default_checkpoint_directory(),
            interval: default_checkpoint_interval(),
        }
    }
}

/// Parameter declaration as written in the YAML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParameterSpec {
    /// Single literal value.
    Fixed {
        /// The value used by every objective.
        value: Value,
    },
    /// Explicit list of candidates.
    Categorical {
        /// Candidates in sweep order.
        values: Vec<Value>,
    },
    /// Integer range expanded to a categorical list.
    Linear {
        /// First value.
        min: i64,
        /// Upper bound (inclusive).
        max: i64,
        /// Increment between values.
        #[serde(default = "default_step")]
        step: i64,
    },
    /// Powers of two between two exponents, expanded to a categorical list.
    Exponential {
        /// Smallest exponent.
        min: u32,
        /// Largest exponent (inclusive).
        max: u32,
    },
    /// Sampling metadata for content generation.
    Distribution {
        /// Mean of the distribution.
        mean: f64,
        /// Standard deviation.
        #[serde(default)]
        stddev: f64,
    },
}

fn default_step() -> i64 {
    1
}

impl ParameterSpec {
    /// Resolves the declaration into a domain parameter kind.
    pub fn to_kind(&self) -> Result<ParameterKind, SweepError> {
        let kind = match self {
            ParameterSpec::Fixed { value } => ParameterKind::Fixed(value.clone()),
            ParameterSpec::Categorical { values } => ParameterKind::Categorical(values.clone()),
            ParameterSpec::Linear { min, max, step } => ParameterKind::linear(*min, *max, *step)?,
            ParameterSpec::Exponential { min, max } => ParameterKind::exponential(*min, *max)?,
            ParameterSpec::Distribution { mean, stddev } => {
                ParameterKind::Distribution(Distribution::new(*mean, *stddev))
            }
        };
        Ok(kind)
    }
}

/// Named parameter declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDecl {
    /// Parameter name, unique within its model.
    pub name: String,
    /// How the parameter varies.
    #[serde(flatten)]
    pub spec: ParameterSpec,
}

/// Model declaration with its parameters in sweep order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDecl {
    /// Model name.
    pub name: String,
    /// Parameters in declaration order.
    #[serde(default)]
    pub parameters: Vec<ParameterDecl>,
}

/// On-disk layout of a sweep configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepFile {
    /// Optional identity used for the checkpoint file name.
    #[serde(default)]
    pub name: Option<String>,
    /// Checkpoint behaviour.
    #[serde(default)]
    pub checkpoint: CheckpointSettings,
    /// Constraints used when reporting results.
    #[serde(default)]
    pub constraints: Vec<MetricConstraint>,
    /// Models to sweep, in order.
    pub models: Vec<ModelDecl>,
}

/// Validated sweep configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    /// Optional explicit identity.
    pub name: Option<String>,
    /// Checkpoint behaviour with the directory already resolved.
    pub checkpoint: CheckpointSettings,
    /// Constraints used when reporting results.
    pub constraints: Vec<MetricConstraint>,
    domain: SearchDomain,
}

impl SweepConfig {
    /// Builds a configuration from an already declared domain.
    pub fn from_domain(
        name: Option<String>,
        domain: SearchDomain,
        checkpoint: CheckpointSettings,
    ) -> Self {
        Self {
            name,
            checkpoint,
            constraints: Vec::new(),
            domain,
        }
    }

    /// Validates a parsed file, declaring every parameter on a fresh domain.
    pub fn from_file(file: SweepFile, base_dir: &Path) -> Result<Self, SweepError> {
        let mut domain = SearchDomain::new();
        for model in &file.models {
            domain.add_model(&model.name)?;
            for param in &model.parameters {
                domain.add_parameter(&model.name, &param.name, param.spec.to_kind()?)?;
            }
        }
        let mut checkpoint = file.checkpoint;
        if checkpoint.directory.is_relative() {
            checkpoint.directory = base_dir.join(&checkpoint.directory);
        }
        Ok(Self {
            name: file.name,
            checkpoint,
            constraints: file.constraints,
            domain,
        })
    }

    /// Loads and validates a YAML configuration file.
    pub fn load(path: &Path) -> Result<Self, SweepError> {
        let bytes = fs::read(path).map_err(|err| config_error("config-read", err, path))?;
        let file: SweepFile = from_yaml_slice(&bytes)
            .map_err(|info| SweepError::Config(info.with_context("path", path.display().to_string())))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_file(file, base_dir)
    }

    /// The declared search domain.
    pub fn domain(&self) -> &SearchDomain {
        &self.domain
    }
}
