use perf_core::errors::ErrorInfo;
use perf_core::hash::stable_hash_string;
use perf_core::slugify;
use perf_search::SearchDomain;
use serde::Serialize;

use crate::config::SweepConfig;

#[derive(Serialize)]
struct IdentityFields<'a> {
    identity: &'a str,
    domain: &'a SearchDomain,
}

/// Name a configuration is known by: the explicit name or the joined model names.
pub fn identity(config: &SweepConfig) -> String {
    match config.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => {
            let models: Vec<_> = config.domain().models().collect();
            if models.is_empty() {
                "sweep".to_string()
            } else {
                models.join("+")
            }
        }
    }
}

/// Checkpoint file name derived from the configuration identity.
pub fn checkpoint_file_name(config: &SweepConfig) -> String {
    format!("{}.checkpoint.json", slugify(&identity(config)))
}

/// SHA256 over the identity and the full search domain declaration.
///
/// Checkpoint directory and interval are not part of the fingerprint.
pub fn fingerprint(config: &SweepConfig) -> Result<String, ErrorInfo> {
    let identity = identity(config);
    stable_hash_string(&IdentityFields {
        identity: &identity,
        domain: config.domain(),
    })
}
