//! Runtime configuration
//!
//! Scoring policy is fixed in crate constants; this only covers deployment
//! knobs. Loaded from TOML, every field optional.

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::error::Result;

/// Deployment configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Namespace in `<ns>.trace.v1`
    pub trace_namespace: String,
    /// Source tag stamped on gesture envelopes
    pub gesture_source: String,
    /// Route used by `--ladder` when none is given
    pub default_route: String,
    /// HTTP bind address
    pub server_addr: String,
    /// Where `--export` writes envelopes
    pub export_dir: PathBuf,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            trace_namespace: crate::TRACE_NAMESPACE.to_string(),
            gesture_source: crate::GESTURE_SOURCE.to_string(),
            default_route: "proof-first".to_string(),
            server_addr: "127.0.0.1:3000".to_string(),
            export_dir: PathBuf::from("./traces"),
        }
    }
}

impl SimConfig {
    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: SimConfig = toml::from_str(&text)?;
        tracing::info!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Load if a path is given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    /// Full trace version tag
    pub fn trace_version(&self) -> String {
        format!("{}.trace.v1", self.trace_namespace)
    }
}
