//! Gateway configuration loaded from a TOML file and/or CLI flags.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::AegisError;

/// Configuration for the gateway process.
///
/// A TOML file provides the base values; CLI flags override individual
/// fields. `adapters` maps a tool name to the base URL of the adapter that
/// executes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    /// Listen address for the gateway HTTP server.
    pub listen: String,
    /// Directory containing `.yaml` policy files.
    pub policy_dir: PathBuf,
    /// Path to the append-only audit log file.
    pub audit_log: PathBuf,
    /// Tool name -> adapter base URL.
    pub adapters: HashMap<String, String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8080".to_string(),
            policy_dir: PathBuf::from("./policies"),
            audit_log: PathBuf::from("./logs/aegis-audit.log"),
            adapters: HashMap::new(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, AegisError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AegisError::ConfigError(format!("failed to read {}: {e}", path.display()))
        })?;
        toml::from_str(&text).map_err(|e| {
            AegisError::ConfigError(format!("failed to parse {}: {e}", path.display()))
        })
    }

    /// Apply a repeatable `--adapter tool=url` CLI flag.
    pub fn apply_adapter_flag(&mut self, spec: &str) -> Result<(), AegisError> {
        let (tool, url) = spec.split_once('=').ok_or_else(|| {
            AegisError::ConfigError(format!("adapter flag {spec:?} is not of the form tool=url"))
        })?;
        if tool.is_empty() || url.is_empty() {
            return Err(AegisError::ConfigError(format!(
                "adapter flag {spec:?} has an empty tool or url"
            )));
        }
        self.adapters.insert(tool.to_string(), url.to_string());
        Ok(())
    }
}
