//! TOML-based configuration for the engine.
//!
//! Everything has a sensible default; a config file only needs the keys it
//! wants to override:
//!
//! ```toml
//! [engine]
//! version = "3"
//! query_timeout_secs = 60
//!
//! [export]
//! page_size = 10000
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub engine: EngineSettings,
    pub export: ExportSettings,
}

/// Engine-level knobs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Version string folded into cache fingerprints. Bump when the query
    /// shape changes so stale tokens stop validating.
    pub version: String,

    /// Deadline for each database query, in seconds.
    pub query_timeout_secs: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            version: "1".into(),
            query_timeout_secs: 30,
        }
    }
}

/// Bulk export knobs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Rows fetched per pagination window.
    pub page_size: u64,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self { page_size: 5000 }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}
