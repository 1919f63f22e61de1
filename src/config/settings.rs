use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading store settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings from {origin}: {source}")]
    ParseError {
        origin: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Store settings, loadable from TOML.
///
/// ```toml
/// strict = true
/// devtools = false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Report state changes made outside mutation handlers.
    #[serde(default)]
    pub strict: bool,
    /// Attach the tracing devtool observer.
    #[serde(default)]
    pub devtools: bool,
}

impl StoreSettings {
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        Self::parse(content, "inline TOML".to_string())
    }

    /// Load settings from `path`. A missing file is an error.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path).map_err(|e| SettingsError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let settings = Self::parse(&content, format!("'{}'", path.display()))?;
        tracing::debug!(
            path = %path.display(),
            strict = settings.strict,
            devtools = settings.devtools,
            "Loaded store settings"
        );
        Ok(settings)
    }

    /// Like [`StoreSettings::load_from`], but a missing file yields defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(path)
    }

    fn parse(content: &str, origin: String) -> Result<Self, SettingsError> {
        toml::from_str(content).map_err(|e| SettingsError::ParseError { origin, source: e })
    }
}
