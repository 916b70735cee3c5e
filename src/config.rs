//! Merge configuration with sensible defaults.
//!
//! [`MergeConfig`] describes how JSON hits are ordered and where page
//! numbering starts. It can be built in code or loaded from a TOML file:
//!
//! ```toml
//! sort_key = "popularity"
//! sort_direction = "desc"
//! first_page = 0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::comparator::{Comparator, SortDirection};
use crate::error::{MergeError, Result};
use crate::key_path::KeyPath;

/// Configuration for a merge session over JSON hits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Dot-separated field path holding each hit's sort value.
    pub sort_key: Option<String>,
    /// Emission direction for `sort_key`.
    pub sort_direction: SortDirection,
    /// Page number requested first from every source.
    pub first_page: u32,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            sort_key: None,
            sort_direction: SortDirection::Desc,
            first_page: 0,
        }
    }
}

impl MergeConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// fails [`validate`](Self::validate).
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::Config`] if the TOML is malformed or invalid.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| MergeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// A `sort_key`, when present, must be a well-formed key path.
    pub fn validate(&self) -> Result<()> {
        if let Some(key) = &self.sort_key {
            KeyPath::parse(key)?;
        }
        Ok(())
    }

    /// Build the key-path comparator described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::Config`] if no `sort_key` is set or it is invalid.
    pub fn comparator(&self) -> Result<Comparator<Value>> {
        let key = self
            .sort_key
            .as_deref()
            .ok_or_else(|| MergeError::Config("sort_key is required".into()))?;
        Comparator::from_key_path(key, self.sort_direction)
    }
}
