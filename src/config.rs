//! Tokenizer configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dialect_pack::{default_base_path, DEFAULT_DIALECT_PACK};
use crate::error::{Result, TokenizerError};

/// Per-call tokenization switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizeOptions {
    /// Split dictionary matches that carry a fused particle
    pub split_affixes: bool,
    /// Merge པ་/པོ་/བ་/བོ་ into the preceding dictionary word
    pub merge_dagdra: bool,
    /// Emit whitespace runs as their own tokens
    pub spaces_as_punct: bool,
}

impl Default for TokenizeOptions {
    fn default() -> Self {
        Self {
            split_affixes: true,
            merge_dagdra: true,
            spaces_as_punct: false,
        }
    }
}

impl TokenizeOptions {
    /// Options with every post-processing step turned off
    pub fn raw() -> Self {
        Self {
            split_affixes: false,
            merge_dagdra: false,
            spaces_as_punct: false,
        }
    }
}

/// Configuration for building a [`WordTokenizer`](crate::WordTokenizer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Dialect pack to load
    pub dialect_name: String,
    /// Cache root for dialect packs; `None` uses [`default_base_path`]
    pub base_path: Option<PathBuf>,
    /// Pinned pack version; `None` follows the latest release
    pub version: Option<String>,
    /// Download the pack on first use when it is not cached
    pub auto_download: bool,
    pub split_affixes: bool,
    pub merge_dagdra: bool,
    pub spaces_as_punct: bool,
    /// Add the affixed forms of every dictionary word at build time
    pub inflect: bool,
    /// Network timeout for pack downloads, in seconds
    pub timeout_secs: u64,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            dialect_name: DEFAULT_DIALECT_PACK.to_string(),
            base_path: None,
            version: None,
            auto_download: true,
            split_affixes: true,
            merge_dagdra: true,
            spaces_as_punct: false,
            inflect: true,
            timeout_secs: 120,
        }
    }
}

impl TokenizerConfig {
    /// Load a configuration from a JSON file. Missing fields take their
    /// default value.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| TokenizerError::io(path, e))?;
        let config: TokenizerConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Use another dialect pack.
    pub fn dialect_name(mut self, name: impl Into<String>) -> Self {
        self.dialect_name = name.into();
        self
    }

    /// Use another cache root.
    pub fn base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Pin the pack version.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Enable or disable automatic download.
    pub fn auto_download(mut self, enabled: bool) -> Self {
        self.auto_download = enabled;
        self
    }

    /// Check that the configuration can be used.
    pub fn validate(&self) -> Result<()> {
        if self.dialect_name.trim().is_empty() {
            return Err(TokenizerError::InvalidConfig(
                "dialect_name must not be empty".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(TokenizerError::InvalidConfig(
                "timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// The cache root this configuration resolves to
    pub fn resolved_base_path(&self) -> PathBuf {
        self.base_path.clone().unwrap_or_else(default_base_path)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The per-call switches this configuration implies
    pub fn options(&self) -> TokenizeOptions {
        TokenizeOptions {
            split_affixes: self.split_affixes,
            merge_dagdra: self.merge_dagdra,
            spaces_as_punct: self.spaces_as_punct,
        }
    }
}
