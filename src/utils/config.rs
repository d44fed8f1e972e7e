// Configuration utilities and TOML parsing

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::services::manifest_validator::CheckPolicy;
use crate::utils::error::{ReqmError, Result};

/// Default package index
pub const DEFAULT_INDEX_URL: &str = "https://pypi.org";

/// File name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "reqm.toml";

/// Default manifest path when none is given on the command line
pub const DEFAULT_MANIFEST: &str = "requirements.txt";

/// Package index settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexConfig {
    /// Base URL of a PyPI-compatible JSON API
    pub url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum number of concurrent index requests
    pub concurrency: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_INDEX_URL.to_string(),
            timeout_secs: 30,
            concurrency: 8,
        }
    }
}

/// Top-level `reqm.toml` contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReqmConfig {
    pub check: CheckPolicy,
    pub index: IndexConfig,
}

/// Configuration parsing and validation utilities
pub struct ConfigParser;

impl ConfigParser {
    /// Load configuration, honouring an explicit path first and falling
    /// back to `./reqm.toml`, then the user config directory, then defaults
    pub fn load(explicit: Option<&Path>) -> Result<ReqmConfig> {
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(ReqmError::ConfigError(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
            return Self::load_file(path);
        }

        for candidate in Self::search_paths() {
            if candidate.is_file() {
                log::debug!("using configuration from {}", candidate.display());
                return Self::load_file(&candidate);
            }
        }

        log::debug!("no configuration file found, using defaults");
        Ok(ReqmConfig::default())
    }

    /// Candidate configuration files in lookup order
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("reqm").join("config.toml"));
        }
        paths
    }

    /// Load and validate a configuration file
    pub fn load_file(path: &Path) -> Result<ReqmConfig> {
        let content = fs::read_to_string(path).map_err(|e| {
            ReqmError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::parse_config(&content)
            .map_err(|e| ReqmError::ConfigError(format!("{}: {e}", path.display())))
    }

    /// Parse configuration from TOML string with validation
    pub fn parse_config(content: &str) -> Result<ReqmConfig> {
        let config: ReqmConfig = toml::from_str(content)
            .map_err(|e| ReqmError::ConfigError(format!("Invalid TOML syntax: {e}")))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Reject configurations the resolver cannot work with
    pub fn validate(config: &ReqmConfig) -> Result<()> {
        if config.index.concurrency == 0 {
            return Err(ReqmError::ConfigError(
                "index.concurrency must be at least 1".to_string(),
            ));
        }

        if config.index.timeout_secs == 0 {
            return Err(ReqmError::ConfigError(
                "index.timeout_secs must be at least 1".to_string(),
            ));
        }

        let url = config.index.url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ReqmError::ConfigError(format!(
                "index.url '{url}' must be an http(s) URL"
            )));
        }

        Ok(())
    }
}
