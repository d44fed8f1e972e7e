use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::models::version::Version;
use crate::utils::config::{IndexConfig, DEFAULT_INDEX_URL};
use crate::utils::validation::{normalize_package_name, validate_package_name};

/// PyPI JSON API client used to look up available versions
#[derive(Debug, Clone)]
pub struct PypiClient {
    /// HTTP client for index requests
    client: Client,
    /// Base URL of the index (configurable for testing)
    registry_url: String,
    /// User agent string for requests
    user_agent: String,
}

/// Response from the PyPI JSON API package endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PypiPackageResponse {
    /// Package information
    pub info: PypiPackageInfo,
    /// All releases with their files
    #[serde(default)]
    pub releases: HashMap<String, Vec<PypiReleaseFile>>,
}

/// Package metadata from PyPI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PypiPackageInfo {
    /// Canonical package name
    pub name: String,
    /// Latest version
    pub version: String,
    /// One-line summary
    #[serde(default)]
    pub summary: Option<String>,
    /// Python version requirements
    #[serde(default)]
    pub requires_python: Option<String>,
}

/// Individual release file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PypiReleaseFile {
    /// Filename
    pub filename: String,
    /// Package type (sdist, bdist_wheel, etc.)
    #[serde(default)]
    pub packagetype: String,
    /// Whether the file was yanked
    #[serde(default)]
    pub yanked: bool,
}

/// PyPI client errors
#[derive(Debug, thiserror::Error)]
pub enum PypiError {
    /// HTTP request failed
    #[error("Index request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Package not found on the index
    #[error("Package '{0}' not found")]
    PackageNotFound(String),

    /// Invalid package name
    #[error("Invalid package name: {0}")]
    InvalidPackageName(String),

    /// Index response parsing failed
    #[error("Failed to parse index response: {0}")]
    ParseError(String),

    /// Unexpected HTTP status
    #[error("Index returned HTTP {status} for '{package}'")]
    UnexpectedStatus { package: String, status: u16 },

    /// Rate limiting
    #[error("Rate limited by index")]
    RateLimited,
}

impl PypiClient {
    /// Create a client for the public PyPI index
    pub fn new() -> Self {
        Self::with_registry_url(DEFAULT_INDEX_URL.to_string())
    }

    /// Create a client with a custom index URL (for testing)
    pub fn with_registry_url(registry_url: String) -> Self {
        Self::with_client(Client::new(), registry_url)
    }

    /// Create a client with a custom HTTP client
    pub fn with_client(client: Client, registry_url: String) -> Self {
        Self {
            client,
            registry_url: registry_url.trim_end_matches('/').to_string(),
            user_agent: format!("reqm/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Create a client from the `[index]` configuration section
    pub fn from_config(config: &IndexConfig) -> Result<Self, PypiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(config.concurrency)
            .use_rustls_tls()
            .build()?;
        Ok(Self::with_client(client, config.url.clone()))
    }

    pub fn registry_url(&self) -> &str {
        &self.registry_url
    }

    /// Get package information from the JSON API
    pub async fn get_package_info(&self, package_name: &str) -> Result<PypiPackageResponse, PypiError> {
        validate_package_name(package_name)
            .map_err(|_| PypiError::InvalidPackageName(package_name.to_string()))?;

        let url = format!(
            "{}/pypi/{}/json",
            self.registry_url,
            normalize_package_name(package_name)
        );
        log::debug!("GET {url}");

        let response = self
            .client
            .get(&url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(PypiError::PackageNotFound(package_name.to_string()));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(PypiError::RateLimited);
        }

        if !status.is_success() {
            return Err(PypiError::UnexpectedStatus {
                package: package_name.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .json::<PypiPackageResponse>()
            .await
            .map_err(|e| PypiError::ParseError(e.to_string()))
    }

    /// Get the latest version the index advertises
    pub async fn get_latest_version(&self, package_name: &str) -> Result<String, PypiError> {
        let package_info = self.get_package_info(package_name).await?;
        Ok(package_info.info.version)
    }

    /// Get all installable versions in ascending PEP 440 order
    pub async fn get_available_versions(&self, package_name: &str) -> Result<Vec<Version>, PypiError> {
        let package_info = self.get_package_info(package_name).await?;
        Ok(available_versions(&package_info))
    }

    /// Check if a package exists on the index
    pub async fn package_exists(&self, package_name: &str) -> Result<bool, PypiError> {
        match self.get_package_info(package_name).await {
            Ok(_) => Ok(true),
            Err(PypiError::PackageNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

impl Default for PypiClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Versions from a package response that are not fully yanked, sorted
/// ascending; unparseable version strings are skipped
pub fn available_versions(response: &PypiPackageResponse) -> Vec<Version> {
    let mut versions: Vec<Version> = response
        .releases
        .iter()
        .filter(|(_, files)| files.is_empty() || files.iter().any(|f| !f.yanked))
        .filter_map(|(raw, _)| match raw.parse::<Version>() {
            Ok(version) => Some(version),
            Err(_) => {
                log::debug!("skipping non-PEP 440 version '{raw}' of {}", response.info.name);
                None
            }
        })
        .collect();
    versions.sort();
    versions
}
