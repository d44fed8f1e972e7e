use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One resolved package in a lock file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedPackage {
    /// Name as written in the manifest
    pub name: String,
    /// PEP 503 normalized name
    pub normalized_name: String,
    /// Version chosen from the index
    pub version: String,
    /// Specifier text the version was chosen against (empty when unpinned)
    #[serde(default)]
    pub specifier: String,
    /// Comment header the requirement appeared under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

/// Snapshot of the versions resolved for a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockFile {
    /// Lock file format version for future compatibility
    pub lock_version: u32,
    /// When this lock file was generated
    pub generated_at: DateTime<Utc>,
    /// Tool and version that produced the file
    pub generator: String,
    /// SHA-256 of the manifest text the lock was generated from
    pub manifest_sha256: String,
    /// Index the versions were resolved against
    pub index_url: String,
    /// Resolved packages in manifest order
    pub packages: Vec<LockedPackage>,
}

impl LockFile {
    /// Current lock file format version
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new(manifest_sha256: String, index_url: String, packages: Vec<LockedPackage>) -> Self {
        Self {
            lock_version: Self::CURRENT_VERSION,
            generated_at: Utc::now(),
            generator: format!("reqm {}", env!("CARGO_PKG_VERSION")),
            manifest_sha256,
            index_url,
            packages,
        }
    }

    /// Validate the lock file according to format rules
    pub fn validate(&self) -> Result<(), String> {
        if self.lock_version == 0 {
            return Err("Lock file version cannot be 0".to_string());
        }

        if self.lock_version > Self::CURRENT_VERSION {
            return Err(format!(
                "Lock file version {} is newer than supported version {}",
                self.lock_version,
                Self::CURRENT_VERSION
            ));
        }

        if !is_valid_sha256(&self.manifest_sha256) {
            return Err("Manifest hash must be a valid SHA-256".to_string());
        }

        let mut seen = HashSet::new();
        for package in &self.packages {
            if package.name.is_empty() || package.version.is_empty() {
                return Err("Locked packages need both a name and a version".to_string());
            }
            if !seen.insert(package.normalized_name.as_str()) {
                return Err(format!("Package '{}' is locked more than once", package.name));
            }
        }

        Ok(())
    }

    /// Look up a locked package by any spelling of its name
    pub fn get(&self, name: &str) -> Option<&LockedPackage> {
        let normalized = crate::utils::validation::normalize_package_name(name);
        self.packages.iter().find(|p| p.normalized_name == normalized)
    }

    /// Whether this lock was generated from the manifest with this hash
    pub fn matches_manifest(&self, sha256: &str) -> bool {
        self.manifest_sha256.eq_ignore_ascii_case(sha256)
    }
}

fn is_valid_sha256(hash: &str) -> bool {
    hash.len() == 64 && hash.chars().all(|c| c.is_ascii_hexdigit())
}
