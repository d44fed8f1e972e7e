// Lock file management and pinned manifest rendering

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::lock_file::{LockFile, LockedPackage};
use crate::models::manifest::{LineKind, Manifest};
use crate::services::formatter;
use crate::services::resolver::Resolution;
use crate::utils::error::{ReqmError, Result};
use crate::utils::fs_utils::write_atomic;

/// Lock file management and JSON serialization utilities
pub struct LockFileManager {
    /// Path to the lock file
    lock_file_path: PathBuf,
}

impl LockFileManager {
    /// Create a new LockFileManager for the given path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            lock_file_path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.lock_file_path
    }

    /// Build a lock file from a resolution of `manifest_text`
    pub fn generate(manifest_text: &str, index_url: &str, resolution: &Resolution) -> Result<LockFile> {
        let mut packages: Vec<LockedPackage> = Vec::with_capacity(resolution.resolved.len());
        for resolved in &resolution.resolved {
            let requirement = &resolved.requirement;
            // every line naming a package gets the same version; later lines
            // only add their clauses
            if let Some(existing) = packages
                .iter_mut()
                .find(|p| p.normalized_name == requirement.name.normalized)
            {
                for clause in requirement.specifiers.iter().map(ToString::to_string) {
                    if !existing.specifier.split(',').any(|c| c == clause) {
                        if !existing.specifier.is_empty() {
                            existing.specifier.push(',');
                        }
                        existing.specifier.push_str(&clause);
                    }
                }
                continue;
            }
            packages.push(LockedPackage {
                name: requirement.name.raw.clone(),
                normalized_name: requirement.name.normalized.clone(),
                version: resolved.version.clone(),
                specifier: requirement.specifier_text(),
                section: requirement.section.clone(),
            });
        }

        let lock_file = LockFile::new(hash_manifest(manifest_text), index_url.to_string(), packages);
        lock_file
            .validate()
            .map_err(|e| ReqmError::ValidationError(format!("Generated invalid lock file: {e}")))?;
        Ok(lock_file)
    }

    /// Load and validate the lock file from disk
    pub fn load(&self) -> Result<LockFile> {
        let content = fs::read_to_string(&self.lock_file_path)
            .map_err(|e| ReqmError::io(&self.lock_file_path, e))?;
        Self::parse(&content)
    }

    /// Parse lock file JSON with validation
    pub fn parse(content: &str) -> Result<LockFile> {
        let lock_file: LockFile = serde_json::from_str(content)
            .map_err(|e| ReqmError::ParseError(format!("Invalid JSON in lock file: {e}")))?;

        lock_file.validate().map_err(ReqmError::ValidationError)?;

        if lock_file.lock_version < LockFile::CURRENT_VERSION {
            log::warn!(
                "lock file format is outdated (v{} vs v{}), consider regenerating",
                lock_file.lock_version,
                LockFile::CURRENT_VERSION
            );
        }
        Ok(lock_file)
    }

    /// Save the lock file to disk
    pub fn save(&self, lock_file: &LockFile) -> Result<()> {
        lock_file.validate().map_err(ReqmError::ValidationError)?;

        let mut content = serde_json::to_string_pretty(lock_file)
            .map_err(|e| ReqmError::ParseError(format!("Failed to serialize lock file: {e}")))?;
        content.push('\n');
        write_atomic(&self.lock_file_path, &content)
    }
}

/// SHA-256 of the manifest text, hex encoded
pub fn hash_manifest(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Render `manifest` in canonical form with every resolved requirement
/// pinned to `==version`; unresolved requirements are left as written
pub fn render_pinned(manifest: &Manifest, resolution: &Resolution) -> String {
    let mut pinned = manifest.clone();
    for line in &mut pinned.lines {
        let replacement = match &line.kind {
            LineKind::Requirement(requirement) => resolution
                .resolved
                .iter()
                .find(|r| r.source == manifest.source && r.requirement.line == requirement.line)
                .map(|r| requirement.pinned_to(&r.version)),
            _ => None,
        };
        // option lines are written out verbatim by the formatter
        if let Some(text) = replacement {
            line.kind = LineKind::Option(text);
        }
    }
    formatter::format(&pinned)
}
