// Loading manifests from disk, optionally following `-r` includes

use std::fs;
use std::path::{Path, PathBuf};

use crate::models::manifest::Manifest;
use crate::services::manifest_parser::ManifestParser;
use crate::utils::error::{ReqmError, Result};

/// Reads manifests and resolves their includes
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestLoader {
    follow_includes: bool,
}

impl ManifestLoader {
    pub fn new(follow_includes: bool) -> Self {
        Self { follow_includes }
    }

    /// Load the manifest at `path`
    pub fn load(&self, path: &Path) -> Result<Manifest> {
        let mut stack = Vec::new();
        self.load_recursive(path, &mut stack)
    }

    /// Read the raw text of a manifest
    pub fn read_text(path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|e| ReqmError::io(path, e))
    }

    fn load_recursive(&self, path: &Path, stack: &mut Vec<PathBuf>) -> Result<Manifest> {
        let text = Self::read_text(path)?;
        let mut manifest = ManifestParser::parse(&path.display().to_string(), &text);
        log::debug!(
            "parsed {} ({} lines, {} requirements)",
            manifest.source,
            manifest.lines.len(),
            manifest.requirements().count()
        );

        if !self.follow_includes {
            return Ok(manifest);
        }

        // canonical paths make `a/../b.txt` and `b.txt` the same node
        let identity = fs::canonicalize(path).map_err(|e| ReqmError::io(path, e))?;
        stack.push(identity);

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let include_paths: Vec<PathBuf> = manifest.include_paths().map(|p| base.join(p)).collect();

        for include in include_paths {
            let identity = fs::canonicalize(&include).map_err(|e| {
                ReqmError::IncludeError(format!(
                    "{} includes {}, which cannot be opened: {e}",
                    path.display(),
                    include.display()
                ))
            })?;
            if stack.contains(&identity) {
                return Err(ReqmError::IncludeError(format!(
                    "include cycle: {} includes {} again",
                    path.display(),
                    include.display()
                )));
            }
            log::debug!("following include {}", include.display());
            let included = self.load_recursive(&include, stack)?;
            manifest.includes.push(included);
        }

        stack.pop();
        Ok(manifest)
    }
}
