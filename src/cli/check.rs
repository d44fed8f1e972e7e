use std::path::PathBuf;

use clap::Args;
use serde::{Deserialize, Serialize};

use crate::cli::{load_manifest, print_json};
use crate::models::diagnostic::Diagnostic;
use crate::services::manifest_validator::{CheckPolicy, ManifestValidator};
use crate::utils::config::{ReqmConfig, DEFAULT_MANIFEST};
use crate::utils::error::{Result, EXIT_FINDINGS, EXIT_OK};

/// Validate a manifest
#[derive(Debug, Args)]
pub struct CheckCommand {
    /// Manifest to check (`-` for stdin)
    #[arg(default_value = DEFAULT_MANIFEST)]
    pub file: PathBuf,

    /// Treat warnings as failures
    #[arg(long)]
    pub strict: bool,

    /// Warn about packages without a version constraint
    #[arg(long, overrides_with = "no_require_pins")]
    pub require_pins: bool,

    /// Do not warn about unconstrained packages, even if configured
    #[arg(long, overrides_with = "require_pins")]
    pub no_require_pins: bool,

    /// Report duplicate packages as warnings instead of errors
    #[arg(long, overrides_with = "no_allow_duplicates")]
    pub allow_duplicates: bool,

    /// Report duplicate packages as errors, even if configured otherwise
    #[arg(long, overrides_with = "allow_duplicates")]
    pub no_allow_duplicates: bool,

    /// Also check files named by `-r` lines
    #[arg(long)]
    pub follow_includes: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// JSON response format for the check command
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckResponse {
    pub source: String,
    pub clean: bool,
    pub packages: usize,
    pub errors: usize,
    pub warnings: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckCommand {
    /// Policy from configuration; a flag in either direction wins over it
    pub fn policy(&self, config: &ReqmConfig) -> CheckPolicy {
        CheckPolicy {
            require_pins: switch(self.require_pins, self.no_require_pins, config.check.require_pins),
            allow_duplicates: switch(
                self.allow_duplicates,
                self.no_allow_duplicates,
                config.check.allow_duplicates,
            ),
        }
    }

    /// Execute the check command
    pub fn run(&self, config: &ReqmConfig) -> Result<i32> {
        let loaded = load_manifest(&self.file, self.follow_includes)?;
        let manifest = &loaded.manifest;
        let report = ManifestValidator::validate(manifest, &self.policy(config));
        let clean = report.is_clean(self.strict);

        let response = CheckResponse {
            source: manifest.source.clone(),
            clean,
            packages: manifest.all_requirements().len(),
            errors: report.errors().count(),
            warnings: report.warnings().count(),
            diagnostics: report.sorted().diagnostics,
        };

        if self.json {
            print_json(&response)?;
        } else {
            for diagnostic in &response.diagnostics {
                println!("{diagnostic}");
            }
            if response.diagnostics.is_empty() {
                println!("✓ {}: {} packages, no problems found", response.source, response.packages);
            } else {
                println!(
                    "{} {}: {} packages, {} error(s), {} warning(s)",
                    if clean { "✓" } else { "✗" },
                    response.source,
                    response.packages,
                    response.errors,
                    response.warnings
                );
            }
        }

        Ok(if clean { EXIT_OK } else { EXIT_FINDINGS })
    }
}

fn switch(on: bool, off: bool, configured: bool) -> bool {
    match (on, off) {
        (true, _) => true,
        (_, true) => false,
        _ => configured,
    }
}
