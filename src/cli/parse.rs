use std::path::PathBuf;

use clap::Args;
use serde::{Deserialize, Serialize};

use crate::cli::{load_manifest, print_json};
use crate::models::manifest::Manifest;
use crate::utils::config::{ReqmConfig, DEFAULT_MANIFEST};
use crate::utils::error::{Result, EXIT_OK};

/// List the package identifiers of a manifest
#[derive(Debug, Args)]
pub struct ParseCommand {
    /// Manifest to read (`-` for stdin)
    #[arg(default_value = DEFAULT_MANIFEST)]
    pub file: PathBuf,

    /// Also read files named by `-r` lines
    #[arg(long)]
    pub follow_includes: bool,

    /// Output JSON instead of one identifier per line
    #[arg(long)]
    pub json: bool,
}

/// One requirement in the JSON response
#[derive(Debug, Serialize, Deserialize)]
pub struct RequirementEntry {
    pub name: String,
    pub normalized_name: String,
    pub source: String,
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub specifier: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extras: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A line that could not be parsed
#[derive(Debug, Serialize, Deserialize)]
pub struct InvalidEntry {
    pub source: String,
    pub line: usize,
    pub text: String,
    pub reason: String,
}

/// JSON response format for the parse command
#[derive(Debug, Serialize, Deserialize)]
pub struct ParseResponse {
    pub source: String,
    pub packages: Vec<String>,
    pub requirements: Vec<RequirementEntry>,
    pub invalid: Vec<InvalidEntry>,
}

impl ParseResponse {
    pub fn from_manifest(manifest: &Manifest) -> Self {
        let requirements = manifest
            .all_requirements()
            .into_iter()
            .map(|entry| {
                let req = entry.requirement;
                RequirementEntry {
                    name: req.name.raw.clone(),
                    normalized_name: req.name.normalized.clone(),
                    source: entry.source.to_string(),
                    line: req.line,
                    section: req.section.clone(),
                    specifier: req.specifier_text(),
                    extras: req.extras.clone(),
                    marker: req.marker.clone(),
                    url: req.url.clone(),
                }
            })
            .collect();

        let mut invalid = Vec::new();
        collect_invalid(manifest, &mut invalid);

        Self {
            source: manifest.source.clone(),
            packages: manifest.package_names(),
            requirements,
            invalid,
        }
    }
}

fn collect_invalid(manifest: &Manifest, out: &mut Vec<InvalidEntry>) {
    out.extend(manifest.invalid_lines().map(|(line, text, reason)| InvalidEntry {
        source: manifest.source.clone(),
        line,
        text: text.to_string(),
        reason: reason.to_string(),
    }));
    for included in &manifest.includes {
        collect_invalid(included, out);
    }
}

impl ParseCommand {
    /// Execute the parse command
    pub fn run(&self, _config: &ReqmConfig) -> Result<i32> {
        let loaded = load_manifest(&self.file, self.follow_includes)?;
        let response = ParseResponse::from_manifest(&loaded.manifest);

        if !response.invalid.is_empty() {
            log::warn!(
                "{} line(s) in {} could not be parsed; run `reqm check` for details",
                response.invalid.len(),
                response.source
            );
        }

        if self.json {
            print_json(&response)?;
        } else {
            for name in &response.packages {
                println!("{name}");
            }
        }

        Ok(EXIT_OK)
    }
}
