use std::path::PathBuf;

use clap::Args;
use serde::{Deserialize, Serialize};

use crate::cli::{load_manifest, print_json};
use crate::services::pypi_client::PypiClient;
use crate::services::resolver::{Resolution, Resolver};
use crate::utils::config::{ConfigParser, IndexConfig, ReqmConfig, DEFAULT_MANIFEST};
use crate::utils::error::{ReqmError, Result, EXIT_NETWORK, EXIT_OK};
use crate::utils::fs_utils::write_atomic;
use crate::utils::lock_file::{render_pinned, LockFileManager};

/// Resolve versions against a package index
#[derive(Debug, Args)]
pub struct ResolveCommand {
    /// Manifest to resolve (`-` for stdin)
    #[arg(default_value = DEFAULT_MANIFEST)]
    pub file: PathBuf,

    /// Base URL of a PyPI-compatible index (overrides index.url)
    #[arg(long, env = "REQM_INDEX_URL")]
    pub index_url: Option<String>,

    /// Maximum concurrent index requests (overrides index.concurrency)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Write a JSON lock file to this path
    #[arg(long)]
    pub lock: Option<PathBuf>,

    /// Write the manifest with every package pinned to this path
    #[arg(long)]
    pub pinned: Option<PathBuf>,

    /// Also resolve files named by `-r` lines
    #[arg(long)]
    pub follow_includes: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// JSON response format for the resolve command
#[derive(Debug, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub index_url: String,
    pub complete: bool,
    #[serde(flatten)]
    pub resolution: Resolution,
}

impl ResolveCommand {
    /// Index settings from configuration with command-line overrides applied
    pub fn index_config(&self, config: &ReqmConfig) -> Result<IndexConfig> {
        let mut effective = config.clone();
        if let Some(url) = &self.index_url {
            effective.index.url = url.clone();
        }
        if let Some(concurrency) = self.concurrency {
            effective.index.concurrency = concurrency;
        }
        ConfigParser::validate(&effective)?;
        Ok(effective.index)
    }

    /// Execute the resolve command
    pub async fn run(&self, config: &ReqmConfig) -> Result<i32> {
        let index = self.index_config(config)?;
        let loaded = load_manifest(&self.file, self.follow_includes)?;
        let manifest = &loaded.manifest;

        let client = PypiClient::from_config(&index)
            .map_err(|e| ReqmError::NetworkError(format!("Failed to create HTTP client: {e}")))?;
        log::info!("resolving {} against {}", manifest.source, client.registry_url());

        let resolution = Resolver::new(client, index.concurrency).resolve(manifest).await;
        let complete = resolution.is_complete();

        if complete {
            if let Some(path) = &self.lock {
                let lock_file = LockFileManager::generate(&loaded.text, &index.url, &resolution)?;
                let manager = LockFileManager::with_path(path);
                manager.save(&lock_file)?;
                log::info!("wrote lock file {}", manager.path().display());
            }
            if let Some(path) = &self.pinned {
                write_atomic(path, &render_pinned(manifest, &resolution))?;
                log::info!("wrote pinned manifest {}", path.display());
            }
        } else if self.lock.is_some() || self.pinned.is_some() {
            log::warn!("resolution incomplete; no lock or pinned file written");
        }

        if self.json {
            print_json(&ResolveResponse {
                index_url: index.url,
                complete,
                resolution,
            })?;
        } else {
            let mut printed = Vec::new();
            for package in &resolution.resolved {
                let name = &package.requirement.name;
                if printed.contains(&name.normalized) {
                    continue;
                }
                printed.push(name.normalized.clone());
                println!("{}=={}", name.raw, package.version);
            }
            for url in &resolution.skipped {
                eprintln!("skipped {url}: direct URL reference");
            }
            for failure in &resolution.failures {
                eprintln!(
                    "{}:{}: failed to resolve {}: {}",
                    failure.source, failure.line, failure.name, failure.reason
                );
            }
        }

        Ok(if complete { EXIT_OK } else { EXIT_NETWORK })
    }
}
