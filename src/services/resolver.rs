use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::models::manifest::Manifest;
use crate::models::requirement::Requirement;
use crate::models::version::{select_best, Version, VersionSpecifier};
use crate::services::pypi_client::PypiClient;

/// A requirement together with the version chosen for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPackage {
    pub source: String,
    pub requirement: Requirement,
    pub version: String,
}

/// A requirement that could not be resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionFailure {
    pub source: String,
    pub name: String,
    pub line: usize,
    pub reason: String,
}

/// Outcome of resolving a manifest, in manifest order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub resolved: Vec<ResolvedPackage>,
    pub failures: Vec<ResolutionFailure>,
    /// Direct URL references, which are not looked up on the index
    pub skipped: Vec<String>,
}

impl Resolution {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Resolved version for a package, by any spelling of its name
    pub fn version_of(&self, name: &str) -> Option<&str> {
        let normalized = crate::utils::validation::normalize_package_name(name);
        self.resolved
            .iter()
            .find(|p| p.requirement.name.normalized == normalized)
            .map(|p| p.version.as_str())
    }
}

type Lookup = Result<Vec<Version>, String>;

/// Resolves manifest requirements against a package index
#[derive(Debug, Clone)]
pub struct Resolver {
    client: PypiClient,
    concurrency: usize,
}

impl Resolver {
    pub fn new(client: PypiClient, concurrency: usize) -> Self {
        Self {
            client,
            concurrency: concurrency.max(1),
        }
    }

    /// Pick a version for every requirement of `manifest` (includes too).
    ///
    /// Each distinct package is fetched once; at most `concurrency` requests
    /// are in flight. A failed lookup only fails the requirements naming
    /// that package. A package named on several lines gets one version
    /// satisfying the specifiers of every line. Lines that did not parse
    /// are failures.
    pub async fn resolve(&self, manifest: &Manifest) -> Resolution {
        let entries = manifest.all_requirements();

        let mut unique: Vec<&str> = Vec::new();
        let mut index_of: HashMap<&str, usize> = HashMap::new();
        let mut combined: HashMap<&str, Vec<VersionSpecifier>> = HashMap::new();
        for entry in entries.iter().filter(|e| e.requirement.url.is_none()) {
            let name = &entry.requirement.name;
            if !index_of.contains_key(name.normalized.as_str()) {
                index_of.insert(&name.normalized, unique.len());
                unique.push(&name.raw);
            }
            let specifiers = combined.entry(name.normalized.as_str()).or_default();
            for specifier in &entry.requirement.specifiers {
                if !specifiers.contains(specifier) {
                    specifiers.push(specifier.clone());
                }
            }
        }

        let lookups = self.fetch_all(&unique).await;

        let mut resolution = Resolution::default();
        for entry in entries {
            let requirement = entry.requirement;
            if let Some(url) = &requirement.url {
                resolution.skipped.push(format!("{} @ {url}", requirement.name));
                continue;
            }

            let failure = |reason: String| ResolutionFailure {
                source: entry.source.to_string(),
                name: requirement.name.raw.clone(),
                line: requirement.line,
                reason,
            };

            let lookup = index_of
                .get(requirement.name.normalized.as_str())
                .and_then(|idx| lookups[*idx].as_ref());
            let specifiers = combined
                .get(requirement.name.normalized.as_str())
                .map_or(requirement.specifiers.as_slice(), Vec::as_slice);
            match lookup {
                Some(Ok(versions)) => match select_best(specifiers, versions) {
                    Some(version) => {
                        log::debug!("{} -> {version}", requirement.name);
                        resolution.resolved.push(ResolvedPackage {
                            source: entry.source.to_string(),
                            requirement: requirement.clone(),
                            version: version.to_string(),
                        });
                    }
                    None if versions.is_empty() => {
                        resolution.failures.push(failure("index lists no installable versions".to_string()));
                    }
                    None => {
                        let wanted = specifiers.iter().map(ToString::to_string).collect::<Vec<_>>().join(",");
                        resolution
                            .failures
                            .push(failure(format!("no available version satisfies '{wanted}'")));
                    }
                },
                Some(Err(reason)) => resolution.failures.push(failure(reason.clone())),
                None => resolution.failures.push(failure("lookup did not complete".to_string())),
            }
        }

        for (source, line, raw, reason) in manifest.all_invalid_lines() {
            resolution.failures.push(ResolutionFailure {
                source: source.to_string(),
                name: raw.to_string(),
                line,
                reason: format!("unparseable line: {reason}"),
            });
        }

        for failed in &resolution.failures {
            log::warn!("could not resolve {}: {}", failed.name, failed.reason);
        }
        resolution
    }

    async fn fetch_all(&self, names: &[&str]) -> Vec<Option<Lookup>> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut join_set = JoinSet::new();

        for (idx, name) in names.iter().enumerate() {
            let client = self.client.clone();
            let semaphore = Arc::clone(&semaphore);
            let name = (*name).to_string();

            join_set.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (idx, Err("resolver shut down".to_string()));
                };
                let lookup = client
                    .get_available_versions(&name)
                    .await
                    .map_err(|e| e.to_string());
                (idx, lookup)
            });
        }

        let mut lookups: Vec<Option<Lookup>> = vec![None; names.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, lookup)) => lookups[idx] = Some(lookup),
                Err(e) => log::warn!("index lookup task failed: {e}"),
            }
        }
        lookups
    }
}
