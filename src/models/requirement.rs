use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::models::version::{Version, VersionSpecifier};
use crate::utils::validation::normalize_package_name;

/// A package identifier as written in the manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageName {
    /// Name exactly as it appears in the manifest
    pub raw: String,
    /// PEP 503 normalized name, used for comparisons
    pub normalized: String,
}

impl PackageName {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let normalized = normalize_package_name(&raw);
        Self { raw, normalized }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl PartialEq for PackageName {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

impl Eq for PackageName {}

impl Hash for PackageName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized.hash(state);
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// One package requirement line of a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    /// Package identifier
    pub name: PackageName,
    /// Optional extras (`pkg[extra1,extra2]`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extras: Vec<String>,
    /// Version clauses; empty means "any version"
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub specifiers: Vec<VersionSpecifier>,
    /// Environment marker after `;`, kept verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
    /// Direct reference (`pkg @ https://...`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// 1-based line number in the source manifest
    pub line: usize,
    /// Most recent comment header above this requirement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

impl Requirement {
    /// Create an unconstrained requirement
    pub fn new(name: impl Into<String>, line: usize) -> Self {
        Self {
            name: PackageName::new(name),
            extras: Vec::new(),
            specifiers: Vec::new(),
            marker: None,
            url: None,
            line,
            section: None,
        }
    }

    /// Whether the requirement carries no version constraint at all
    pub fn is_unpinned(&self) -> bool {
        self.specifiers.is_empty() && self.url.is_none()
    }

    /// Exact version pinned with `==` or `===`, if any
    pub fn pinned_version(&self) -> Option<&str> {
        self.specifiers
            .iter()
            .find(|s| s.is_exact())
            .map(|s| s.version.as_str())
    }

    /// Check whether a concrete version satisfies every clause
    pub fn accepts(&self, version: &Version) -> bool {
        self.specifiers.iter().all(|s| s.contains(version))
    }

    /// Comma-joined specifier text (`>=1.0,<2`)
    pub fn specifier_text(&self) -> String {
        self.specifiers
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Render this requirement pinned to `version`, keeping extras and marker
    pub fn pinned_to(&self, version: &str) -> String {
        let mut out = self.name_with_extras();
        out.push_str("==");
        out.push_str(version);
        self.push_marker(&mut out);
        out
    }

    fn name_with_extras(&self) -> String {
        if self.extras.is_empty() {
            self.name.raw.clone()
        } else {
            format!("{}[{}]", self.name.raw, self.extras.join(","))
        }
    }

    fn push_marker(&self, out: &mut String) {
        if let Some(marker) = &self.marker {
            // a URL must be followed by whitespace before the marker
            out.push_str(if self.url.is_some() { " ; " } else { "; " });
            out.push_str(marker);
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = self.name_with_extras();
        if let Some(url) = &self.url {
            out.push_str(" @ ");
            out.push_str(url);
        } else {
            out.push_str(&self.specifier_text());
        }
        self.push_marker(&mut out);
        f.write_str(&out)
    }
}
