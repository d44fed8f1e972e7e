// Structural checks over parsed manifests

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::diagnostic::{Diagnostic, DiagnosticCode, Report, Severity};
use crate::models::manifest::Manifest;

/// Knobs controlling which findings are raised and how severe they are
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckPolicy {
    /// Warn about requirements without any version constraint
    pub require_pins: bool,
    /// Report duplicate identifiers as warnings instead of errors
    pub allow_duplicates: bool,
}

/// Validator for manifest invariants
pub struct ManifestValidator;

impl ManifestValidator {
    /// Run every check against `manifest` and any includes it has loaded
    pub fn validate(manifest: &Manifest, policy: &CheckPolicy) -> Report {
        let mut report = Report::default();
        Self::check_invalid_lines(manifest, &mut report);
        Self::check_duplicates(manifest, policy, &mut report);
        if policy.require_pins {
            Self::check_pins(manifest, &mut report);
        }
        if manifest.is_empty() {
            report.push(Diagnostic {
                severity: Severity::Warning,
                code: DiagnosticCode::EmptyManifest,
                source: manifest.source.clone(),
                line: None,
                message: "manifest does not list any packages".to_string(),
            });
        }
        report
    }

    fn check_invalid_lines(manifest: &Manifest, report: &mut Report) {
        for (line, raw, reason) in manifest.invalid_lines() {
            report.push(Diagnostic {
                severity: Severity::Error,
                code: DiagnosticCode::InvalidRequirement,
                source: manifest.source.clone(),
                line: Some(line),
                message: format!("'{raw}': {reason}"),
            });
        }
        for included in &manifest.includes {
            Self::check_invalid_lines(included, report);
        }
    }

    fn check_duplicates(manifest: &Manifest, policy: &CheckPolicy, report: &mut Report) {
        let severity = if policy.allow_duplicates {
            Severity::Warning
        } else {
            Severity::Error
        };

        let mut first_seen: HashMap<&str, (&str, usize)> = HashMap::new();
        for entry in manifest.all_requirements() {
            let requirement = entry.requirement;
            match first_seen.get(requirement.name.normalized.as_str()) {
                Some((first_source, first_line)) => {
                    let location = if *first_source == entry.source {
                        format!("line {first_line}")
                    } else {
                        format!("{first_source}:{first_line}")
                    };
                    report.push(Diagnostic {
                        severity,
                        code: DiagnosticCode::DuplicatePackage,
                        source: entry.source.to_string(),
                        line: Some(requirement.line),
                        message: format!(
                            "'{}' duplicates the requirement on {location}",
                            requirement.name
                        ),
                    });
                }
                None => {
                    first_seen.insert(&requirement.name.normalized, (entry.source, requirement.line));
                }
            }
        }
    }

    fn check_pins(manifest: &Manifest, report: &mut Report) {
        for entry in manifest.all_requirements() {
            if entry.requirement.is_unpinned() {
                report.push(Diagnostic {
                    severity: Severity::Warning,
                    code: DiagnosticCode::Unpinned,
                    source: entry.source.to_string(),
                    line: Some(entry.requirement.line),
                    message: format!("'{}' has no version constraint", entry.requirement.name),
                });
            }
        }
    }
}
