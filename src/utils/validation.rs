// Common validation utilities for package identifiers

use crate::utils::error::{ReqmError, Result};
use regex::Regex;
use std::sync::LazyLock;

// PEP 508 distribution name
static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)([a-z0-9]|[a-z0-9][a-z0-9._-]*[a-z0-9])$").expect("package name pattern compiles")
});

static EXTRA_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)[a-z0-9]([a-z0-9._-]*[a-z0-9])?$").expect("extra name pattern compiles")
});

/// Whether `name` is a syntactically valid package identifier
pub fn is_valid_package_name(name: &str) -> bool {
    NAME_PATTERN.is_match(name)
}

/// Validate package name format according to PEP 508
pub fn validate_package_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ReqmError::ValidationError(
            "Package name cannot be empty".to_string(),
        ));
    }

    if name.chars().any(char::is_whitespace) {
        return Err(ReqmError::ValidationError(format!(
            "Invalid package name '{name}' - cannot contain whitespace.\n\nValid package names:\n  ✓ numpy\n  ✓ opencv-python\n  ✗ opencv python"
        )));
    }

    if !is_valid_package_name(name) {
        return Err(ReqmError::ValidationError(format!(
            "Invalid package name '{name}' - must start and end with a letter or digit and contain only letters, digits, '-', '_' or '.'"
        )));
    }

    Ok(())
}

/// Validate the name of an extra (`pkg[extra]`)
pub fn validate_extra_name(extra: &str) -> Result<()> {
    if EXTRA_PATTERN.is_match(extra) {
        Ok(())
    } else {
        Err(ReqmError::ValidationError(format!("Invalid extra name '{extra}'")))
    }
}

/// Normalize a package name (PEP 503): lowercase, and runs of `-`, `_`, `.`
/// collapsed to a single `-`
pub fn normalize_package_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut in_separator = false;
    for c in name.chars() {
        if matches!(c, '-' | '_' | '.') {
            if !in_separator {
                normalized.push('-');
                in_separator = true;
            }
        } else {
            normalized.push(c.to_ascii_lowercase());
            in_separator = false;
        }
    }
    normalized
}

/// Validate a version string used inside a specifier
pub fn validate_version_text(version: &str) -> Result<()> {
    if version.is_empty() {
        return Err(ReqmError::ValidationError(
            "Version cannot be empty.\n\nValid version formats:\n  ✓ 1.0.0\n  ✓ 2.*\n  ✓ 1.0rc1".to_string(),
        ));
    }

    if !version
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '*' | '+' | '!' | '-' | '_'))
    {
        return Err(ReqmError::ValidationError(format!(
            "Invalid version '{version}' - contains characters not allowed in a version"
        )));
    }

    Ok(())
}
