// Common error types for reqm

use std::path::PathBuf;

/// Errors surfaced by the library
#[derive(Debug, thiserror::Error)]
pub enum ReqmError {
    #[error("IO error on {}: {source}", path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Include error: {0}")]
    IncludeError(String),

    #[error("Network error: {0}")]
    NetworkError(String),
}

impl ReqmError {
    /// Wrap an I/O error with the path that caused it
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReqmError>;

/// Exit code for a successful run
pub const EXIT_OK: i32 = 0;
/// Exit code when `check` or `fmt --check` finds problems
pub const EXIT_FINDINGS: i32 = 1;
/// Exit code for configuration and usage errors
pub const EXIT_CONFIG: i32 = 2;
/// Exit code for filesystem errors
pub const EXIT_IO: i32 = 3;
/// Exit code for package index failures
pub const EXIT_NETWORK: i32 = 4;

/// User-facing rendering of a `ReqmError`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserError {
    pub message: String,
    pub hint: Option<String>,
    pub exit_code: i32,
}

impl UserError {
    pub fn from_reqm_error(err: &ReqmError) -> Self {
        match err {
            ReqmError::IoError { path, source } if source.kind() == std::io::ErrorKind::NotFound => Self {
                message: format!("File not found: {}", path.display()),
                hint: Some("Pass the manifest path explicitly, e.g. `reqm check requirements.txt`".to_string()),
                exit_code: EXIT_IO,
            },
            ReqmError::IoError { .. } => Self {
                message: err.to_string(),
                hint: None,
                exit_code: EXIT_IO,
            },
            ReqmError::ConfigError(_) => Self {
                message: err.to_string(),
                hint: Some("Check reqm.toml or the file given with --config".to_string()),
                exit_code: EXIT_CONFIG,
            },
            ReqmError::ValidationError(_) | ReqmError::ParseError(_) | ReqmError::IncludeError(_) => Self {
                message: err.to_string(),
                hint: None,
                exit_code: EXIT_CONFIG,
            },
            ReqmError::NetworkError(_) => Self {
                message: err.to_string(),
                hint: Some("Use --index-url or REQM_INDEX_URL to point at a reachable index".to_string()),
                exit_code: EXIT_NETWORK,
            },
        }
    }

    /// Print the error (and hint) to stderr
    pub fn print(&self) {
        eprintln!("Error: {}", self.message);
        if let Some(hint) = &self.hint {
            eprintln!("\n{hint}");
        }
    }
}
