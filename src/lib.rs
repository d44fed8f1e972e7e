// reqm - requirements manifest tool
// Core library functionality

pub mod cli;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use models::manifest::Manifest;
pub use models::requirement::Requirement;
pub use services::manifest_parser::ManifestParser;
pub use utils::error::{ReqmError, Result};
