// Shared utilities
pub mod config;
pub mod error;
pub mod fs_utils;
pub mod lock_file;
pub mod validation;
