// Models module for data structures
pub mod diagnostic;
pub mod lock_file;
pub mod manifest;
pub mod requirement;
pub mod version;
