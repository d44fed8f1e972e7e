// Services module for business logic
pub mod formatter;
pub mod manifest_loader;
pub mod manifest_parser;
pub mod manifest_validator;
pub mod pypi_client;
pub mod resolver;
