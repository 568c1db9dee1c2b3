//! Error types for configuration loading and validation.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    // Discovery errors
    #[error("project config not found in {}\n\nHint: create a wpdev.project.toml at the project root", .0.display())]
    ProjectNotFound(PathBuf),

    #[error("server config not found in {}\n\nHint: create a wpdev.server.toml (keep it out of version control)", .0.display())]
    ServerNotFound(PathBuf),

    // Parsing errors
    #[error("invalid TOML in {path}: {message}")]
    InvalidToml { path: PathBuf, message: String },

    // Validation errors
    #[error("missing required field: {field}\n\nHint: {hint}")]
    MissingField { field: String, hint: String },

    #[error("invalid value for '{field}': {value}\n\nHint: {hint}")]
    InvalidValue {
        field: String,
        value: String,
        hint: String,
    },

    #[error("no entry points specified")]
    NoEntries,

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
