//! Error types shared across the core crate.

use std::path::PathBuf;

/// Result alias using the crate [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration:\n  {}", .0.join("\n  "))]
    ConfigValidation(Vec<String>),

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("icon theme catalog unavailable: {0}")]
    Catalog(String),
}
