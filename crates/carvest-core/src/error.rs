//! Core error types shared by the carvest crates.

use thiserror::Error;

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// I/O error reading config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Errors raised while decoding listing records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// The record has no `URL` field, so it cannot be deduplicated
    #[error("record is missing the URL field")]
    MissingUrl,

    /// The `URL` field is present but empty
    #[error("record has an empty URL field")]
    EmptyUrl,
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
