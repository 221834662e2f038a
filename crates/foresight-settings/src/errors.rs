//! Settings error types.

use thiserror::Error;

/// Result alias for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

/// Failures while loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file or an override value could not be parsed.
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    /// An environment override carried an unusable value.
    #[error("invalid value for {variable}: {value}")]
    InvalidOverride {
        /// The environment variable name.
        variable: String,
        /// The rejected value.
        value: String,
    },
}
