//! Error types for configuration loading and validation.

use thiserror::Error;

/// Errors produced while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Figment failed to merge or deserialize one of the configuration
    /// sources.
    #[error("failed to load configuration: {0}")]
    Load(#[from] figment::Error),

    /// A loaded value failed a validation rule.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// An I/O error occurred while resolving the Hybridclaw home directory.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
