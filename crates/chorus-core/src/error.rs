//! Error types for Chorus Core.
//!
//! Only startup can fail. A turn never errors: rejections and remote
//! failures are part of [`TurnOutcome`](crate::TurnOutcome).

use thiserror::Error;

/// Core error type for configuration and startup.
#[derive(Debug, Error)]
pub enum ChorusError {
    /// A configuration value is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The provider credential is not set.
    #[error("API credential not found: set the {0} environment variable")]
    MissingCredential(String),

    /// The configuration file could not be read.
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML for [`ChorusConfig`](crate::ChorusConfig).
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}
