//! Renderer error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the streaming renderer.
///
/// Malformed markup never produces an error; only sink failures and bad
/// configuration do.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The sink refused output. Emission stops at the failing line.
    #[error("Sink error: {0}")]
    Sink(#[from] io::Error),

    /// Invalid renderer configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<ConfigError> for RenderError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Errors loading or validating a [`RenderConfig`](crate::RenderConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The config text is not valid TOML for this schema.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field holds an unusable value.
    #[error("Invalid value for '{field}': {message}")]
    Invalid { field: &'static str, message: String },
}

impl ConfigError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

/// Result type for renderer operations.
pub type Result<T> = std::result::Result<T, RenderError>;
