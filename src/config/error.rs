//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Dropout must lie in `[0, 1)`.
    #[error("invalid dropout {value}: must be in [0, 1)")]
    InvalidDropout { value: f32 },

    /// Sampling temperature must be positive and finite.
    #[error("invalid sample temperature {value}: must be positive and finite")]
    InvalidTemperature { value: f64 },

    /// Adapter rank must be non-zero when adapters are enabled.
    #[error("invalid adapter rank {value}: must be greater than zero")]
    InvalidAdapterRank { value: usize },

    #[error("adapter scope name cannot be empty when adapters are enabled")]
    EmptyAdapterScope,

    /// An environment variable held a value that could not be parsed.
    #[error("invalid value '{value}' for environment variable {name}")]
    InvalidEnvValue { name: &'static str, value: String },

    /// Specified path does not exist on the filesystem.
    #[error("path does not exist: {path}")]
    PathNotFound { path: PathBuf },

    #[error("failed to read config file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
