use std::path::PathBuf;
use thiserror::Error;

use crate::backbone::BackboneError;
use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("weights not found at path: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to load weights: {reason}")]
    WeightLoad { reason: String },

    #[error("failed to save weights: {reason}")]
    WeightSave { reason: String },

    #[error("invalid scorer configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("backbone error: {0}")]
    Backbone(#[from] BackboneError),

    #[error("scoring computation failed: {reason}")]
    ComputationFailed { reason: String },
}

impl ScoringError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        ScoringError::InvalidArgument {
            reason: reason.into(),
        }
    }
}

impl From<candle_core::Error> for ScoringError {
    fn from(err: candle_core::Error) -> Self {
        ScoringError::ComputationFailed {
            reason: err.to_string(),
        }
    }
}
