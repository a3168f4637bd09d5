use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackboneError {
    #[error("adapter scope not registered: {name}")]
    UnknownAdapterScope { name: String },

    #[error("adapter scope already registered: {name}")]
    DuplicateAdapterScope { name: String },

    #[error("invalid adapter rank {rank} for scope {name}")]
    InvalidRank { name: String, rank: usize },

    #[error("invalid backbone input: {reason}")]
    InvalidInput { reason: String },

    #[error("backbone computation failed: {reason}")]
    ComputationFailed { reason: String },
}

impl From<candle_core::Error> for BackboneError {
    fn from(err: candle_core::Error) -> Self {
        BackboneError::ComputationFailed {
            reason: err.to_string(),
        }
    }
}
