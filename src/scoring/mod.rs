//! Reward scoring over a backbone's per-token embeddings.
//!
//! One [`RewardScorer::score`] call runs:
//!
//! 1. prompt mask resolution ([`segment`]): an explicit mask, one derived from
//!    prompt lengths, or none;
//! 2. segment embedding injection: prompt positions get the prompt vector,
//!    the rest the response vector, summed into the backbone's input;
//! 3. backbone embedding with the scorer's adapter scope;
//! 4. masked mean pooling ([`pooling`]);
//! 5. the output head ([`head`]), then sampling ([`sampling`]), raw output, or
//!    a loss against labels.
//!
//! # Sampling and labels
//!
//! A binned scorer samples by default. Sampling and supervised loss are
//! mutually exclusive per call, so training a binned scorer needs
//! `sample_from_bins = false` in its [`ScorerConfig`](crate::config::ScorerConfig).

pub mod error;
pub mod head;
pub mod persistence;
pub mod pooling;
pub mod sampling;
pub mod scorer;
pub mod segment;
pub mod types;


pub use error::ScoringError;
pub use head::OutputHead;
pub use pooling::masked_mean;
pub use sampling::{ArgMaxSampler, BinSampler, GumbelSampler};
pub use scorer::RewardScorer;
pub use segment::{derive_prompt_mask, segment_embedding};
pub use types::{ScoreOutput, ScoreRequest};
