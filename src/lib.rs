//! Reward scoring head for a pretrained sequence model.
//!
//! # Public API Surface
//!
//! ## Scoring
//! - [`RewardScorer`] - segment-aware pooling head over a private backbone copy
//! - [`ScoreRequest`], [`ScoreOutput`] - per-call inputs and results
//! - [`OutputHead`] - regression or binned classification head
//! - [`BinSampler`], [`GumbelSampler`], [`ArgMaxSampler`] - sampling from bins
//!
//! ## Backbone
//! - [`Backbone`], [`EmbedOptions`] - the interface the scorer relies on
//! - [`select_device`] - compute device selection
//!
//! ## Configuration & Parameters
//! - [`ScorerConfig`], [`ConfigError`] - construction settings
//! - [`ParameterSet`] - named trainable variables handed to optimizers
//!
//! ## Test/Mock Support
//! [`MockBackbone`](backbone::MockBackbone) is available behind
//! `#[cfg(any(test, feature = "mock"))]`.

pub mod backbone;
pub mod config;
pub mod constants;
pub mod params;
pub mod scoring;

pub use backbone::{Backbone, BackboneError, EmbedOptions, select_device};
#[cfg(any(test, feature = "mock"))]
pub use backbone::{MockBackbone, MockBackboneConfig};
pub use config::{ConfigError, ScorerConfig};
pub use params::ParameterSet;
pub use scoring::{
    ArgMaxSampler, BinSampler, GumbelSampler, OutputHead, RewardScorer, ScoreOutput,
    ScoreRequest, ScoringError, derive_prompt_mask, masked_mean, segment_embedding,
};
