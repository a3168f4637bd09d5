//! The backbone sequence model, seen from the scorer's side.
//!
//! The scorer never reaches into a backbone's layers. Everything it needs is
//! on the [`Backbone`] trait: per-token embeddings with an optional additive
//! input embedding, named low-rank adapter scopes, parameter enumeration,
//! dropout control and an explicit deep copy.
//!
//! - [`device`] picks the compute device for a backbone.
//! - [`MockBackbone`] is a small trainable backbone for tests (`mock` feature).

/// Device selection (CPU / Metal / CUDA).
pub mod device;
mod error;
#[cfg(any(test, feature = "mock"))]
mod mock;


pub use device::{device_label, select_device};
pub use error::BackboneError;
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockBackbone, MockBackboneConfig};

use candle_core::{DType, Device, Tensor};

use crate::params::ParameterSet;

/// Per-call options for [`Backbone::embed`].
#[derive(Debug, Clone, Copy)]
pub struct EmbedOptions<'a> {
    /// Additive embedding `[batch, seq, dim]` summed into the token embeddings.
    pub extra_embed: Option<&'a Tensor>,
    /// Return the final hidden states instead of logits.
    pub embedding_only: bool,
    /// Skip every adapter for this call, including the active scope.
    pub disable_adapters: bool,
    /// Adapter scope whose low-rank update is applied.
    pub adapter_scope: Option<&'a str>,
    /// Enables dropout.
    pub train: bool,
}

impl Default for EmbedOptions<'_> {
    fn default() -> Self {
        Self {
            extra_embed: None,
            embedding_only: true,
            disable_adapters: false,
            adapter_scope: None,
            train: false,
        }
    }
}

impl<'a> EmbedOptions<'a> {
    pub fn with_extra_embed(mut self, extra_embed: Option<&'a Tensor>) -> Self {
        self.extra_embed = extra_embed;
        self
    }

    pub fn with_adapter_scope(mut self, scope: Option<&'a str>) -> Self {
        self.adapter_scope = scope;
        self
    }

    pub fn with_disable_adapters(mut self, disable: bool) -> Self {
        self.disable_adapters = disable;
        self
    }

    pub fn with_train(mut self, train: bool) -> Self {
        self.train = train;
        self
    }
}

/// A pretrained sequence model the reward scorer is layered on.
///
/// Implementations own their weights as [`candle_core::Var`]s so that an
/// optimizer handed a [`ParameterSet`] can update them in place.
pub trait Backbone {
    /// Width of the per-token embeddings.
    fn dim(&self) -> usize;

    /// Device holding the backbone's weights.
    fn device(&self) -> &Device;

    /// Dtype of the backbone's weights and embeddings. Scorer-owned
    /// parameters are created with the same dtype.
    fn dtype(&self) -> DType;

    /// Runs the model over `tokens` (`[batch, seq]`, integer ids).
    ///
    /// With `embedding_only` the result is `[batch, seq, dim]`.
    fn embed(&self, tokens: &Tensor, options: EmbedOptions<'_>) -> Result<Tensor, BackboneError>;

    /// Adds a named low-rank adapter scope. Base weights are left untouched.
    fn register_adapter_scope(&mut self, name: &str, rank: usize) -> Result<(), BackboneError>;

    /// Trainable parameters of one adapter scope.
    fn adapter_parameters(&self, name: &str) -> Result<ParameterSet, BackboneError>;

    /// Every parameter: base weights plus all registered adapter scopes.
    fn all_parameters(&self) -> ParameterSet;

    fn set_dropout(&mut self, rate: f32);

    /// Copies the backbone into fresh storage. Updating the copy's variables
    /// must never be visible through `self`.
    fn deep_clone(&self) -> Result<Self, BackboneError>
    where
        Self: Sized;
}
