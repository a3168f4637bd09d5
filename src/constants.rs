//! Cross-cutting, shared constants.
//!
//! Configuration defaults live here so that [`ScorerConfig`](crate::config::ScorerConfig),
//! the scorer and the tests agree on a single value.

/// Dropout applied to the scorer's private backbone copy.
pub const DEFAULT_DROPOUT: f32 = 0.1;

/// Number of output bins. `0` (or `1`) selects the regression head.
pub const DEFAULT_NUM_BINS: usize = 0;

/// Whether a private adapter scope is registered by default.
pub const DEFAULT_USE_ADAPTER: bool = true;

/// Rank of the private adapter scope.
pub const DEFAULT_ADAPTER_RANK: usize = 8;

/// Name of the private adapter scope.
pub const DEFAULT_ADAPTER_SCOPE: &str = "reward";

/// Temperature used when sampling from the binned head.
pub const DEFAULT_SAMPLE_TEMPERATURE: f64 = 1.0;

/// Lower bound applied to the sampling temperature before dividing logits.
pub const MIN_SAMPLE_TEMPERATURE: f64 = 1e-10;

/// Floor applied inside the logarithms of the Gumbel noise.
pub const GUMBEL_EPS: f64 = 1e-20;

/// Parameter-name prefix of the backbone inside the scorer's named state.
pub const BACKBONE_PREFIX: &str = "backbone";

/// Parameter name of the prompt segment embedding.
pub const PROMPT_EMBED_NAME: &str = "prompt_embed";

/// Parameter name of the response segment embedding.
pub const RESPONSE_EMBED_NAME: &str = "response_embed";

/// Parameter-name prefix of the output head.
pub const OUTPUT_HEAD_PREFIX: &str = "to_pred";

/// Returns `true` when `num_bins` selects the classification head.
pub fn is_binned(num_bins: usize) -> bool {
    num_bins > 1
}
