//! Sampling a bin index from classification logits.
//!
//! Randomness lives only behind [`BinSampler`], so tests can swap the
//! Gumbel-max sampler for the deterministic [`ArgMaxSampler`].

use candle_core::{D, Tensor};

use crate::constants::{GUMBEL_EPS, MIN_SAMPLE_TEMPERATURE};

/// Draws one category per row of `[batch, num_bins]` logits, returning `u32` `[batch]`.
pub trait BinSampler: Send + Sync {
    fn sample(&self, logits: &Tensor, temperature: f64) -> candle_core::Result<Tensor>;

    fn name(&self) -> &'static str;
}

/// `argmax(logits / temperature + gumbel)`: an exact categorical sample from
/// `softmax(logits / temperature)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GumbelSampler;

impl BinSampler for GumbelSampler {
    fn sample(&self, logits: &Tensor, temperature: f64) -> candle_core::Result<Tensor> {
        let temperature = temperature.max(MIN_SAMPLE_TEMPERATURE);
        let noise = gumbel_noise(logits)?;
        ((logits / temperature)? + noise)?.argmax(D::Minus1)
    }

    fn name(&self) -> &'static str {
        "gumbel"
    }
}

/// Ignores temperature and always picks the highest logit.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArgMaxSampler;

impl BinSampler for ArgMaxSampler {
    fn sample(&self, logits: &Tensor, _temperature: f64) -> candle_core::Result<Tensor> {
        logits.argmax(D::Minus1)
    }

    fn name(&self) -> &'static str {
        "argmax"
    }
}

/// Standard Gumbel noise shaped like `like`: `-ln(-ln(u))`, `u ~ U(0, 1)`.
pub fn gumbel_noise(like: &Tensor) -> candle_core::Result<Tensor> {
    let uniform = Tensor::rand(0f32, 1f32, like.shape(), like.device())?.to_dtype(like.dtype())?;
    uniform
        .maximum(GUMBEL_EPS)?
        .log()?
        .neg()?
        .maximum(GUMBEL_EPS)?
        .log()?
        .neg()
}

/// Expected bin index under `softmax(logits)`, `[batch]`.
pub fn expected_bin(logits: &Tensor) -> candle_core::Result<Tensor> {
    let num_bins = logits.dim(D::Minus1)?;
    let probs = candle_nn::ops::softmax_last_dim(logits)?;
    let bins = Tensor::arange(0u32, num_bins as u32, logits.device())?.to_dtype(logits.dtype())?;
    probs.broadcast_mul(&bins)?.sum(D::Minus1)
}
