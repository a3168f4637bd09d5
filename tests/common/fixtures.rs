//! Backbones, token batches and comparison helpers used across integration tests.

use candle_core::{Device, Tensor};
use reward::{MockBackbone, MockBackboneConfig, RewardScorer, ScorerConfig};

pub const DIM: usize = 8;
pub const VOCAB_SIZE: usize = 32;

pub fn backbone() -> MockBackbone {
    MockBackbone::new(
        MockBackboneConfig {
            vocab_size: VOCAB_SIZE,
            dim: DIM,
            ..Default::default()
        },
        &Device::Cpu,
    )
    .expect("mock backbone")
}

pub fn scorer(config: ScorerConfig) -> RewardScorer<MockBackbone> {
    RewardScorer::new(&backbone(), config).expect("reward scorer")
}

/// Four sequences of length six, distinct tokens per row.
pub fn token_batch() -> Tensor {
    Tensor::new(
        &[
            [1u32, 5, 9, 13, 17, 21],
            [2, 6, 10, 14, 18, 22],
            [3, 7, 11, 15, 19, 23],
            [4, 8, 12, 16, 20, 24],
        ],
        &Device::Cpu,
    )
    .expect("token batch")
}

pub fn prompt_lengths() -> Tensor {
    Tensor::new(&[2u32, 3, 1, 6], &Device::Cpu).expect("prompt lengths")
}

pub fn max_abs_diff(a: &Tensor, b: &Tensor) -> f32 {
    (a - b)
        .and_then(|d| d.abs())
        .and_then(|d| d.flatten_all())
        .and_then(|d| d.max(0))
        .and_then(|d| d.to_scalar::<f32>())
        .expect("tensor diff")
}

/// Detached copies of every tensor in a parameter set, keyed by name.
pub fn snapshot(params: &reward::ParameterSet) -> Vec<(String, Tensor)> {
    params
        .iter()
        .map(|(name, var)| {
            (
                name.to_string(),
                var.as_tensor().copy().expect("tensor copy"),
            )
        })
        .collect()
}
