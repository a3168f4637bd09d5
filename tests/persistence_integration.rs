//! Integration tests for saving and loading scorer weights.

mod common;

use anyhow::Result;
use candle_core::{DType, Device, Tensor};
use common::fixtures::{backbone, max_abs_diff, prompt_lengths, scorer, token_batch};
use reward::{RewardScorer, ScoreRequest, ScorerConfig, ScoringError};
use std::collections::HashMap;
use tempfile::TempDir;

fn scores(scorer: &RewardScorer<reward::MockBackbone>) -> Result<Tensor> {
    let tokens = token_batch();
    let lengths = prompt_lengths();
    Ok(scorer
        .score(ScoreRequest::new(&tokens).with_prompt_lengths(&lengths))?
        .into_tensor())
}

#[test]
fn test_save_load_round_trip() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("reward.safetensors");

    let trained = scorer(ScorerConfig::regression());
    let prompt = trained.parameters();
    let prompt = prompt.get("prompt_embed").expect("prompt embed");
    prompt.set(&prompt.ones_like()?)?;
    trained.save(&path)?;

    let mut restored = scorer(ScorerConfig::regression());
    assert!(max_abs_diff(&scores(&trained)?, &scores(&restored)?) > 0.0);

    restored.load(&path)?;
    assert!(max_abs_diff(&scores(&trained)?, &scores(&restored)?) < 1e-6);
    assert!(
        max_abs_diff(
            trained.prompt_segment_embedding(),
            restored.prompt_segment_embedding()
        ) == 0.0
    );
    Ok(())
}

#[test]
fn test_load_missing_file() {
    let dir = TempDir::new().expect("temp dir");
    let mut restored = scorer(ScorerConfig::regression());

    let result = restored.load(dir.path().join("absent.safetensors"));
    assert!(matches!(result, Err(ScoringError::NotFound { .. })));
}

#[test]
fn test_load_rejects_different_head() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("binned.safetensors");
    scorer(ScorerConfig::binned(4)).save(&path)?;

    let mut regression = scorer(ScorerConfig::regression());
    match regression.load(&path) {
        Err(ScoringError::WeightLoad { reason }) => {
            assert!(reason.contains("unexpected") || reason.contains("mismatch"));
        }
        other => panic!("expected WeightLoad, got {other:?}"),
    }

    let mut other_bins = scorer(ScorerConfig::binned(5));
    match other_bins.load(&path) {
        Err(ScoringError::WeightLoad { reason }) => assert!(reason.contains("shape mismatch")),
        other => panic!("expected WeightLoad, got {other:?}"),
    }
    Ok(())
}

#[test]
fn test_load_rejects_missing_adapter() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("full.safetensors");
    scorer(ScorerConfig::regression().without_adapter()).save(&path)?;

    let mut adapted = scorer(ScorerConfig::regression());
    match adapted.load(&path) {
        Err(ScoringError::WeightLoad { reason }) => assert!(reason.contains("missing")),
        other => panic!("expected WeightLoad, got {other:?}"),
    }
    Ok(())
}

#[test]
fn test_failed_load_leaves_state_untouched() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("partial.safetensors");

    let source = scorer(ScorerConfig::regression());
    let mut tensors: HashMap<String, Tensor> = source.parameters().to_tensors();
    tensors.insert(
        "to_pred.weight".to_string(),
        Tensor::ones((1, 8), DType::F32, &Device::Cpu)?,
    );
    tensors.insert(
        "prompt_embed".to_string(),
        Tensor::ones(3, DType::F32, &Device::Cpu)?,
    );
    candle_core::safetensors::save(&tensors, &path)?;

    let mut target = scorer(ScorerConfig::regression());
    let before = scores(&target)?;
    assert!(matches!(
        target.load(&path),
        Err(ScoringError::WeightLoad { .. })
    ));
    assert_eq!(max_abs_diff(&before, &scores(&target)?), 0.0);
    Ok(())
}

#[test]
fn test_load_rejects_corrupt_file() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("corrupt.safetensors");
    std::fs::write(&path, b"not a safetensors file")?;

    let mut target = RewardScorer::new(&backbone(), ScorerConfig::regression())?;
    assert!(matches!(
        target.load(&path),
        Err(ScoringError::WeightLoad { .. })
    ));
    Ok(())
}

#[test]
fn test_load_rejects_dtype_mismatch() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("wide.safetensors");

    let source = scorer(ScorerConfig::regression());
    let mut tensors: HashMap<String, Tensor> = source.parameters().to_tensors();
    let prompt = tensors["prompt_embed"].ones_like()?.to_dtype(DType::F64)?;
    tensors.insert("prompt_embed".to_string(), prompt);
    candle_core::safetensors::save(&tensors, &path)?;

    let mut target = scorer(ScorerConfig::regression());
    let before = scores(&target)?;
    match target.load(&path) {
        Err(ScoringError::WeightLoad { reason }) => {
            assert!(reason.contains("dtype mismatch"), "{reason}");
            assert!(reason.contains("prompt_embed"), "{reason}");
        }
        other => panic!("expected WeightLoad, got {other:?}"),
    }
    assert_eq!(max_abs_diff(&before, &scores(&target)?), 0.0);
    assert_eq!(target.prompt_segment_embedding().dtype(), DType::F32);
    Ok(())
}
