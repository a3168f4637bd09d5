//! Prompt/response segment tagging.

use candle_core::{DType, Tensor};

use super::error::ScoringError;

/// Normalises any-dtype mask to `u8` 0/1.
pub(crate) fn to_bool_mask(mask: &Tensor) -> candle_core::Result<Tensor> {
    mask.ne(&mask.zeros_like()?)
}

/// `mask[b, i] = i < prompt_lengths[b]` for `i` in `0..seq_len`.
pub fn derive_prompt_mask(prompt_lengths: &Tensor, seq_len: usize) -> Result<Tensor, ScoringError> {
    if prompt_lengths.rank() != 1 {
        return Err(ScoringError::invalid(format!(
            "prompt_lengths must be [batch], got {:?}",
            prompt_lengths.dims()
        )));
    }
    if !prompt_lengths.dtype().is_int() {
        return Err(ScoringError::invalid(format!(
            "prompt_lengths must hold integers, got {:?}",
            prompt_lengths.dtype()
        )));
    }

    let lengths = prompt_lengths.to_dtype(DType::I64)?.unsqueeze(1)?;
    let positions = Tensor::arange(0i64, seq_len as i64, prompt_lengths.device())?.unsqueeze(0)?;
    Ok(positions.broadcast_lt(&lengths)?)
}

/// Picks the prompt mask for a call: the explicit mask, one derived from
/// lengths, or none.
pub(crate) fn resolve_prompt_mask(
    prompt_mask: Option<&Tensor>,
    prompt_lengths: Option<&Tensor>,
    batch: usize,
    seq_len: usize,
) -> Result<Option<Tensor>, ScoringError> {
    match (prompt_mask, prompt_lengths) {
        (Some(_), Some(_)) => Err(ScoringError::invalid(
            "prompt_mask and prompt_lengths are mutually exclusive",
        )),
        (Some(mask), None) => {
            if mask.dims() != [batch, seq_len] {
                return Err(ScoringError::invalid(format!(
                    "prompt_mask must be [{batch}, {seq_len}], got {:?}",
                    mask.dims()
                )));
            }
            Ok(Some(to_bool_mask(mask)?))
        }
        (None, Some(lengths)) => {
            if lengths.dims() != [batch] {
                return Err(ScoringError::invalid(format!(
                    "prompt_lengths must be [{batch}], got {:?}",
                    lengths.dims()
                )));
            }
            derive_prompt_mask(lengths, seq_len).map(Some)
        }
        (None, None) => Ok(None),
    }
}

/// Builds the additive `[batch, seq, dim]` embedding: `prompt` where the mask
/// is set, `response` elsewhere.
pub fn segment_embedding(
    prompt_mask: &Tensor,
    prompt: &Tensor,
    response: &Tensor,
) -> candle_core::Result<Tensor> {
    let (batch, seq_len) = prompt_mask.dims2()?;
    let dim = prompt.dim(0)?;
    let shape = (batch, seq_len, dim);

    prompt_mask
        .unsqueeze(2)?
        .broadcast_as(shape)?
        .where_cond(&prompt.broadcast_as(shape)?, &response.broadcast_as(shape)?)
}
