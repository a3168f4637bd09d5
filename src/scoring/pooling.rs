use candle_core::Tensor;

use super::error::ScoringError;
use super::segment::to_bool_mask;

/// Mean of `embeds` (`[batch, seq, dim]`) over `seq`, restricted to positions
/// where `mask` (`[batch, seq]`) is set. Returns `[batch, dim]`.
///
/// The denominator is the per-example count of valid positions. An example
/// with no valid position pools to the zero vector.
pub fn masked_mean(embeds: &Tensor, mask: Option<&Tensor>) -> Result<Tensor, ScoringError> {
    let (batch, seq_len, _dim) = embeds.dims3()?;

    let Some(mask) = mask else {
        return Ok(embeds.mean(1)?);
    };

    if mask.dims() != [batch, seq_len] {
        return Err(ScoringError::invalid(format!(
            "sequence mask must be [{batch}, {seq_len}], got {:?}",
            mask.dims()
        )));
    }

    let weights = to_bool_mask(mask)?.to_dtype(embeds.dtype())?.unsqueeze(2)?;
    let summed = embeds.broadcast_mul(&weights)?.sum(1)?;
    let counts = weights.sum(1)?.maximum(1.0)?;
    Ok(summed.broadcast_div(&counts)?)
}
