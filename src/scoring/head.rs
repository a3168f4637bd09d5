use candle_core::{D, DType, Module, Tensor};
use candle_nn::{Linear, VarBuilder};

use super::error::ScoringError;
use crate::constants::is_binned;

/// Output projection of the scorer. Exactly one variant exists per scorer.
#[derive(Debug, Clone)]
pub enum OutputHead {
    /// `dim -> 1` without bias, trailing dimension squeezed.
    Regression(Linear),
    /// `dim -> num_bins` with bias.
    Classification { linear: Linear, num_bins: usize },
}

impl OutputHead {
    /// Builds the head `num_bins` selects (`> 1` means classification).
    pub fn new(dim: usize, num_bins: usize, vb: VarBuilder) -> candle_core::Result<Self> {
        if is_binned(num_bins) {
            Ok(OutputHead::Classification {
                linear: candle_nn::linear(dim, num_bins, vb)?,
                num_bins,
            })
        } else {
            Ok(OutputHead::Regression(candle_nn::linear_no_bias(dim, 1, vb)?))
        }
    }

    pub fn is_binned(&self) -> bool {
        matches!(self, OutputHead::Classification { .. })
    }

    /// Width of the head output: `1` for regression, `num_bins` otherwise.
    pub fn num_outputs(&self) -> usize {
        match self {
            OutputHead::Regression(_) => 1,
            OutputHead::Classification { num_bins, .. } => *num_bins,
        }
    }

    /// `[batch, dim]` to `[batch]` scores or `[batch, num_bins]` logits.
    pub fn project(&self, pooled: &Tensor) -> candle_core::Result<Tensor> {
        match self {
            OutputHead::Regression(linear) => linear.forward(pooled)?.squeeze(D::Minus1),
            OutputHead::Classification { linear, .. } => linear.forward(pooled),
        }
    }

    /// Checks `labels` against the head before any forward work.
    pub fn validate_labels(&self, labels: &Tensor, batch: usize) -> Result<(), ScoringError> {
        if labels.dims() != [batch] {
            return Err(ScoringError::invalid(format!(
                "labels must be [{batch}], got {:?}",
                labels.dims()
            )));
        }

        match self {
            OutputHead::Regression(_) if !labels.dtype().is_float() => {
                Err(ScoringError::invalid(format!(
                    "regression head needs float labels, got {:?}",
                    labels.dtype()
                )))
            }
            OutputHead::Classification { .. } if !labels.dtype().is_int() => {
                Err(ScoringError::invalid(format!(
                    "classification head needs integer class labels, got {:?}",
                    labels.dtype()
                )))
            }
            _ => Ok(()),
        }
    }

    /// Mean squared error (regression) or cross-entropy over bins (classification).
    pub fn loss(&self, prediction: &Tensor, labels: &Tensor) -> Result<Tensor, ScoringError> {
        self.validate_labels(labels, prediction.dim(0)?)?;

        match self {
            OutputHead::Regression(_) => {
                let targets = labels.to_dtype(prediction.dtype())?;
                Ok(candle_nn::loss::mse(prediction, &targets)?)
            }
            OutputHead::Classification { num_bins, .. } => {
                let targets = labels.to_dtype(DType::I64)?;
                let (min, max) = (
                    targets.min(0)?.to_scalar::<i64>()?,
                    targets.max(0)?.to_scalar::<i64>()?,
                );
                if min < 0 || max >= *num_bins as i64 {
                    return Err(ScoringError::invalid(format!(
                        "class labels must lie in [0, {num_bins}), got range [{min}, {max}]"
                    )));
                }
                Ok(candle_nn::loss::cross_entropy(prediction, &targets.to_dtype(DType::U32)?)?)
            }
        }
    }
}
