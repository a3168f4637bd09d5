//! Whole-state weight persistence as a safetensors `name -> tensor` mapping.

use std::collections::HashMap;
use std::path::Path;

use candle_core::{Device, Tensor};
use tracing::{debug, info};

use super::error::ScoringError;
use crate::params::ParameterSet;

/// Overwrites every parameter in `params` from the file at `path`.
///
/// The file must hold exactly the names in `params` with matching shapes and
/// dtypes; nothing is written unless every entry checks out.
pub fn load_parameters(
    params: &ParameterSet,
    path: &Path,
    device: &Device,
) -> Result<usize, ScoringError> {
    if !path.exists() {
        return Err(ScoringError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let tensors = candle_core::safetensors::load(path, device).map_err(|e| {
        ScoringError::WeightLoad {
            reason: format!("failed to read {}: {e}", path.display()),
        }
    })?;

    check_structure(params, &tensors)?;

    for (name, var) in params.iter() {
        // Presence checked above.
        if let Some(tensor) = tensors.get(name) {
            var.set(tensor).map_err(|e| ScoringError::WeightLoad {
                reason: format!("failed to assign {name}: {e}"),
            })?;
        }
    }

    info!(
        path = %path.display(),
        tensors = params.len(),
        elements = params.num_elements(),
        "Loaded scorer weights"
    );
    Ok(params.len())
}

/// Writes every parameter in `params` to `path`.
pub fn save_parameters(params: &ParameterSet, path: &Path) -> Result<(), ScoringError> {
    candle_core::safetensors::save(&params.to_tensors(), path).map_err(|e| {
        ScoringError::WeightSave {
            reason: format!("failed to write {}: {e}", path.display()),
        }
    })?;

    info!(
        path = %path.display(),
        tensors = params.len(),
        "Saved scorer weights"
    );
    Ok(())
}

fn check_structure(
    params: &ParameterSet,
    tensors: &HashMap<String, Tensor>,
) -> Result<(), ScoringError> {
    let missing: Vec<&str> = params
        .names()
        .filter(|name| !tensors.contains_key(*name))
        .collect();
    if !missing.is_empty() {
        return Err(ScoringError::WeightLoad {
            reason: format!("missing tensors: {}", missing.join(", ")),
        });
    }

    let mut unexpected: Vec<&str> = tensors
        .keys()
        .map(String::as_str)
        .filter(|name| params.get(name).is_none())
        .collect();
    if !unexpected.is_empty() {
        unexpected.sort_unstable();
        return Err(ScoringError::WeightLoad {
            reason: format!("unexpected tensors: {}", unexpected.join(", ")),
        });
    }

    for (name, var) in params.iter() {
        let tensor = &tensors[name];
        if tensor.dims() != var.dims() {
            return Err(ScoringError::WeightLoad {
                reason: format!(
                    "shape mismatch for {name}: expected {:?}, found {:?}",
                    var.dims(),
                    tensor.dims()
                ),
            });
        }
        if tensor.dtype() != var.dtype() {
            return Err(ScoringError::WeightLoad {
                reason: format!(
                    "dtype mismatch for {name}: expected {:?}, found {:?}",
                    var.dtype(),
                    tensor.dtype()
                ),
            });
        }
    }

    debug!(tensors = params.len(), "Persisted structure matches scorer");
    Ok(())
}
