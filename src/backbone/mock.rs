use std::collections::BTreeMap;

use candle_core::{DType, Device, Module, Tensor, Var};
use candle_nn::Linear;

use super::error::BackboneError;
use super::{Backbone, EmbedOptions};
use crate::params::ParameterSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockBackboneConfig {
    pub vocab_size: usize,
    pub dim: usize,
    /// Storage dtype of every weight, adapters included.
    pub dtype: DType,
}

impl Default for MockBackboneConfig {
    fn default() -> Self {
        Self {
            vocab_size: 64,
            dim: 16,
            dtype: DType::F32,
        }
    }
}

struct LowRankAdapter {
    down: Var,
    up: Var,
}

impl LowRankAdapter {
    fn new(dim: usize, rank: usize, dtype: DType, device: &Device) -> candle_core::Result<Self> {
        let std = 1.0 / (dim as f32).sqrt();
        Ok(Self {
            down: randn_var(std, (rank, dim), dtype, device)?,
            // Zero `up` makes a fresh scope an exact no-op.
            up: Var::zeros((dim, rank), dtype, device)?,
        })
    }

    fn forward(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        let down = Linear::new(self.down.as_tensor().clone(), None);
        let up = Linear::new(self.up.as_tensor().clone(), None);
        up.forward(&down.forward(x)?)
    }

    fn deep_clone(&self) -> candle_core::Result<Self> {
        Ok(Self {
            down: copy_var(&self.down)?,
            up: copy_var(&self.up)?,
        })
    }
}

/// Single residual block over a token embedding table, with per-scope
/// low-rank adapters on its projection.
///
/// `hidden = x + tanh(W x + b + up(down(x)))` where `x` is the token embedding
/// plus any extra embedding. Logits are tied to the embedding table.
pub struct MockBackbone {
    config: MockBackboneConfig,
    device: Device,
    token_embedding: Var,
    proj_weight: Var,
    proj_bias: Var,
    adapters: BTreeMap<String, LowRankAdapter>,
    dropout: f32,
}

impl std::fmt::Debug for MockBackbone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBackbone")
            .field("config", &self.config)
            .field("device", &format!("{:?}", self.device))
            .field("adapters", &self.adapters.keys().collect::<Vec<_>>())
            .field("dropout", &self.dropout)
            .finish()
    }
}

impl MockBackbone {
    pub fn new(config: MockBackboneConfig, device: &Device) -> Result<Self, BackboneError> {
        if config.dim == 0 || config.vocab_size == 0 {
            return Err(BackboneError::InvalidInput {
                reason: format!(
                    "vocab_size and dim must be non-zero, got {} and {}",
                    config.vocab_size, config.dim
                ),
            });
        }

        let std = 1.0 / (config.dim as f32).sqrt();
        Ok(Self {
            config,
            device: device.clone(),
            token_embedding: randn_var(1.0, (config.vocab_size, config.dim), config.dtype, device)?,
            proj_weight: randn_var(std, (config.dim, config.dim), config.dtype, device)?,
            proj_bias: Var::zeros(config.dim, config.dtype, device)?,
            adapters: BTreeMap::new(),
            dropout: 0.0,
        })
    }

    pub fn config(&self) -> &MockBackboneConfig {
        &self.config
    }

    pub fn dropout(&self) -> f32 {
        self.dropout
    }

    pub fn has_adapter_scope(&self, name: &str) -> bool {
        self.adapters.contains_key(name)
    }

    /// Base (non-adapter) parameters only.
    pub fn base_parameters(&self) -> ParameterSet {
        let mut params = ParameterSet::new();
        params.insert("token_embedding", self.token_embedding.clone());
        params.insert("proj.weight", self.proj_weight.clone());
        params.insert("proj.bias", self.proj_bias.clone());
        params
    }

    fn adapter(&self, name: &str) -> Result<&LowRankAdapter, BackboneError> {
        self.adapters
            .get(name)
            .ok_or_else(|| BackboneError::UnknownAdapterScope {
                name: name.to_string(),
            })
    }
}

impl Backbone for MockBackbone {
    fn dim(&self) -> usize {
        self.config.dim
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn dtype(&self) -> DType {
        self.config.dtype
    }

    fn embed(&self, tokens: &Tensor, options: EmbedOptions<'_>) -> Result<Tensor, BackboneError> {
        let (batch, seq_len) = tokens.dims2().map_err(|_| BackboneError::InvalidInput {
            reason: format!("tokens must be [batch, seq], got {:?}", tokens.dims()),
        })?;
        let dim = self.config.dim;

        let ids = tokens.flatten_all()?.to_dtype(DType::U32)?;
        let mut x = self
            .token_embedding
            .as_tensor()
            .index_select(&ids, 0)?
            .reshape((batch, seq_len, dim))?;

        if let Some(extra) = options.extra_embed {
            if extra.dims() != [batch, seq_len, dim] {
                return Err(BackboneError::InvalidInput {
                    reason: format!(
                        "extra embedding must be [{batch}, {seq_len}, {dim}], got {:?}",
                        extra.dims()
                    ),
                });
            }
            x = (x + extra)?;
        }

        if options.train && self.dropout > 0.0 {
            x = candle_nn::ops::dropout(&x, self.dropout)?;
        }

        let proj = Linear::new(
            self.proj_weight.as_tensor().clone(),
            Some(self.proj_bias.as_tensor().clone()),
        );
        let mut h = proj.forward(&x)?;

        if !options.disable_adapters
            && let Some(scope) = options.adapter_scope
        {
            h = (h + self.adapter(scope)?.forward(&x)?)?;
        }

        let hidden = (x + h.tanh()?)?;

        if options.embedding_only {
            return Ok(hidden);
        }

        let lm_head = Linear::new(self.token_embedding.as_tensor().clone(), None);
        Ok(lm_head.forward(&hidden)?)
    }

    fn register_adapter_scope(&mut self, name: &str, rank: usize) -> Result<(), BackboneError> {
        if rank == 0 || rank > self.config.dim {
            return Err(BackboneError::InvalidRank {
                name: name.to_string(),
                rank,
            });
        }
        if self.adapters.contains_key(name) {
            return Err(BackboneError::DuplicateAdapterScope {
                name: name.to_string(),
            });
        }

        let adapter = LowRankAdapter::new(self.config.dim, rank, self.config.dtype, &self.device)?;
        self.adapters.insert(name.to_string(), adapter);
        Ok(())
    }

    fn adapter_parameters(&self, name: &str) -> Result<ParameterSet, BackboneError> {
        let adapter = self.adapter(name)?;
        let mut params = ParameterSet::new();
        params.insert(format!("adapters.{name}.down"), adapter.down.clone());
        params.insert(format!("adapters.{name}.up"), adapter.up.clone());
        Ok(params)
    }

    fn all_parameters(&self) -> ParameterSet {
        let mut params = self.base_parameters();
        for (name, adapter) in &self.adapters {
            params.insert(format!("adapters.{name}.down"), adapter.down.clone());
            params.insert(format!("adapters.{name}.up"), adapter.up.clone());
        }
        params
    }

    fn set_dropout(&mut self, rate: f32) {
        self.dropout = rate;
    }

    fn deep_clone(&self) -> Result<Self, BackboneError> {
        let adapters = self
            .adapters
            .iter()
            .map(|(name, adapter)| Ok((name.clone(), adapter.deep_clone()?)))
            .collect::<Result<BTreeMap<_, _>, BackboneError>>()?;

        Ok(Self {
            config: self.config,
            device: self.device.clone(),
            token_embedding: copy_var(&self.token_embedding)?,
            proj_weight: copy_var(&self.proj_weight)?,
            proj_bias: copy_var(&self.proj_bias)?,
            adapters,
            dropout: self.dropout,
        })
    }
}

fn randn_var(std: f32, shape: (usize, usize), dtype: DType, device: &Device) -> candle_core::Result<Var> {
    Var::from_tensor(&Tensor::randn(0f32, std, shape, device)?.to_dtype(dtype)?)
}

fn copy_var(var: &Var) -> candle_core::Result<Var> {
    Var::from_tensor(&var.as_tensor().copy()?)
}
