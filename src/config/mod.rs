//! Scorer construction configuration.
//!
//! Every setting has a default. Override with `REWARD_*` environment variables
//! ([`ScorerConfig::from_env`]), a JSON file ([`ScorerConfig::from_json_file`]),
//! or the `with_*` builder methods.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{
    DEFAULT_ADAPTER_RANK, DEFAULT_ADAPTER_SCOPE, DEFAULT_DROPOUT, DEFAULT_NUM_BINS,
    DEFAULT_SAMPLE_TEMPERATURE, DEFAULT_USE_ADAPTER, is_binned,
};

/// Construction-time settings for a [`RewardScorer`](crate::scoring::RewardScorer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    /// Dropout rate applied to the scorer's backbone copy. Default: `0.1`.
    pub dropout: f32,

    /// `0` or `1` selects the regression head, `> 1` the classification head.
    pub num_bins: usize,

    /// Register a private low-rank adapter scope on the backbone copy. Default: `true`.
    pub use_adapter: bool,

    /// Rank of the adapter scope. Default: `8`.
    pub adapter_rank: usize,

    /// Name of the adapter scope. Default: `"reward"`.
    pub adapter_scope_name: String,

    /// Override for sampling from the binned head. `None` follows the head type.
    pub sample_from_bins: Option<bool>,

    /// Sampling temperature. Default: `1.0`.
    pub sample_temperature: f64,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            dropout: DEFAULT_DROPOUT,
            num_bins: DEFAULT_NUM_BINS,
            use_adapter: DEFAULT_USE_ADAPTER,
            adapter_rank: DEFAULT_ADAPTER_RANK,
            adapter_scope_name: DEFAULT_ADAPTER_SCOPE.to_string(),
            sample_from_bins: None,
            sample_temperature: DEFAULT_SAMPLE_TEMPERATURE,
        }
    }
}

impl ScorerConfig {
    pub const ENV_DROPOUT: &'static str = "REWARD_DROPOUT";
    pub const ENV_NUM_BINS: &'static str = "REWARD_NUM_BINS";
    pub const ENV_USE_ADAPTER: &'static str = "REWARD_USE_ADAPTER";
    pub const ENV_ADAPTER_RANK: &'static str = "REWARD_ADAPTER_RANK";
    pub const ENV_ADAPTER_SCOPE: &'static str = "REWARD_ADAPTER_SCOPE";
    pub const ENV_SAMPLE_FROM_BINS: &'static str = "REWARD_SAMPLE_FROM_BINS";
    pub const ENV_SAMPLE_TEMPERATURE: &'static str = "REWARD_SAMPLE_TEMPERATURE";

    /// Regression config (single scalar head).
    pub fn regression() -> Self {
        Self::default()
    }

    /// Classification config over `num_bins` categories.
    pub fn binned(num_bins: usize) -> Self {
        Self {
            num_bins,
            ..Self::default()
        }
    }

    pub fn with_dropout(mut self, dropout: f32) -> Self {
        self.dropout = dropout;
        self
    }

    pub fn with_num_bins(mut self, num_bins: usize) -> Self {
        self.num_bins = num_bins;
        self
    }

    /// Enables the adapter scope with the given rank.
    pub fn with_adapter(mut self, rank: usize) -> Self {
        self.use_adapter = true;
        self.adapter_rank = rank;
        self
    }

    /// Disables the adapter scope (full fine-tuning of the backbone copy).
    pub fn without_adapter(mut self) -> Self {
        self.use_adapter = false;
        self
    }

    pub fn with_adapter_scope_name(mut self, name: impl Into<String>) -> Self {
        self.adapter_scope_name = name.into();
        self
    }

    pub fn with_sample_from_bins(mut self, sample: bool) -> Self {
        self.sample_from_bins = Some(sample);
        self
    }

    pub fn with_sample_temperature(mut self, temperature: f64) -> Self {
        self.sample_temperature = temperature;
        self
    }

    /// Returns `true` when the classification head is selected.
    pub fn is_binned(&self) -> bool {
        is_binned(self.num_bins)
    }

    /// Effective sampling flag: the explicit override, or the head type.
    pub fn effective_sample_from_bins(&self) -> bool {
        self.sample_from_bins.unwrap_or_else(|| self.is_binned())
    }

    /// Effective adapter scope name (`None` when adapters are disabled).
    pub fn adapter_scope(&self) -> Option<&str> {
        self.use_adapter.then_some(self.adapter_scope_name.as_str())
    }

    /// Validates value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(ConfigError::InvalidDropout {
                value: self.dropout,
            });
        }

        if !self.sample_temperature.is_finite() || self.sample_temperature <= 0.0 {
            return Err(ConfigError::InvalidTemperature {
                value: self.sample_temperature,
            });
        }

        if self.use_adapter {
            if self.adapter_rank == 0 {
                return Err(ConfigError::InvalidAdapterRank {
                    value: self.adapter_rank,
                });
            }
            if self.adapter_scope_name.trim().is_empty() {
                return Err(ConfigError::EmptyAdapterScope);
            }
        }

        Ok(())
    }

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let dropout = Self::parse_from_env(Self::ENV_DROPOUT, defaults.dropout)?;
        let num_bins = Self::parse_from_env(Self::ENV_NUM_BINS, defaults.num_bins)?;
        let use_adapter = Self::parse_bool_from_env(Self::ENV_USE_ADAPTER)?
            .unwrap_or(defaults.use_adapter);
        let adapter_rank = Self::parse_from_env(Self::ENV_ADAPTER_RANK, defaults.adapter_rank)?;
        let adapter_scope_name = env::var(Self::ENV_ADAPTER_SCOPE)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.adapter_scope_name);
        let sample_from_bins = Self::parse_bool_from_env(Self::ENV_SAMPLE_FROM_BINS)?;
        let sample_temperature = Self::parse_from_env(
            Self::ENV_SAMPLE_TEMPERATURE,
            defaults.sample_temperature,
        )?;

        let config = Self {
            dropout,
            num_bins,
            use_adapter,
            adapter_rank,
            adapter_scope_name,
            sample_from_bins,
            sample_temperature,
        };
        debug!(?config, "Loaded scorer config from environment");
        Ok(config)
    }

    /// Loads configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::PathNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn parse_from_env<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
        match env::var(name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidEnvValue { name, value }),
            Err(_) => Ok(default),
        }
    }

    fn parse_bool_from_env(name: &'static str) -> Result<Option<bool>, ConfigError> {
        match env::var(name) {
            Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(Some(true)),
                "0" | "false" | "no" | "off" => Ok(Some(false)),
                _ => Err(ConfigError::InvalidEnvValue { name, value }),
            },
            Err(_) => Ok(None),
        }
    }
}
