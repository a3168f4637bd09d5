use std::cmp::Ordering;
use std::path::Path;

use candle_core::{DType, Tensor};
use candle_nn::{Init, VarBuilder, VarMap};
use tracing::{debug, info, warn};

use crate::backbone::{Backbone, EmbedOptions, device_label};
use crate::config::ScorerConfig;
use crate::constants::{
    BACKBONE_PREFIX, MIN_SAMPLE_TEMPERATURE, OUTPUT_HEAD_PREFIX, PROMPT_EMBED_NAME,
    RESPONSE_EMBED_NAME,
};
use crate::params::ParameterSet;

use super::error::ScoringError;
use super::head::OutputHead;
use super::persistence::{load_parameters, save_parameters};
use super::pooling::masked_mean;
use super::sampling::{BinSampler, GumbelSampler, expected_bin};
use super::segment::{resolve_prompt_mask, segment_embedding};
use super::types::{ScoreOutput, ScoreRequest};

/// Reward head over a private copy of a backbone.
///
/// Construction deep-copies the caller's backbone, sets its dropout and, when
/// configured, registers a private adapter scope on the copy. The scorer adds
/// two learned segment embeddings (prompt / response) and one output head.
pub struct RewardScorer<B: Backbone> {
    backbone: B,
    config: ScorerConfig,
    adapter_scope: Option<String>,
    prompt_embed: Tensor,
    response_embed: Tensor,
    head: OutputHead,
    own_params: ParameterSet,
    sample_from_bins: bool,
    sample_temperature: f64,
    sampler: Box<dyn BinSampler>,
}

impl<B: Backbone> std::fmt::Debug for RewardScorer<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewardScorer")
            .field("dim", &self.backbone.dim())
            .field("adapter_scope", &self.adapter_scope)
            .field("binned", &self.head.is_binned())
            .field("num_outputs", &self.head.num_outputs())
            .field("sample_from_bins", &self.sample_from_bins)
            .field("sample_temperature", &self.sample_temperature)
            .field("sampler", &self.sampler.name())
            .finish()
    }
}

impl<B: Backbone> RewardScorer<B> {
    /// Builds a scorer over a deep copy of `backbone`.
    pub fn new(backbone: &B, config: ScorerConfig) -> Result<Self, ScoringError> {
        config.validate()?;

        let mut backbone = backbone.deep_clone()?;
        backbone.set_dropout(config.dropout);

        let adapter_scope = config.adapter_scope().map(str::to_string);
        if let Some(ref scope) = adapter_scope {
            backbone.register_adapter_scope(scope, config.adapter_rank)?;
        }

        let dim = backbone.dim();
        let device = backbone.device().clone();
        let dtype = backbone.dtype();

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, dtype, &device);
        let prompt_embed = vb.get_with_hints(dim, PROMPT_EMBED_NAME, Init::Const(0.0))?;
        let response_embed = vb.get_with_hints(dim, RESPONSE_EMBED_NAME, Init::Const(0.0))?;
        let head = OutputHead::new(dim, config.num_bins, vb.pp(OUTPUT_HEAD_PREFIX))?;

        let own_params: ParameterSet = varmap
            .data()
            .lock()
            .map_err(|_| ScoringError::ComputationFailed {
                reason: "scorer parameter map poisoned".to_string(),
            })?
            .iter()
            .map(|(name, var)| (name.clone(), var.clone()))
            .collect();

        if config.num_bins == 1 {
            warn!("num_bins = 1 selects the regression head");
        }
        let sample_from_bins = config.effective_sample_from_bins();
        let sample_temperature = config.sample_temperature;
        if sample_from_bins && sample_temperature < MIN_SAMPLE_TEMPERATURE {
            warn!(
                requested = sample_temperature,
                applied = MIN_SAMPLE_TEMPERATURE,
                "Sampling temperature clamped"
            );
        }

        info!(
            dim,
            device = device_label(&device),
            dtype = ?dtype,
            binned = head.is_binned(),
            num_outputs = head.num_outputs(),
            adapter_scope = adapter_scope.as_deref().unwrap_or("<full>"),
            adapter_rank = config.adapter_rank,
            dropout = config.dropout,
            sample_from_bins,
            "Reward scorer initialized"
        );

        Ok(Self {
            backbone,
            config,
            adapter_scope,
            prompt_embed,
            response_embed,
            head,
            own_params,
            sample_from_bins,
            sample_temperature,
            sampler: Box::new(GumbelSampler),
        })
    }

    /// Replaces the sampling primitive used by the binned head.
    pub fn with_sampler<S: BinSampler + 'static>(mut self, sampler: S) -> Self {
        self.sampler = Box::new(sampler);
        self
    }

    /// Runs one scoring call. See [`ScoreOutput`] for what comes back when.
    ///
    /// Priority: sampling (binned head, sampling on, no labels), then raw
    /// output (no labels), then loss (labels).
    pub fn score(&self, request: ScoreRequest<'_>) -> Result<ScoreOutput, ScoringError> {
        let sample = self.sample_from_bins && self.head.is_binned();
        let batch = self.check_request(&request)?;
        if sample && request.labels.is_some() {
            return Err(ScoringError::invalid(
                "cannot sample from bins when labels are supplied",
            ));
        }

        let prediction = self.predict(&request)?;

        debug!(
            batch,
            seq_len = request.tokens.dim(1)?,
            sample,
            has_labels = request.labels.is_some(),
            train = request.train,
            "Scored batch"
        );

        if sample {
            let sampled = self
                .sampler
                .sample(&prediction, self.sample_temperature)?;
            return Ok(ScoreOutput::Sampled(sampled));
        }

        match request.labels {
            None if self.head.is_binned() => Ok(ScoreOutput::Logits(prediction)),
            None => Ok(ScoreOutput::Scores(prediction)),
            Some(labels) => Ok(ScoreOutput::Loss(self.head.loss(&prediction, labels)?)),
        }
    }

    /// Scores a batch of candidates and returns `(index, score)` pairs, best first.
    ///
    /// Binned heads rank by the expected bin index under the softmax.
    pub fn rank(&self, request: ScoreRequest<'_>) -> Result<Vec<(usize, f32)>, ScoringError> {
        if request.labels.is_some() {
            return Err(ScoringError::invalid("ranking does not take labels"));
        }
        self.check_request(&request)?;

        let prediction = self.predict(&request)?;
        let values = if self.head.is_binned() {
            expected_bin(&prediction)?
        } else {
            prediction
        };

        let mut ranked: Vec<(usize, f32)> = values
            .to_dtype(DType::F32)?
            .to_vec1::<f32>()?
            .into_iter()
            .enumerate()
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        debug!(
            candidates = ranked.len(),
            top_score = ranked.first().map(|(_, s)| *s),
            "Ranked candidates"
        );
        Ok(ranked)
    }

    /// Parameters an optimizer should update: the output head plus either the
    /// adapter scope or the whole backbone.
    pub fn finetune_parameters(&self) -> Result<ParameterSet, ScoringError> {
        let mut params = self.head_parameters();
        let backbone_params = match self.adapter_scope {
            Some(ref scope) => self.backbone.adapter_parameters(scope)?,
            None => self.backbone.all_parameters(),
        };
        params.extend_prefixed(BACKBONE_PREFIX, backbone_params);
        Ok(params)
    }

    /// Output head parameters only.
    pub fn head_parameters(&self) -> ParameterSet {
        let prefix = format!("{OUTPUT_HEAD_PREFIX}.");
        self.own_params
            .iter()
            .filter(|(name, _)| name.starts_with(&prefix))
            .map(|(name, var)| (name.to_string(), var.clone()))
            .collect()
    }

    /// Complete named state: segment embeddings, head and backbone.
    pub fn parameters(&self) -> ParameterSet {
        let mut params = self.own_params.clone();
        params.extend_prefixed(BACKBONE_PREFIX, self.backbone.all_parameters());
        params
    }

    /// Overwrites the whole state from a file written by [`save`](Self::save).
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ScoringError> {
        let params = self.parameters();
        load_parameters(&params, path.as_ref(), self.backbone.device())?;
        Ok(())
    }

    /// Writes the whole named state as a safetensors file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ScoringError> {
        save_parameters(&self.parameters(), path.as_ref())
    }

    /// The scorer's private backbone copy.
    pub fn backbone(&self) -> &B {
        &self.backbone
    }

    /// Configuration the scorer was built with.
    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    /// Embedding width of the backbone.
    pub fn dim(&self) -> usize {
        self.backbone.dim()
    }

    /// `true` when the classification head is in use.
    pub fn is_binned(&self) -> bool {
        self.head.is_binned()
    }

    /// Number of bins, `None` for the regression head.
    pub fn num_bins(&self) -> Option<usize> {
        self.head.is_binned().then(|| self.head.num_outputs())
    }

    /// Private adapter scope, `None` when the whole backbone is fine-tuned.
    pub fn adapter_scope(&self) -> Option<&str> {
        self.adapter_scope.as_deref()
    }

    /// Whether unlabeled calls on a binned head return sampled bins.
    pub fn sample_from_bins(&self) -> bool {
        self.sample_from_bins
    }

    /// Temperature handed to the bin sampler.
    pub fn sample_temperature(&self) -> f64 {
        self.sample_temperature
    }

    /// Learned vector added at prompt positions, `[dim]`.
    pub fn prompt_segment_embedding(&self) -> &Tensor {
        &self.prompt_embed
    }

    /// Learned vector added at response positions, `[dim]`.
    pub fn response_segment_embedding(&self) -> &Tensor {
        &self.response_embed
    }

    /// Argument checks that need no tensor computation. Returns the batch size.
    fn check_request(&self, request: &ScoreRequest<'_>) -> Result<usize, ScoringError> {
        if request.prompt_mask.is_some() && request.prompt_lengths.is_some() {
            return Err(ScoringError::invalid(
                "prompt_mask and prompt_lengths are mutually exclusive",
            ));
        }

        let (batch, _seq_len) = request.tokens.dims2().map_err(|_| {
            ScoringError::invalid(format!(
                "tokens must be [batch, seq], got {:?}",
                request.tokens.dims()
            ))
        })?;

        if let Some(labels) = request.labels {
            self.head.validate_labels(labels, batch)?;
        }

        Ok(batch)
    }

    /// Segment injection, backbone, pooling and head projection.
    fn predict(&self, request: &ScoreRequest<'_>) -> Result<Tensor, ScoringError> {
        let (batch, seq_len) = request.tokens.dims2()?;

        let prompt_mask =
            resolve_prompt_mask(request.prompt_mask, request.prompt_lengths, batch, seq_len)?;
        let extra_embed = prompt_mask
            .map(|mask| segment_embedding(&mask, &self.prompt_embed, &self.response_embed))
            .transpose()?;

        let options = EmbedOptions::default()
            .with_extra_embed(extra_embed.as_ref())
            .with_disable_adapters(request.disable_adapters)
            .with_adapter_scope(self.adapter_scope.as_deref())
            .with_train(request.train);

        let embeds = self.backbone.embed(request.tokens, options)?;
        let pooled = masked_mean(&embeds, request.sequence_mask)?;
        Ok(self.head.project(&pooled)?)
    }
}
