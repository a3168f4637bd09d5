use candle_core::Tensor;

/// Inputs of one [`RewardScorer::score`](super::RewardScorer::score) call.
///
/// Masks may use any dtype; a position is "on" when its value is non-zero.
#[derive(Debug, Clone, Copy)]
pub struct ScoreRequest<'a> {
    /// Token ids, `[batch, seq]`.
    pub tokens: &'a Tensor,
    /// Positions that take part in pooling, `[batch, seq]`.
    pub sequence_mask: Option<&'a Tensor>,
    /// Prompt positions, `[batch, seq]`. Exclusive with `prompt_lengths`.
    pub prompt_mask: Option<&'a Tensor>,
    /// Prompt length per example, `[batch]`. Exclusive with `prompt_mask`.
    pub prompt_lengths: Option<&'a Tensor>,
    /// Float targets `[batch]` (regression) or class indices `[batch]` (binned).
    pub labels: Option<&'a Tensor>,
    /// Skip the backbone's adapters for this call.
    pub disable_adapters: bool,
    /// Enables backbone dropout.
    pub train: bool,
}

impl<'a> ScoreRequest<'a> {
    pub fn new(tokens: &'a Tensor) -> Self {
        Self {
            tokens,
            sequence_mask: None,
            prompt_mask: None,
            prompt_lengths: None,
            labels: None,
            disable_adapters: false,
            train: false,
        }
    }

    pub fn with_sequence_mask(mut self, mask: &'a Tensor) -> Self {
        self.sequence_mask = Some(mask);
        self
    }

    pub fn with_prompt_mask(mut self, mask: &'a Tensor) -> Self {
        self.prompt_mask = Some(mask);
        self
    }

    pub fn with_prompt_lengths(mut self, lengths: &'a Tensor) -> Self {
        self.prompt_lengths = Some(lengths);
        self
    }

    pub fn with_labels(mut self, labels: &'a Tensor) -> Self {
        self.labels = Some(labels);
        self
    }

    pub fn with_disable_adapters(mut self, disable: bool) -> Self {
        self.disable_adapters = disable;
        self
    }

    pub fn training(mut self, train: bool) -> Self {
        self.train = train;
        self
    }
}

/// Result of a scoring call; the variant depends on the head and the inputs.
#[derive(Debug, Clone)]
pub enum ScoreOutput {
    /// Raw regression score per example, `[batch]`.
    Scores(Tensor),
    /// Raw classification logits, `[batch, num_bins]`.
    Logits(Tensor),
    /// Sampled bin index per example, `[batch]`, `u32`.
    Sampled(Tensor),
    /// Scalar training loss.
    Loss(Tensor),
}

impl ScoreOutput {
    /// Returns the underlying tensor.
    pub fn tensor(&self) -> &Tensor {
        match self {
            ScoreOutput::Scores(t)
            | ScoreOutput::Logits(t)
            | ScoreOutput::Sampled(t)
            | ScoreOutput::Loss(t) => t,
        }
    }

    pub fn into_tensor(self) -> Tensor {
        match self {
            ScoreOutput::Scores(t)
            | ScoreOutput::Logits(t)
            | ScoreOutput::Sampled(t)
            | ScoreOutput::Loss(t) => t,
        }
    }

    pub fn is_loss(&self) -> bool {
        matches!(self, ScoreOutput::Loss(_))
    }

    /// Returns a short debug string.
    pub fn kind(&self) -> &'static str {
        match self {
            ScoreOutput::Scores(_) => "SCORES",
            ScoreOutput::Logits(_) => "LOGITS",
            ScoreOutput::Sampled(_) => "SAMPLED",
            ScoreOutput::Loss(_) => "LOSS",
        }
    }
}

impl std::fmt::Display for ScoreOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:?}", self.kind(), self.tensor().dims())
    }
}
