// ============================================================
// Layer 3 — Error Types
// ============================================================
// Typed errors for the two failure classes that are detected
// by this crate itself. Everything else (recorder, tracker,
// filesystem) travels as anyhow::Error with context attached.

use thiserror::Error;

/// An invalid hyperparameter. Raised before any computation starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("depth factor n must be at least 1 (got {0})")]
    DepthTooSmall(usize),

    #[error("batch_size must be at least 1")]
    ZeroBatchSize,

    #[error("epochs must be at least 1")]
    ZeroEpochs,

    #[error("learning_rate must be a positive finite number (got {0})")]
    InvalidLearningRate(f64),

    #[error("weight_decay must be non-negative (got {0})")]
    NegativeWeightDecay(f64),

    #[error("momentum must lie in [0, 1) (got {0})")]
    MomentumOutOfRange(f64),

    #[error("lr decay factor must lie in (0, 1] (got {0})")]
    InvalidLrDecay(f64),

    #[error("lr milestones must be strictly increasing (got {0:?})")]
    UnsortedMilestones(Vec<usize>),

    #[error("block width must be positive")]
    ZeroWidth,

    #[error("a downsampling block needs an even width (got {0})")]
    OddDownsampleWidth(usize),
}

/// A problem with the image data itself.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("missing CIFAR-10 batch file '{0}'")]
    MissingFile(String),

    #[error("'{file}' is {len} bytes, not a multiple of the {record}-byte record size")]
    TruncatedRecord {
        file:   String,
        len:    usize,
        record: usize,
    },

    #[error("label {label} in '{file}' is outside 0..{classes}")]
    LabelOutOfRange {
        file:    String,
        label:   u8,
        classes: usize,
    },

    #[error("the {0} split is empty")]
    EmptySplit(&'static str),
}
