// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The training driver never talks to a concrete tracking
// backend. It only sees ExperimentTracker, so the local
// run-directory tracker (Layer 6) and the in-memory tracker
// used by the unit tests are interchangeable.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::domain::image::{LabeledImage, Split};
use crate::domain::metrics::{EpochMetrics, ParameterStats};

// ─── Watch registration ──────────────────────────────────────────────────────
/// What the tracker should record about the model between epochs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchLog {
    Gradients,
    Parameters,
    All,
}

impl WatchLog {
    pub fn parameters(self) -> bool {
        matches!(self, WatchLog::Parameters | WatchLog::All)
    }

    pub fn gradients(self) -> bool {
        matches!(self, WatchLog::Gradients | WatchLog::All)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchSpec {
    pub log: WatchLog,

    /// Record statistics every `log_freq` optimizer steps
    pub log_freq: usize,
}

// ─── Artifacts ───────────────────────────────────────────────────────────────
/// A named file registered with the tracker at the end of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub name:        String,
    pub kind:        String,
    pub description: String,
    pub metadata:    serde_json::Value,
    pub path:        PathBuf,
}

// ─── ExperimentTracker ───────────────────────────────────────────────────────
/// Sink for everything a run reports about itself.
///
/// Implementations:
///   - LocalTracker → writes a run directory on disk
pub trait ExperimentTracker {
    /// Register periodic model instrumentation.
    fn watch(&mut self, spec: &WatchSpec) -> Result<()>;

    /// Record parameter/gradient statistics at a global optimizer step.
    fn log_parameters(&mut self, step: usize, stats: &[ParameterStats]) -> Result<()>;

    /// Record one flat key → scalar mapping.
    fn log(&mut self, values: &BTreeMap<String, f64>) -> Result<()>;

    /// Register a persisted file together with its metadata.
    fn log_artifact(&mut self, artifact: &Artifact) -> Result<()>;

    /// Close the run.
    fn finish(&mut self) -> Result<()>;

    /// Convenience wrapper flattening an epoch record.
    fn log_epoch(&mut self, metrics: &EpochMetrics) -> Result<()> {
        self.log(&metrics.to_flat())
    }
}

// ─── ImageSource ─────────────────────────────────────────────────────────────
/// Any component that can produce the labelled images of a split.
///
/// Implementations:
///   - Cifar10Loader   → reads the CIFAR-10 binary batches from disk
///   - SyntheticSource → generates deterministic images from a seed
pub trait ImageSource {
    /// Load every image of `split`, in a fixed order.
    fn load_split(&self, split: Split) -> Result<Vec<LabeledImage>>;
}
