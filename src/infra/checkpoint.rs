// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights with Burn's named
// MessagePack recorder at full precision.
//
// What gets saved:
//   1. model.mpk          — every parameter, keyed by module path
//   2. train_config.json  — the TrainConfig of the run
//
// The config is needed to rebuild a network of the right depth
// before the weights can be loaded into it.
//
// File layout:
//   <run_dir>/
//     model.mpk
//     train_config.json
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
};
use std::{fs, path::PathBuf};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::ResNet;

const MODEL_STEM:  &str = "model";
const CONFIG_FILE: &str = "train_config.json";

type ModelRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a manager rooted at `dir`, creating the directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Manager for an existing directory; nothing is created.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Full path of the weights file (the recorder adds `.mpk`).
    pub fn model_path(&self) -> PathBuf {
        self.dir.join(MODEL_STEM).with_extension("mpk")
    }

    /// Save the full parameter set and return the written path.
    pub fn save_model<B: Backend>(&self, model: &ResNet<B>) -> Result<PathBuf> {
        let stem = self.dir.join(MODEL_STEM);

        ModelRecorder::new()
            .record(model.clone().into_record(), stem.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", stem.display()))?;

        let path = self.model_path();
        tracing::debug!("Saved checkpoint: '{}'", path.display());
        Ok(path)
    }

    /// Load weights into `model`, which must have the saved architecture.
    pub fn load_model<B: Backend>(&self, model: ResNet<B>, device: &B::Device) -> Result<ResNet<B>> {
        let stem = self.dir.join(MODEL_STEM);
        tracing::info!("Loading checkpoint from '{}'", self.model_path().display());

        let record = ModelRecorder::new()
            .load(stem, device)
            .with_context(|| {
                format!(
                    "Cannot load checkpoint '{}'. Have you trained the model first?",
                    self.model_path().display()
                )
            })?;

        Ok(model.load_record(record))
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join(CONFIG_FILE);

        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read config from '{}'. Make sure you have run 'train' before 'evaluate'.",
                path.display()
            )
        })?;

        Ok(serde_json::from_str(&json)?)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::ResNetConfig;
    use crate::test_utils::{backend_lock, param_snapshot};
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn weights_survive_save_and_load() {
        let _guard  = backend_lock();
        let device  = Default::default();
        let dir     = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(dir.path()).unwrap();

        TestBackend::seed(1);
        let trained: ResNet<TestBackend> = ResNetConfig::new(1).init(&device).unwrap();
        let path = manager.save_model(&trained).unwrap();
        assert!(path.exists());

        TestBackend::seed(2);
        let fresh: ResNet<TestBackend> = ResNetConfig::new(1).init(&device).unwrap();
        assert_ne!(param_snapshot(&fresh), param_snapshot(&trained));

        let restored = manager.load_model(fresh, &device).unwrap();
        assert_eq!(param_snapshot(&restored), param_snapshot(&trained));
    }

    #[test]
    fn config_round_trip() {
        let dir     = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(dir.path()).unwrap();
        let cfg     = TrainConfig { n: 5, epochs: 2, ..Default::default() };

        manager.save_config(&cfg).unwrap();
        assert_eq!(manager.load_config().unwrap(), cfg);
    }

    #[test]
    fn missing_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CheckpointManager::open(dir.path()).load_config().is_err());
    }
}
