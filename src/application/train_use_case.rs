// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a full training run in order:
//
//   Step 1: Validate the configuration      (fail before any work)
//   Step 2: Seed every RNG                  (Layer 6 - infra)
//   Step 3: Load the train and test splits  (Layer 4 - data)
//   Step 4: Build model and data loaders    (Layer 5 - ml)
//   Step 5: Open the run / tracker          (Layer 6 - infra)
//   Step 6: Save config for evaluation      (Layer 6 - infra)
//   Step 7: Run the epoch loop + checkpoint (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use anyhow::Result;
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, Autodiff, NdArray, Wgpu},
    module::Module,
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};

use crate::data::{loader::Cifar10Loader, synthetic::SyntheticSource};
use crate::domain::{
    errors::ConfigError,
    image::{Split, NUM_CLASSES},
    traits::{ExperimentTracker, ImageSource},
};
use crate::infra::{
    checkpoint::CheckpointManager,
    reproducibility::seed_everything,
    tracker::LocalTracker,
};
use crate::ml::{
    model::ResNetConfig,
    trainer::{run_training, Loaders, TrainedModel},
};

// ─── Data source / device selection ──────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    /// CIFAR-10 binary batches under `data_dir`
    Cifar10,
    /// Generated images, no files needed
    Synthetic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Wgpu,
    /// NdArray on the CPU; bit-reproducible
    Cpu,
}

// ─── Training Configuration ──────────────────────────────────────────────────
// Every setting of a run. Built once from the CLI, validated,
// then passed by reference; nothing writes to it afterwards.
// Saved as JSON in the run directory so `evaluate` can rebuild
// the same network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    // Hyperparameters
    pub n:             usize,
    pub batch_size:    usize,
    pub learning_rate: f64,
    pub epochs:        usize,
    pub weight_decay:  f64,
    pub momentum:      f64,

    // Schedule
    pub lr_milestones: Vec<usize>,
    pub lr_decay:      f64,

    // Data
    pub dataset:         DatasetKind,
    pub data_dir:        String,
    pub crop_padding:    usize,
    pub synthetic_train: usize,
    pub synthetic_test:  usize,

    // Run
    pub seed:        u64,
    pub device:      DeviceKind,
    pub project:     String,
    pub run_dir:     String,
    pub watch_every: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            n:             3,
            batch_size:    128,
            learning_rate: 0.1,
            epochs:        164,
            weight_decay:  1e-4,
            momentum:      0.9,

            lr_milestones: vec![82, 123],
            lr_decay:      0.1,

            dataset:         DatasetKind::Cifar10,
            data_dir:        "data/cifar-10-batches-bin".to_string(),
            crop_padding:    4,
            synthetic_train: 512,
            synthetic_test:  128,

            seed:        42,
            device:      DeviceKind::Wgpu,
            project:     "resnet".to_string(),
            run_dir:     "runs/resnet".to_string(),
            watch_every: 10,
        }
    }
}

impl TrainConfig {
    /// Check every hyperparameter before anything is allocated.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n < 1 {
            return Err(ConfigError::DepthTooSmall(self.n));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.epochs == 0 {
            return Err(ConfigError::ZeroEpochs);
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(ConfigError::InvalidLearningRate(self.learning_rate));
        }
        // Written so that NaN fails too
        if !(self.weight_decay >= 0.0) {
            return Err(ConfigError::NegativeWeightDecay(self.weight_decay));
        }
        if !(0.0..1.0).contains(&self.momentum) {
            return Err(ConfigError::MomentumOutOfRange(self.momentum));
        }
        if !(self.lr_decay > 0.0 && self.lr_decay <= 1.0) {
            return Err(ConfigError::InvalidLrDecay(self.lr_decay));
        }
        if self.lr_milestones.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConfigError::UnsortedMilestones(self.lr_milestones.clone()));
        }
        Ok(())
    }

    pub fn model_config(&self) -> ResNetConfig {
        ResNetConfig::new(self.n).with_num_classes(NUM_CLASSES)
    }

    /// The image source selected by `dataset`.
    pub fn image_source(&self, seed: u64) -> Box<dyn ImageSource> {
        match self.dataset {
            DatasetKind::Cifar10   => Box::new(Cifar10Loader::new(&self.data_dir)),
            DatasetKind::Synthetic => Box::new(SyntheticSource::new(self.synthetic_train, self.synthetic_test, seed)),
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline on the configured device.
    pub fn execute(&self) -> Result<()> {
        // ── Step 1: Fail fast on bad hyperparameters ─────────────────────────
        self.config.validate()?;

        match self.config.device {
            DeviceKind::Wgpu => {
                let device = WgpuDevice::default();
                tracing::info!("Using WGPU device: {:?}", device);
                self.run::<Autodiff<Wgpu>>(device)
            }
            DeviceKind::Cpu => {
                tracing::info!("Using NdArray CPU backend");
                self.run::<Autodiff<NdArray>>(NdArrayDevice::Cpu)
            }
        }
    }

    fn run<B: AutodiffBackend>(&self, device: B::Device) -> Result<()> {
        let cfg = &self.config;

        // ── Step 2: Seed before any model or data construction ────────────────
        let seeds = seed_everything::<B>(cfg.seed);

        // ── Step 3: Load both splits ──────────────────────────────────────────
        let source = cfg.image_source(seeds.synthetic);
        let train  = source.load_split(Split::Train)?;
        let test   = source.load_split(Split::Test)?;
        tracing::info!("Split: {} train, {} test", train.len(), test.len());

        // ── Step 4: Model and loaders ─────────────────────────────────────────
        let model   = cfg.model_config().init::<B>(&device)?;
        let loaders = Loaders::<B>::build(cfg, &seeds, train, test, &device);
        tracing::info!(
            "Model ready: ResNet-{} ({} blocks, {} parameters)",
            model.depth(),
            model.block_count(),
            model.num_params(),
        );

        // ── Step 5: Open the run ──────────────────────────────────────────────
        let mut tracker = LocalTracker::init(&cfg.project, &cfg.run_dir, serde_json::to_value(cfg)?)?;

        // ── Step 6: Save config for `evaluate` ────────────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.run_dir)?;
        ckpt_manager.save_config(cfg)?;

        // ── Step 7: Train, evaluate, checkpoint ───────────────────────────────
        let outcome = run_training(cfg, model, &loaders, &mut tracker, &ckpt_manager);
        let TrainedModel { model, history, checkpoint } = match outcome {
            Ok(trained) => trained,
            Err(e) => {
                tracker.fail(&e)?;
                return Err(e);
            }
        };
        tracker.finish()?;

        if let Some(last) = history.last() {
            tracing::info!(
                "Run '{}' finished ResNet-{} after {} epochs: test error {:.2}%, weights at '{}'",
                tracker.info().run_id,
                model.depth(),
                history.len(),
                last.test_error * 100.0,
                checkpoint.display(),
            );
        }
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_cifar_recipe() {
        let cfg = TrainConfig::default();
        assert_eq!(cfg.n, 3);
        assert_eq!(cfg.batch_size, 128);
        assert_eq!(cfg.epochs, 164);
        assert_eq!(cfg.lr_milestones, [82, 123]);
        assert_eq!(cfg.seed, 42);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_depth_fails_validation() {
        let cfg = TrainConfig { n: 0, ..Default::default() };
        assert_eq!(cfg.validate(), Err(ConfigError::DepthTooSmall(0)));
    }

    #[test]
    fn momentum_of_one_is_rejected() {
        let cfg = TrainConfig { momentum: 1.0, ..Default::default() };
        assert_eq!(cfg.validate(), Err(ConfigError::MomentumOutOfRange(1.0)));
    }

    #[test]
    fn other_invalid_values_are_rejected() {
        let bad = [
            TrainConfig { batch_size: 0, ..Default::default() },
            TrainConfig { epochs: 0, ..Default::default() },
            TrainConfig { learning_rate: 0.0, ..Default::default() },
            TrainConfig { weight_decay: -1e-4, ..Default::default() },
            TrainConfig { lr_decay: 0.0, ..Default::default() },
            TrainConfig { lr_milestones: vec![123, 82], ..Default::default() },
        ];
        for cfg in bad {
            assert!(cfg.validate().is_err(), "{cfg:?} should be invalid");
        }
    }

    #[test]
    fn config_round_trips_through_json() {
        let cfg  = TrainConfig { dataset: DatasetKind::Synthetic, ..Default::default() };
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains("\"synthetic\""));
        assert_eq!(serde_json::from_str::<TrainConfig>(&json).unwrap(), cfg);
    }

    #[test]
    fn invalid_config_stops_before_touching_the_disk() {
        let dir = tempfile::tempdir().unwrap();
        let run_dir = dir.path().join("run");
        let cfg = TrainConfig {
            n:       0,
            run_dir: run_dir.display().to_string(),
            device:  DeviceKind::Cpu,
            ..Default::default()
        };
        assert!(TrainUseCase::new(cfg).execute().is_err());
        assert!(!run_dir.exists());
    }
}
