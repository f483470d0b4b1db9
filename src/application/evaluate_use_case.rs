// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Re-scores the weights of a finished run on the test split:
//
//   Step 1: Read train_config.json from the run directory
//   Step 2: Rebuild the network with the same depth
//   Step 3: Load model.mpk into it
//   Step 4: One evaluation pass over the test split
//
// A synthetic run regenerates the same test images from its
// saved seed.

use anyhow::Result;
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, NdArray, Wgpu},
    data::dataloader::DataLoaderBuilder,
    tensor::backend::Backend,
};

use crate::application::train_use_case::{DeviceKind, TrainConfig};
use crate::data::{batcher::ImageBatcher, dataset::ImageDataset};
use crate::domain::image::Split;
use crate::infra::{checkpoint::CheckpointManager, reproducibility::Seeds};
use crate::ml::evaluator::{evaluate, EvalSummary};

pub struct EvaluateUseCase {
    run_dir:  String,
    device:   Option<DeviceKind>,
    data_dir: Option<String>,
}

impl EvaluateUseCase {
    /// `device` and `data_dir` override what the run was trained with.
    pub fn new(run_dir: String, device: Option<DeviceKind>, data_dir: Option<String>) -> Self {
        Self { run_dir, device, data_dir }
    }

    pub fn execute(&self) -> Result<EvalSummary> {
        // ── Step 1: Saved configuration ──────────────────────────────────────
        let ckpt    = CheckpointManager::open(&self.run_dir);
        let mut cfg = ckpt.load_config()?;
        if let Some(dir) = &self.data_dir {
            cfg.data_dir = dir.clone();
        }

        match self.device.unwrap_or(cfg.device) {
            DeviceKind::Wgpu => self.run::<Wgpu>(&cfg, &ckpt, WgpuDevice::default()),
            DeviceKind::Cpu  => self.run::<NdArray>(&cfg, &ckpt, NdArrayDevice::Cpu),
        }
    }

    fn run<B: Backend>(&self, cfg: &TrainConfig, ckpt: &CheckpointManager, device: B::Device) -> Result<EvalSummary> {
        // ── Steps 2-3: Rebuild and load ──────────────────────────────────────
        let model = cfg.model_config().init::<B>(&device)?;
        let model = ckpt.load_model(model, &device)?;

        // ── Step 4: Score the test split ─────────────────────────────────────
        let seeds  = Seeds::derive(cfg.seed);
        let test   = cfg.image_source(seeds.synthetic).load_split(Split::Test)?;
        let loader = DataLoaderBuilder::new(ImageBatcher::<B>::new(device.clone()))
            .batch_size(cfg.batch_size)
            .build(ImageDataset::new(test));

        let summary = evaluate(&model, loader.as_ref(), Split::Test)?;
        tracing::info!(
            "ResNet-{} from '{}': test loss {:.4}, test error {:.2}% over {} images",
            model.depth(),
            self.run_dir,
            summary.loss,
            summary.error() * 100.0,
            summary.samples,
        );
        Ok(summary)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::{DatasetKind, TrainUseCase};
    use crate::infra::tracker::{RunInfo, RunStatus};
    use crate::test_utils::backend_lock;
    use std::collections::BTreeMap;
    use std::fs;

    #[test]
    fn missing_run_directory_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let use_case = EvaluateUseCase::new(dir.path().join("nope").display().to_string(), Some(DeviceKind::Cpu), None);
        let err = use_case.execute().unwrap_err();
        assert!(format!("{err:#}").contains("train_config.json"));
    }

    #[test]
    fn trained_run_can_be_evaluated_again() {
        let _guard  = backend_lock();
        let dir     = tempfile::tempdir().unwrap();
        let run_dir = dir.path().join("run");

        let cfg = TrainConfig {
            n:               1,
            batch_size:      8,
            epochs:          2,
            learning_rate:   0.05,
            lr_milestones:   vec![1],
            dataset:         DatasetKind::Synthetic,
            synthetic_train: 16,
            synthetic_test:  8,
            device:          DeviceKind::Cpu,
            run_dir:         run_dir.display().to_string(),
            watch_every:     1,
            ..TrainConfig::default()
        };
        TrainUseCase::new(cfg.clone()).execute().unwrap();

        // Run directory contents
        let info: RunInfo = serde_json::from_str(&fs::read_to_string(run_dir.join("run.json")).unwrap()).unwrap();
        assert_eq!(info.status, RunStatus::Finished);
        assert_eq!(info.artifacts, ["resnet"]);
        assert!(run_dir.join("artifacts/resnet/model.mpk").exists());
        assert_eq!(fs::read_to_string(run_dir.join("metrics.csv")).unwrap().lines().count(), 3);
        assert_eq!(fs::read_to_string(run_dir.join("watch.jsonl")).unwrap().lines().count(), 4);

        let last: BTreeMap<String, f64> = serde_json::from_str(
            fs::read_to_string(run_dir.join("metrics.jsonl")).unwrap().lines().last().unwrap(),
        )
        .unwrap();

        // Re-scoring the saved weights reproduces the last epoch
        let summary = EvaluateUseCase::new(cfg.run_dir.clone(), None, None).execute().unwrap();
        assert_eq!(summary.samples, 8);
        assert!((summary.error() - last["test/error"]).abs() < 1e-9);
        assert!((summary.loss - last["test/loss"]).abs() < 1e-4);
    }
}
