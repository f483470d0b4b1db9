// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Epoch loop for the residual network with SGD + momentum and
// a multi-step learning-rate schedule.
//
//   for epoch in 0..epochs:
//     train   one shuffled, augmented pass (Autodiff backend)
//     eval    whole train split + whole test split
//             on model.valid() (inner backend, no graph)
//     log     EpochMetrics → tracker, one line to stdout
//     decay   scheduler.step()
//   save weights, register them as the "resnet" artifact
//
// Gradients are never accumulated across steps: every
// `loss.backward()` yields a fresh gradient set, which the
// optimizer consumes in `optim.step`.
//
// Reference: Burn Book §5, He et al. (2016) §4.2

use anyhow::Result;
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    nn::loss::{CrossEntropyLoss, CrossEntropyLossConfig},
    optim::{
        decay::WeightDecayConfig, momentum::MomentumConfig, GradientsParams, Optimizer, SgdConfig,
    },
    prelude::*,
    tensor::backend::AutodiffBackend,
    LearningRate,
};
use std::{path::PathBuf, sync::Arc};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{ImageBatch, ImageBatcher},
    dataset::ImageDataset,
};
use crate::domain::{
    image::{LabeledImage, Split},
    metrics::{EpochMetrics, ParameterStats},
    phase::RunPhase,
    traits::{Artifact, ExperimentTracker, WatchLog, WatchSpec},
};
use crate::infra::{checkpoint::CheckpointManager, reproducibility::Seeds};
use crate::ml::{evaluator::evaluate, model::ResNet, scheduler::MultiStepLr};

const ARTIFACT_NAME: &str = "resnet";
const ARTIFACT_KIND: &str = "model";
const ARTIFACT_DESCRIPTION: &str = "Residual Neural Network model trained on CIFAR-10 dataset.";

// ─── Data loaders ────────────────────────────────────────────────────────────
/// The three passes an epoch makes over the data.
///
/// `train` shuffles and augments; `train_eval` and `test` see the
/// images in file order, untouched, on the inner backend.
pub struct Loaders<B: AutodiffBackend> {
    pub train:      Arc<dyn DataLoader<ImageBatch<B>>>,
    pub train_eval: Arc<dyn DataLoader<ImageBatch<B::InnerBackend>>>,
    pub test:       Arc<dyn DataLoader<ImageBatch<B::InnerBackend>>>,
    pub device:     B::Device,
}

impl<B: AutodiffBackend> Loaders<B> {
    pub fn build(
        cfg:    &TrainConfig,
        seeds:  &Seeds,
        train:  Vec<LabeledImage>,
        test:   Vec<LabeledImage>,
        device: &B::Device,
    ) -> Self {
        let train = ImageDataset::new(train);
        let test  = ImageDataset::new(test);
        tracing::info!("Train samples: {}, test samples: {}", train.sample_count(), test.sample_count());
        if cfg.batch_size > train.sample_count() {
            tracing::warn!(
                "Batch size {} exceeds the {} training images; each epoch is one partial batch",
                cfg.batch_size,
                train.sample_count(),
            );
        }

        let train_batcher = ImageBatcher::<B>::augmented(device.clone(), cfg.crop_padding, seeds.augmentation);
        let train_loader  = DataLoaderBuilder::new(train_batcher)
            .batch_size(cfg.batch_size)
            .shuffle(seeds.shuffle)
            .build(train.clone());

        let train_eval = DataLoaderBuilder::new(ImageBatcher::<B::InnerBackend>::new(device.clone()))
            .batch_size(cfg.batch_size)
            .build(train);

        let test_loader = DataLoaderBuilder::new(ImageBatcher::<B::InnerBackend>::new(device.clone()))
            .batch_size(cfg.batch_size)
            .build(test);

        Self {
            train:      train_loader,
            train_eval,
            test:       test_loader,
            device:     device.clone(),
        }
    }
}

/// Result of a completed run.
pub struct TrainedModel<B: AutodiffBackend> {
    pub model:      ResNet<B>,
    pub history:    Vec<EpochMetrics>,
    pub checkpoint: PathBuf,
}

fn optimizer_config(cfg: &TrainConfig) -> SgdConfig {
    let momentum = MomentumConfig::new()
        .with_momentum(cfg.momentum)
        .with_dampening(0.0)
        .with_nesterov(false);

    SgdConfig::new()
        .with_momentum(Some(momentum))
        .with_weight_decay(Some(WeightDecayConfig::new(cfg.weight_decay as f32)))
}

// ─── Driver ──────────────────────────────────────────────────────────────────
pub fn run_training<B, T>(
    cfg:          &TrainConfig,
    model:        ResNet<B>,
    loaders:      &Loaders<B>,
    tracker:      &mut T,
    ckpt_manager: &CheckpointManager,
) -> Result<TrainedModel<B>>
where
    B: AutodiffBackend,
    T: ExperimentTracker + ?Sized,
{
    let mut phase = RunPhase::Uninitialized;
    let mut model = model;

    // ── Configure ─────────────────────────────────────────────────────────────
    let loss_fn       = CrossEntropyLossConfig::new().init(&loaders.device);
    let mut optim     = optimizer_config(cfg).init::<B, ResNet<B>>();
    let mut scheduler = MultiStepLr::new(cfg.learning_rate, cfg.lr_milestones.clone(), cfg.lr_decay);

    let watch = (cfg.watch_every > 0).then(|| WatchSpec { log: WatchLog::All, log_freq: cfg.watch_every });
    if let Some(spec) = &watch {
        tracker.watch(spec)?;
    }
    phase.advance(RunPhase::Configured)?;

    let mut history    = Vec::with_capacity(cfg.epochs);
    let mut best_error = f64::INFINITY;
    let mut step       = 0usize;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 0..cfg.epochs {
        phase.advance(RunPhase::Training)?;
        let lr = scheduler.current();
        tracing::debug!("Epoch {} learning rate {}", scheduler.epoch(), lr);

        model = train_epoch(
            model,
            &mut optim,
            &loss_fn,
            loaders.train.as_ref(),
            lr,
            tracker,
            watch.as_ref(),
            &mut step,
        )?;

        phase.advance(RunPhase::Evaluating)?;
        let model_valid = model.valid();
        let train = evaluate(&model_valid, loaders.train_eval.as_ref(), Split::Train)?;
        let test  = evaluate(&model_valid, loaders.test.as_ref(), Split::Test)?;

        let metrics = EpochMetrics::from_accuracies(epoch, train.loss, train.accuracy, test.loss, test.accuracy);
        tracker.log_epoch(&metrics)?;

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | train_err={:.2}% | test_loss={:.4} | test_err={:.2}%",
            epoch + 1,
            cfg.epochs,
            metrics.train_loss,
            metrics.train_error * 100.0,
            metrics.test_loss,
            metrics.test_error * 100.0,
        );

        if metrics.is_improvement(best_error) {
            best_error = metrics.test_error;
            tracing::info!("New best test error {:.2}% at epoch {}", best_error * 100.0, epoch);
        }

        history.push(metrics);
        scheduler.step();
    }

    // ── Checkpoint ────────────────────────────────────────────────────────────
    let checkpoint = ckpt_manager.save_model(&model)?;
    tracker.log_artifact(&Artifact {
        name:        ARTIFACT_NAME.to_string(),
        kind:        ARTIFACT_KIND.to_string(),
        description: ARTIFACT_DESCRIPTION.to_string(),
        metadata:    serde_json::to_value(cfg)?,
        path:        checkpoint.clone(),
    })?;
    phase.advance(RunPhase::Checkpointed)?;

    phase.advance(RunPhase::Done)?;
    tracing::info!("Training complete after {} optimizer steps", step);

    Ok(TrainedModel { model, history, checkpoint })
}

#[allow(clippy::too_many_arguments)]
fn train_epoch<B, O, T>(
    mut model: ResNet<B>,
    optim:     &mut O,
    loss_fn:   &CrossEntropyLoss<B>,
    loader:    &dyn DataLoader<ImageBatch<B>>,
    lr:        LearningRate,
    tracker:   &mut T,
    watch:     Option<&WatchSpec>,
    step:      &mut usize,
) -> Result<ResNet<B>>
where
    B: AutodiffBackend,
    O: Optimizer<ResNet<B>, B>,
    T: ExperimentTracker + ?Sized,
{
    for batch in loader.iter() {
        let scores = model.forward(batch.images);
        let loss   = loss_fn.forward(scores, batch.labels);

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &model);
        *step += 1;

        if let Some(spec) = watch {
            if *step % spec.log_freq == 0 {
                tracker.log_parameters(*step, &watch_stats(&model, &grads, spec.log))?;
            }
        }

        model = optim.step(lr, model, grads);
    }
    Ok(model)
}

/// Weight and gradient norms of every parameter, before the update.
fn watch_stats<B: AutodiffBackend>(
    model: &ResNet<B>,
    grads: &GradientsParams,
    log:   WatchLog,
) -> Vec<ParameterStats> {
    model
        .named_params()
        .into_iter()
        .map(|(name, param)| ParameterStats {
            weight_norm: log.parameters().then(|| param.l2_norm()),
            grad_norm:   if log.gradients() { param.grad_l2_norm(grads) } else { None },
            name,
        })
        .collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::{DatasetKind, DeviceKind};
    use crate::domain::traits::ImageSource;
    use crate::infra::reproducibility::seed_everything;
    use crate::test_utils::{backend_lock, param_snapshot, RecordingTracker};
    use burn::backend::{Autodiff, NdArray};
    use burn::module::Param;
    use std::path::Path;

    type TestBackend = Autodiff<NdArray>;

    #[derive(Module, Debug)]
    struct Scalar<B: Backend> {
        w: Param<Tensor<B, 1>>,
    }

    impl<B: Backend> Scalar<B> {
        fn value(&self) -> f32 {
            self.w.val().into_data().to_vec::<f32>().unwrap()[0]
        }
    }

    fn tiny_config() -> TrainConfig {
        TrainConfig {
            n:               1,
            batch_size:      8,
            learning_rate:   0.05,
            epochs:          2,
            lr_milestones:   vec![1],
            dataset:         DatasetKind::Synthetic,
            synthetic_train: 24,
            synthetic_test:  8,
            device:          DeviceKind::Cpu,
            watch_every:     2,
            seed:            7,
            ..TrainConfig::default()
        }
    }

    struct Run {
        initial: Vec<(String, Vec<f32>)>,
        trained: TrainedModel<TestBackend>,
        tracker: RecordingTracker,
    }

    // Callers hold `backend_lock` for the whole run.
    fn run_once(cfg: &TrainConfig, dir: &Path) -> Run {
        let device = Default::default();
        let seeds  = seed_everything::<TestBackend>(cfg.seed);

        let source = cfg.image_source(seeds.synthetic);
        let train  = source.load_split(Split::Train).unwrap();
        let test   = source.load_split(Split::Test).unwrap();

        let model: ResNet<TestBackend> = cfg.model_config().init(&device).unwrap();
        let initial = param_snapshot(&model);
        let loaders = Loaders::<TestBackend>::build(cfg, &seeds, train, test, &device);

        let mut tracker = RecordingTracker::default();
        let ckpt        = CheckpointManager::new(dir).unwrap();
        let trained     = run_training(cfg, model, &loaders, &mut tracker, &ckpt).unwrap();
        Run { initial, trained, tracker }
    }

    #[test]
    fn same_seed_gives_identical_runs() {
        let _guard = backend_lock();
        let cfg    = tiny_config();
        let dir    = tempfile::tempdir().unwrap();

        let a = run_once(&cfg, &dir.path().join("a"));
        let b = run_once(&cfg, &dir.path().join("b"));

        assert_eq!(a.initial, b.initial);
        assert_eq!(a.trained.history, b.trained.history);
        assert_eq!(param_snapshot(&a.trained.model), param_snapshot(&b.trained.model));
    }

    #[test]
    fn one_metrics_record_per_epoch() {
        let _guard = backend_lock();
        let cfg    = tiny_config();
        let dir    = tempfile::tempdir().unwrap();
        let run    = run_once(&cfg, dir.path());

        assert_eq!(run.trained.history.len(), cfg.epochs);
        assert_eq!(run.tracker.logs.len(), cfg.epochs);
        for (epoch, (record, logged)) in run.trained.history.iter().zip(&run.tracker.logs).enumerate() {
            assert_eq!(record.epoch, epoch);
            assert_eq!(logged, &record.to_flat());
            assert!((0.0..=1.0).contains(&record.train_error));
            assert!((0.0..=1.0).contains(&record.test_error));
            assert!(record.train_loss.is_finite() && record.test_loss.is_finite());
        }
    }

    #[test]
    fn training_updates_parameters() {
        let _guard = backend_lock();
        let dir    = tempfile::tempdir().unwrap();
        let run    = run_once(&tiny_config(), dir.path());

        assert_ne!(param_snapshot(&run.trained.model), run.initial);
    }

    #[test]
    fn watch_rows_follow_log_frequency() {
        let _guard = backend_lock();
        let dir    = tempfile::tempdir().unwrap();
        let run    = run_once(&tiny_config(), dir.path());

        // 24 samples / batch 8 = 3 steps per epoch, 6 in total
        let steps: Vec<usize> = run.tracker.param_log.iter().map(|(step, _)| *step).collect();
        assert_eq!(steps, [2, 4, 6]);
        assert_eq!(run.tracker.watch, Some(WatchSpec { log: WatchLog::All, log_freq: 2 }));

        let param_count = run.trained.model.named_params().len();
        for (_, stats) in &run.tracker.param_log {
            assert_eq!(stats.len(), param_count);
            assert!(stats.iter().all(|s| s.weight_norm.is_some() && s.grad_norm.is_some()));
        }
    }

    #[test]
    fn no_watch_when_disabled() {
        let _guard = backend_lock();
        let cfg    = TrainConfig { watch_every: 0, epochs: 1, ..tiny_config() };
        let dir    = tempfile::tempdir().unwrap();
        let run    = run_once(&cfg, dir.path());

        assert!(run.tracker.watch.is_none());
        assert!(run.tracker.param_log.is_empty());
    }

    #[test]
    fn weights_are_saved_and_logged_as_artifact() {
        let _guard = backend_lock();
        let cfg    = tiny_config();
        let dir    = tempfile::tempdir().unwrap();
        let run    = run_once(&cfg, dir.path());

        assert!(run.trained.checkpoint.exists());
        assert_eq!(run.tracker.artifacts.len(), 1);

        let artifact = &run.tracker.artifacts[0];
        assert_eq!(artifact.name, "resnet");
        assert_eq!(artifact.kind, "model");
        assert_eq!(artifact.path, run.trained.checkpoint);
        assert_eq!(artifact.metadata["n"], 1);
        assert_eq!(artifact.metadata["batch_size"], 8);
    }

    #[test]
    fn sgd_applies_weight_decay_and_undampened_momentum() {
        let cfg = TrainConfig { momentum: 0.9, weight_decay: 0.5, ..TrainConfig::default() };
        let device = Default::default();

        let mut model = Scalar::<TestBackend> {
            w: Param::from_tensor(Tensor::from_floats([2.0], &device)),
        };
        let mut optim = optimizer_config(&cfg).init::<TestBackend, Scalar<TestBackend>>();

        // loss = w, so the raw gradient is 1 at every step
        let mut values = Vec::new();
        for _ in 0..2 {
            let grads = GradientsParams::from_grads(model.w.val().sum().backward(), &model);
            model = optim.step(0.1, model, grads);
            values.push(model.value());
        }

        // g1 = 1 + 0.5 * 2.0 = 2.0         v1 = g1 = 2.0           w1 = 2.0 - 0.1 * 2.0 = 1.8
        // g2 = 1 + 0.5 * 1.8 = 1.9         v2 = 0.9 * v1 + g2 = 3.7  w2 = 1.8 - 0.1 * 3.7 = 1.43
        assert!((values[0] - 1.8).abs() < 1e-5, "{values:?}");
        assert!((values[1] - 1.43).abs() < 1e-5, "{values:?}");
    }
}
