// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `evaluate`, and
// all their configurable flags. Defaults are the CIFAR-10
// recipe of He et al. (2016).
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};

use crate::application::train_use_case::{DatasetKind, DeviceKind, TrainConfig};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a ResNet-(6n+2) on CIFAR-10
    Train(TrainArgs),

    /// Score the saved weights of a finished run on the test split
    Evaluate(EvaluateArgs),
}

/// Where training images come from
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DatasetArg {
    Cifar10,
    Synthetic,
}

impl From<DatasetArg> for DatasetKind {
    fn from(d: DatasetArg) -> Self {
        match d {
            DatasetArg::Cifar10   => DatasetKind::Cifar10,
            DatasetArg::Synthetic => DatasetKind::Synthetic,
        }
    }
}

/// Compute backend
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceArg {
    Wgpu,
    Cpu,
}

impl From<DeviceArg> for DeviceKind {
    fn from(d: DeviceArg) -> Self {
        match d {
            DeviceArg::Wgpu => DeviceKind::Wgpu,
            DeviceArg::Cpu  => DeviceKind::Cpu,
        }
    }
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Blocks per stage; the network has 6n+2 layers
    #[arg(short, long, default_value_t = 3)]
    pub n: usize,

    #[arg(long, default_value_t = 128)]
    pub batch_size: usize,

    /// Initial learning rate
    #[arg(long, default_value_t = 0.1)]
    pub learning_rate: f64,

    #[arg(long, default_value_t = 164)]
    pub epochs: usize,

    /// L2 penalty applied through the optimizer
    #[arg(long, default_value_t = 1e-4)]
    pub weight_decay: f64,

    #[arg(long, default_value_t = 0.9)]
    pub momentum: f64,

    /// Epochs at which the learning rate is multiplied by --lr-decay
    #[arg(long, value_delimiter = ',', default_values_t = [82, 123])]
    pub lr_milestones: Vec<usize>,

    #[arg(long, default_value_t = 0.1)]
    pub lr_decay: f64,

    #[arg(long, value_enum, default_value_t = DatasetArg::Cifar10)]
    pub dataset: DatasetArg,

    /// Directory holding data_batch_1.bin .. data_batch_5.bin and test_batch.bin
    #[arg(long, default_value = "data/cifar-10-batches-bin")]
    pub data_dir: String,

    /// Zero padding around each training image before the random 32×32 crop
    #[arg(long, default_value_t = 4)]
    pub crop_padding: usize,

    /// Training images generated by --dataset synthetic
    #[arg(long, default_value_t = 512)]
    pub synthetic_train: usize,

    /// Test images generated by --dataset synthetic
    #[arg(long, default_value_t = 128)]
    pub synthetic_test: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[arg(long, value_enum, default_value_t = DeviceArg::Wgpu)]
    pub device: DeviceArg,

    /// Project name recorded with the run
    #[arg(long, default_value = "resnet")]
    pub project: String,

    /// Where run metadata, metrics and weights are written
    #[arg(long, default_value = "runs/resnet")]
    pub run_dir: String,

    /// Record parameter and gradient norms every N optimizer steps (0 = off)
    #[arg(long, default_value_t = 10)]
    pub watch_every: usize,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            n:               a.n,
            batch_size:      a.batch_size,
            learning_rate:   a.learning_rate,
            epochs:          a.epochs,
            weight_decay:    a.weight_decay,
            momentum:        a.momentum,
            lr_milestones:   a.lr_milestones,
            lr_decay:        a.lr_decay,
            dataset:         a.dataset.into(),
            data_dir:        a.data_dir,
            crop_padding:    a.crop_padding,
            synthetic_train: a.synthetic_train,
            synthetic_test:  a.synthetic_test,
            seed:            a.seed,
            device:          a.device.into(),
            project:         a.project,
            run_dir:         a.run_dir,
            watch_every:     a.watch_every,
        }
    }
}

/// All arguments for the `evaluate` command
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Run directory written by `train`
    #[arg(long, default_value = "runs/resnet")]
    pub run_dir: String,

    /// Override the device the run was trained on
    #[arg(long, value_enum)]
    pub device: Option<DeviceArg>,

    /// Override the CIFAR-10 directory saved with the run
    #[arg(long)]
    pub data_dir: Option<String>,
}

#[cfg(test)]
mod tests {
    use crate::cli::Cli;
    use crate::cli::commands::Commands;
    use crate::application::train_use_case::{DatasetKind, DeviceKind, TrainConfig};
    use clap::Parser;

    #[test]
    fn train_defaults_match_config_defaults() {
        let cli = Cli::try_parse_from(["resnet-cifar", "train"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        assert_eq!(TrainConfig::from(args), TrainConfig::default());
    }

    #[test]
    fn train_flags_are_parsed() {
        let cli = Cli::try_parse_from([
            "resnet-cifar", "train",
            "-n", "5",
            "--lr-milestones", "10,20",
            "--dataset", "synthetic",
            "--device", "cpu",
        ])
        .unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg = TrainConfig::from(args);
        assert_eq!(cfg.n, 5);
        assert_eq!(cfg.lr_milestones, [10, 20]);
        assert_eq!(cfg.dataset, DatasetKind::Synthetic);
        assert_eq!(cfg.device, DeviceKind::Cpu);
    }

    #[test]
    fn evaluate_overrides_are_optional() {
        let cli = Cli::try_parse_from(["resnet-cifar", "evaluate", "--run-dir", "runs/x"]).unwrap();
        let Commands::Evaluate(args) = cli.command else { panic!("expected evaluate") };
        assert_eq!(args.run_dir, "runs/x");
        assert!(args.device.is_none());
        assert!(args.data_dir.is_none());
    }
}
