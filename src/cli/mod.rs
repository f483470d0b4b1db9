// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with `clap`.
// All work is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`    — trains a ResNet and records the run
//   2. `evaluate` — reloads a run's weights and scores them
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "resnet-cifar",
    version = "0.1.0",
    about = "Train deep residual networks on CIFAR-10 and evaluate saved runs."
)]
pub struct Cli {
    /// The subcommand to run (train or evaluate)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training: n={}, dataset={:?}", args.n, args.dataset);
    let run_dir = args.run_dir.clone();
    TrainUseCase::new(args.into()).execute()?;

    println!("Training complete. Run saved to '{run_dir}'.");
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let use_case = EvaluateUseCase::new(args.run_dir, args.device.map(Into::into), args.data_dir);
    let summary  = use_case.execute()?;

    println!(
        "\nTest loss: {:.4} | Test error: {:.2}% | Images: {}",
        summary.loss,
        summary.error() * 100.0,
        summary.samples,
    );
    Ok(())
}
