// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from raw image bytes to tensor batches.
//
//   CIFAR-10 .bin files / synthetic generator
//       │
//       ▼
//   Cifar10Loader / SyntheticSource → Vec<LabeledImage>
//       │
//       ▼
//   ImageDataset      → implements Burn's Dataset trait
//       │
//       ▼
//   ImageBatcher      → normalise, (train) random crop, stack
//       │
//       ▼
//   DataLoader        → feeds batches to the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads the CIFAR-10 binary batch files
pub mod loader;

/// Deterministic CIFAR-shaped images for smoke runs and tests
pub mod synthetic;

/// Normalisation and random-crop augmentation
pub mod preprocessor;

/// Implements Burn's Dataset trait for labelled images
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
