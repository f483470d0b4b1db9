// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns that touch the outside world:
//
//   checkpoint.rs      — Saving and loading model weights with
//                        Burn's NamedMpkFileRecorder, plus the
//                        TrainConfig as JSON so `evaluate` can
//                        rebuild the network.
//
//   tracker.rs         — LocalTracker, the ExperimentTracker that
//                        writes a run directory (run.json,
//                        metrics.jsonl, watch.jsonl, artifacts/).
//
//   metrics.rs         — Epoch metrics as a CSV table, written by
//                        the tracker alongside metrics.jsonl.
//
//   reproducibility.rs — One seed fanned out to the backend RNG,
//                        the loader shuffle and the augmentation.
//
// Reference: Rust Book §7 (Modules)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Local run-directory experiment tracker
pub mod tracker;

/// Training metrics CSV logger
pub mod metrics;

/// Seeding of every source of randomness
pub mod reproducibility;
