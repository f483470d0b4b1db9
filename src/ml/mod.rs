// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Everything that builds, trains or evaluates the network.
//
//   model.rs      — ResNet-(6n+2): stem, three residual stages,
//                   global pooling and a linear classifier
//
//   scheduler.rs  — Multi-step learning-rate decay, stepped
//                   once per epoch
//
//   evaluator.rs  — Read-only loss/accuracy pass over a split
//
//   trainer.rs    — The epoch loop: SGD updates, per-epoch
//                   evaluation, tracker logging, checkpoint
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            He et al. (2016) Deep Residual Learning

/// Residual network architecture
pub mod model;

/// Learning-rate schedule
pub mod scheduler;

/// Loss and accuracy over a whole split
pub mod evaluator;

/// Training driver
pub mod trainer;
