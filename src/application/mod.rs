// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only: pick the backend, wire the data,
// model, tracker and checkpoint layers together, and hand the
// actual work to them.
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Train a network and record the run
pub mod train_use_case;

// Reload a finished run and score its weights
pub mod evaluate_use_case;
