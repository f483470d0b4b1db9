// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types and traits describing a training run:
// what a metrics record looks like, what an experiment
// tracker must accept, and which errors can stop a run
// before any tensor is allocated.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Configuration and data errors
pub mod errors;

// A labelled 32×32 RGB image and the dataset split names
pub mod image;

// Per-epoch metrics record and watch statistics
pub mod metrics;

// The run lifecycle state machine
pub mod phase;

// Core abstractions (traits) that other layers implement
pub mod traits;
