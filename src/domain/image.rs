// ============================================================
// Layer 3 — Labelled Image Domain Type
// ============================================================
// One CIFAR-10 sample: 32×32 RGB pixels stored channel-major
// (all red, then all green, then all blue), plus its class.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const IMAGE_SIDE:     usize = 32;
pub const IMAGE_CHANNELS: usize = 3;
pub const IMAGE_BYTES:    usize = IMAGE_CHANNELS * IMAGE_SIDE * IMAGE_SIDE;
pub const NUM_CLASSES:    usize = 10;

/// A raw image with its label. Pixels are untouched bytes;
/// scaling and normalisation happen in the batcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledImage {
    /// CHW layout, length IMAGE_BYTES
    pub pixels: Vec<u8>,
    pub label:  u8,
}

impl LabeledImage {
    pub fn new(pixels: Vec<u8>, label: u8) -> Self {
        debug_assert_eq!(pixels.len(), IMAGE_BYTES);
        Self { pixels, label }
    }
}

/// Which half of the dataset a sample belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Test,
}

impl Split {
    pub fn name(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Test  => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
