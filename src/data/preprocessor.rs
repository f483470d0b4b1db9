// ============================================================
// Layer 4 — Image Preprocessor
// ============================================================
// Turns raw CHW bytes into model-ready floats.
//
// Two steps, in this order:
//   1. normalise: x = (byte / 255 - mean) / std per channel
//   2. (train only) random crop: zero-pad the normalised image
//      by `padding` pixels on every side, then cut a window of
//      the original size at a random offset
//
// Because padding happens after normalisation, padded pixels
// are 0.0 in normalised space (mid-grey for mean = std = 0.5).
//
// Reference: He et al. (2016), §4.2 (CIFAR-10 augmentation)

use rand::Rng;

use crate::domain::image::{IMAGE_CHANNELS, IMAGE_SIDE};

/// Per-channel normalisation statistics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    pub mean: [f32; IMAGE_CHANNELS],
    pub std:  [f32; IMAGE_CHANNELS],
}

impl Default for Normalization {
    fn default() -> Self {
        Self { mean: [0.5; IMAGE_CHANNELS], std: [0.5; IMAGE_CHANNELS] }
    }
}

impl Normalization {
    /// Scale bytes to [0, 1] and standardise each channel plane.
    pub fn apply(&self, pixels: &[u8]) -> Vec<f32> {
        let plane = IMAGE_SIDE * IMAGE_SIDE;
        pixels
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                let c = i / plane;
                (p as f32 / 255.0 - self.mean[c]) / self.std[c]
            })
            .collect()
    }
}

/// Random crop with zero padding, applied to one CHW image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomCrop {
    pub padding: usize,
}

impl RandomCrop {
    pub fn new(padding: usize) -> Self {
        Self { padding }
    }

    /// Crop `image` (normalised, CHW, IMAGE_SIDE²) at a random offset.
    pub fn apply<R: Rng + ?Sized>(&self, image: &[f32], rng: &mut R) -> Vec<f32> {
        let max_offset = 2 * self.padding;
        let dy = rng.gen_range(0..=max_offset);
        let dx = rng.gen_range(0..=max_offset);
        self.crop_at(image, dy, dx)
    }

    /// Crop at a fixed offset into the padded image.
    /// (padding, padding) reproduces the input unchanged.
    pub fn crop_at(&self, image: &[f32], dy: usize, dx: usize) -> Vec<f32> {
        let side  = IMAGE_SIDE;
        let plane = side * side;
        let mut out = vec![0.0f32; image.len()];

        for c in 0..IMAGE_CHANNELS {
            for y in 0..side {
                // Row in the unpadded source image, if any
                let Some(sy) = (y + dy).checked_sub(self.padding).filter(|&sy| sy < side) else {
                    continue;
                };
                for x in 0..side {
                    let Some(sx) = (x + dx).checked_sub(self.padding).filter(|&sx| sx < side) else {
                        continue;
                    };
                    out[c * plane + y * side + x] = image[c * plane + sy * side + sx];
                }
            }
        }
        out
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::image::IMAGE_BYTES;
    use rand::{rngs::StdRng, SeedableRng};

    fn ramp() -> Vec<f32> {
        (0..IMAGE_BYTES).map(|i| i as f32 + 1.0).collect()
    }

    #[test]
    fn normalisation_maps_byte_range_to_unit_interval() {
        let mut pixels = vec![0u8; IMAGE_BYTES];
        pixels[1] = 255;
        let out = Normalization::default().apply(&pixels);
        assert_eq!(out.len(), IMAGE_BYTES);
        assert!((out[0] + 1.0).abs() < 1e-6);
        assert!((out[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn centred_crop_is_identity() {
        let img  = ramp();
        let crop = RandomCrop::new(4);
        assert_eq!(crop.crop_at(&img, 4, 4), img);
    }

    #[test]
    fn corner_crop_shifts_and_zero_fills() {
        let img  = ramp();
        let crop = RandomCrop::new(4);
        // Window starts at the top-left of the padded image:
        // first four rows and columns are padding.
        let out  = crop.crop_at(&img, 0, 0);
        assert_eq!(out[0], 0.0);
        assert_eq!(out[3 * IMAGE_SIDE + 3], 0.0);
        assert_eq!(out[4 * IMAGE_SIDE + 4], img[0]);
        assert_eq!(out[IMAGE_SIDE * IMAGE_SIDE - 1], img[27 * IMAGE_SIDE + 27]);
    }

    #[test]
    fn random_crop_is_reproducible_for_a_seed() {
        let img  = ramp();
        let crop = RandomCrop::new(4);
        let a = crop.apply(&img, &mut StdRng::seed_from_u64(3));
        let b = crop.apply(&img, &mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);
        assert_eq!(a.len(), IMAGE_BYTES);
    }
}
