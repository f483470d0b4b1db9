// ============================================================
// Layer 4 — Image Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<LabeledImage>
// into a 4-D image tensor and a 1-D label tensor.
//
// How batching works here:
//   Input:  Vec of N LabeledImages, each 3×32×32 bytes
//   Output: ImageBatch with images [N, 3, 32, 32] and labels [N]
//
// Every image is normalised; the training batcher additionally
// applies a random padded crop. The crop RNG lives behind a
// mutex so the batcher can stay `&self` as Burn requires, and
// is seeded once so augmentations repeat across runs.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};
use rand::{rngs::StdRng, SeedableRng};
use std::sync::{Arc, Mutex};

use crate::data::preprocessor::{Normalization, RandomCrop};
use crate::domain::image::{LabeledImage, IMAGE_CHANNELS, IMAGE_SIDE};

// ─── ImageBatch ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct ImageBatch<B: Backend> {
    /// Normalised pixels — shape: [batch_size, 3, 32, 32]
    pub images: Tensor<B, 4>,

    /// Class indices — shape: [batch_size]
    pub labels: Tensor<B, 1, Int>,
}

impl<B: Backend> ImageBatch<B> {
    pub fn len(&self) -> usize {
        self.labels.dims()[0]
    }
}

#[derive(Clone, Debug)]
struct Augmentation {
    crop: RandomCrop,
    rng:  Arc<Mutex<StdRng>>,
}

// ─── ImageBatcher ─────────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct ImageBatcher<B: Backend> {
    /// The device to create tensors on
    pub device:        B::Device,
    normalization:     Normalization,
    augmentation:      Option<Augmentation>,
}

impl<B: Backend> ImageBatcher<B> {
    /// Batcher for evaluation: normalisation only
    pub fn new(device: B::Device) -> Self {
        Self { device, normalization: Normalization::default(), augmentation: None }
    }

    /// Batcher for training: normalisation plus a seeded random crop
    pub fn augmented(device: B::Device, padding: usize, seed: u64) -> Self {
        let augmentation = Augmentation {
            crop: RandomCrop::new(padding),
            rng:  Arc::new(Mutex::new(StdRng::seed_from_u64(seed))),
        };
        Self { augmentation: Some(augmentation), ..Self::new(device) }
    }

    fn prepare(&self, image: &LabeledImage) -> Vec<f32> {
        let normalised = self.normalization.apply(&image.pixels);
        match &self.augmentation {
            Some(aug) => {
                // A poisoned lock only means another batch panicked;
                // the RNG state itself is still valid.
                let mut rng = aug.rng.lock().unwrap_or_else(|e| e.into_inner());
                aug.crop.apply(&normalised, &mut *rng)
            }
            None => normalised,
        }
    }
}

impl<B: Backend> Batcher<LabeledImage, ImageBatch<B>> for ImageBatcher<B> {
    fn batch(&self, items: Vec<LabeledImage>) -> ImageBatch<B> {
        let batch_size = items.len();

        let pixels: Vec<f32> = items
            .iter()
            .flat_map(|item| self.prepare(item))
            .collect();

        let labels: Vec<i64> = items
            .iter()
            .map(|item| item.label as i64)
            .collect();

        let images = Tensor::<B, 4>::from_data(
            TensorData::new(pixels, [batch_size, IMAGE_CHANNELS, IMAGE_SIDE, IMAGE_SIDE]),
            &self.device,
        );
        let labels = Tensor::<B, 1, Int>::from_data(
            TensorData::new(labels, [batch_size]),
            &self.device,
        );

        ImageBatch { images, labels }
    }
}
