use burn::data::dataset::Dataset;
use std::sync::Arc;

use crate::domain::image::LabeledImage;

/// One split of labelled images, served to Burn's DataLoader.
/// Cloning shares the images, so the same split can back a
/// training loader and an evaluation loader.
#[derive(Clone)]
pub struct ImageDataset {
    images: Arc<Vec<LabeledImage>>,
}

impl ImageDataset {
    pub fn new(images: Vec<LabeledImage>) -> Self { Self { images: Arc::new(images) } }

    pub fn sample_count(&self) -> usize { self.images.len() }
}

impl Dataset<LabeledImage> for ImageDataset {
    fn get(&self, index: usize) -> Option<LabeledImage> {
        self.images.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.images.len()
    }
}
