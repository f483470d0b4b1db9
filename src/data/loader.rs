// ============================================================
// Layer 4 — CIFAR-10 Loader
// ============================================================
// Reads the "binary version" of CIFAR-10 from a directory.
//
// Expected layout (as extracted from cifar-10-binary.tar.gz):
//   <dir>/
//     data_batch_1.bin … data_batch_5.bin   ← 50 000 train images
//     test_batch.bin                         ← 10 000 test images
//
// Each file is a flat sequence of 3073-byte records:
//   byte 0        label (0..=9)
//   bytes 1..3073 pixels, 1024 red then 1024 green then 1024 blue,
//                 each plane row-major
//
// That CHW order is exactly the tensor layout the model wants,
// so records are kept as-is.
//
// Reference: https://www.cs.toronto.edu/~kriz/cifar.html
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

use crate::domain::errors::DataError;
use crate::domain::image::{LabeledImage, Split, IMAGE_BYTES, NUM_CLASSES};
use crate::domain::traits::ImageSource;

/// Size of one on-disk record: label byte + pixels
pub const RECORD_BYTES: usize = 1 + IMAGE_BYTES;

const TRAIN_FILES: [&str; 5] = [
    "data_batch_1.bin",
    "data_batch_2.bin",
    "data_batch_3.bin",
    "data_batch_4.bin",
    "data_batch_5.bin",
];
const TEST_FILES: [&str; 1] = ["test_batch.bin"];

/// Loads CIFAR-10 binary batch files from a directory.
pub struct Cifar10Loader {
    dir: PathBuf,
}

impl Cifar10Loader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn files(split: Split) -> &'static [&'static str] {
        match split {
            Split::Train => &TRAIN_FILES,
            Split::Test  => &TEST_FILES,
        }
    }
}

impl ImageSource for Cifar10Loader {
    fn load_split(&self, split: Split) -> Result<Vec<LabeledImage>> {
        let mut images = Vec::new();

        for name in Self::files(split) {
            let path = self.dir.join(name);
            if !path.exists() {
                return Err(DataError::MissingFile(path.display().to_string()).into());
            }

            let bytes = fs::read(&path)
                .with_context(|| format!("Cannot read '{}'", path.display()))?;
            let records = parse_records(&bytes, name)?;
            tracing::debug!("Loaded {} images from '{}'", records.len(), path.display());
            images.extend(records);
        }

        tracing::info!("Loaded {} {} images from '{}'", images.len(), split, self.dir.display());
        Ok(images)
    }
}

/// Decode a whole batch file. Any trailing partial record or
/// out-of-range label makes the file invalid.
pub fn parse_records(bytes: &[u8], file: &str) -> Result<Vec<LabeledImage>, DataError> {
    if bytes.len() % RECORD_BYTES != 0 {
        return Err(DataError::TruncatedRecord {
            file:   file.to_string(),
            len:    bytes.len(),
            record: RECORD_BYTES,
        });
    }

    bytes
        .chunks_exact(RECORD_BYTES)
        .map(|record| {
            let label = record[0];
            if label as usize >= NUM_CLASSES {
                return Err(DataError::LabelOutOfRange {
                    file:    file.to_string(),
                    label,
                    classes: NUM_CLASSES,
                });
            }
            Ok(LabeledImage::new(record[1..].to_vec(), label))
        })
        .collect()
}
