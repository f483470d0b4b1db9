// ============================================================
// Layer 5 — Evaluator
// ============================================================
// A read-only pass over one whole split.
//
//   loss     = Σ (mean batch loss × batch size) / split size
//   accuracy = #(argmax score == label) / split size
//
// The model is taken by shared reference on a plain (non-autodiff)
// backend: in training this is `model.valid()`, so no graph is
// recorded and no parameter can change.

use anyhow::Result;
use burn::{
    data::dataloader::DataLoader,
    nn::loss::CrossEntropyLossConfig,
    prelude::*,
};

use crate::data::batcher::ImageBatch;
use crate::domain::errors::DataError;
use crate::domain::image::Split;
use crate::ml::model::ResNet;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalSummary {
    pub loss:     f64,
    pub accuracy: f64,
    pub samples:  usize,
}

impl EvalSummary {
    pub fn error(&self) -> f64 {
        1.0 - self.accuracy
    }
}

pub fn evaluate<B: Backend>(
    model:  &ResNet<B>,
    loader: &dyn DataLoader<ImageBatch<B>>,
    split:  Split,
) -> Result<EvalSummary> {
    let mut loss_sum = 0.0f64;
    let mut correct  = 0usize;
    let mut samples  = 0usize;

    for batch in loader.iter() {
        let batch_len = batch.len();
        let scores    = model.forward(batch.images);

        let ce = CrossEntropyLossConfig::new().init(&scores.device());
        let batch_loss: f64 = ce
            .forward(scores.clone(), batch.labels.clone())
            .into_scalar()
            .elem::<f64>();
        loss_sum += batch_loss * batch_len as f64;

        // argmax(1) returns shape [batch, 1] — flatten to [batch]
        let predicted = scores.argmax(1).flatten::<1>(0, 1);
        let hits: i64 = predicted
            .equal(batch.labels)
            .int()
            .sum()
            .into_scalar()
            .elem::<i64>();

        correct += hits as usize;
        samples += batch_len;
    }

    if samples == 0 {
        return Err(DataError::EmptySplit(split.name()).into());
    }

    let summary = EvalSummary {
        loss:     loss_sum / samples as f64,
        accuracy: correct as f64 / samples as f64,
        samples,
    };
    tracing::debug!("Evaluated {} split: {:?}", split, summary);
    Ok(summary)
}
