// ============================================================
// Layer 3 — Metrics Records
// ============================================================
// The per-epoch metrics bundle handed to the tracker, and the
// parameter statistics recorded at watch steps.
//
// Keys of the flat mapping follow the "split/metric" layout:
//   epoch, train/loss, train/error, test/loss, test/error

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of metrics for a single epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Zero-based epoch index
    pub epoch: usize,

    /// Mean cross-entropy over the whole training split
    pub train_loss: f64,

    /// 1 - training accuracy
    pub train_error: f64,

    /// Mean cross-entropy over the whole test split
    pub test_loss: f64,

    /// 1 - test accuracy
    pub test_error: f64,
}

impl EpochMetrics {
    /// Build a record from the two evaluation passes of an epoch.
    pub fn from_accuracies(
        epoch:          usize,
        train_loss:     f64,
        train_accuracy: f64,
        test_loss:      f64,
        test_accuracy:  f64,
    ) -> Self {
        Self {
            epoch,
            train_loss,
            train_error: 1.0 - train_accuracy,
            test_loss,
            test_error: 1.0 - test_accuracy,
        }
    }

    /// Flatten into the key → scalar mapping the tracker consumes.
    pub fn to_flat(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("epoch".to_string(),       self.epoch as f64),
            ("train/loss".to_string(),  self.train_loss),
            ("train/error".to_string(), self.train_error),
            ("test/loss".to_string(),   self.test_loss),
            ("test/error".to_string(),  self.test_error),
        ])
    }

    /// Returns true if this epoch beat the previous best test error
    pub fn is_improvement(&self, best_test_error: f64) -> bool {
        self.test_error < best_test_error
    }
}

/// L2 norms of one named parameter tensor and its gradient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterStats {
    pub name: String,

    /// None when parameters are not part of the watch
    pub weight_norm: Option<f64>,

    /// None when gradients are not part of the watch, or the
    /// parameter received no gradient in this step
    pub grad_norm: Option<f64>,
}
