// ============================================================
// Layer 5 — Multi-step Learning-rate Schedule
// ============================================================
// lr(epoch) = base_lr × gamma^k, where k is the number of
// milestones already reached (milestone <= epoch).
//
// With the CIFAR defaults (base 0.1, milestones 82 and 123,
// gamma 0.1) that is 0.1 → 0.01 → 0.001, i.e. the
// "divide by 10 at 32k and 48k iterations" schedule of the
// paper expressed in epochs of 391 batches.
//
// The schedule is stepped once per epoch, after that epoch's
// metrics have been logged.

use burn::LearningRate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiStepLr {
    base_lr:    LearningRate,
    milestones: Vec<usize>,
    gamma:      f64,
    epoch:      usize,
}

impl MultiStepLr {
    pub fn new(base_lr: LearningRate, milestones: Vec<usize>, gamma: f64) -> Self {
        Self { base_lr, milestones, gamma, epoch: 0 }
    }

    /// Learning rate in effect during `epoch`.
    pub fn lr_at(&self, epoch: usize) -> LearningRate {
        let reached = self.milestones.iter().filter(|&&m| m <= epoch).count();
        self.base_lr * self.gamma.powi(reached as i32)
    }

    /// Learning rate for the current epoch.
    pub fn current(&self) -> LearningRate {
        self.lr_at(self.epoch)
    }

    /// Advance to the next epoch and return its learning rate.
    pub fn step(&mut self) -> LearningRate {
        let before = self.current();
        self.epoch += 1;
        let after = self.current();
        if after != before {
            tracing::info!("Learning rate decayed to {} at epoch {}", after, self.epoch);
        }
        after
    }

    pub fn epoch(&self) -> usize {
        self.epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-12 * b.abs().max(1.0)
    }

    #[test]
    fn default_cifar_milestones() {
        let sched = MultiStepLr::new(0.1, vec![82, 123], 0.1);
        assert!(close(sched.lr_at(0), 0.1));
        assert!(close(sched.lr_at(81), 0.1));
        assert!(close(sched.lr_at(82), 0.01));
        assert!(close(sched.lr_at(122), 0.01));
        assert!(close(sched.lr_at(123), 0.001));
        assert!(close(sched.lr_at(163), 0.001));
    }

    #[test]
    fn stepping_walks_through_the_schedule() {
        let mut sched = MultiStepLr::new(1.0, vec![2, 4], 0.5);
        let mut seen = vec![sched.current()];
        for _ in 0..5 {
            seen.push(sched.step());
        }
        assert_eq!(seen, [1.0, 1.0, 0.5, 0.5, 0.25, 0.25]);
        assert_eq!(sched.epoch(), 5);
    }

    #[test]
    fn no_milestones_keeps_base_rate() {
        let sched = MultiStepLr::new(0.05, Vec::new(), 0.1);
        assert_eq!(sched.lr_at(1000), 0.05);
    }
}
