// ============================================================
// Layer 3 — Run Phase
// ============================================================
// A training run moves through a fixed sequence of phases:
//
//   Uninitialized → Configured → Training ⇄ Evaluating
//                                    └──────→ Checkpointed → Done
//
// Training → Checkpointed is only taken once the last epoch has
// been evaluated and logged, i.e. from Evaluating.

use anyhow::{bail, Result};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Uninitialized,
    Configured,
    Training,
    Evaluating,
    Checkpointed,
    Done,
}

impl RunPhase {
    /// Whether `next` may follow `self`.
    pub fn can_advance_to(self, next: RunPhase) -> bool {
        use RunPhase::*;
        matches!(
            (self, next),
            (Uninitialized, Configured)
                | (Configured, Training)
                | (Training, Evaluating)
                | (Evaluating, Training)
                | (Evaluating, Checkpointed)
                | (Checkpointed, Done)
        )
    }

    /// Move to `next`, rejecting transitions the lifecycle does not allow.
    pub fn advance(&mut self, next: RunPhase) -> Result<()> {
        if !self.can_advance_to(next) {
            bail!("illegal run phase transition {self} -> {next}");
        }
        tracing::debug!("run phase: {} -> {}", self, next);
        *self = next;
        Ok(())
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunPhase::Uninitialized => "uninitialized",
            RunPhase::Configured    => "configured",
            RunPhase::Training      => "training",
            RunPhase::Evaluating    => "evaluating",
            RunPhase::Checkpointed  => "checkpointed",
            RunPhase::Done          => "done",
        };
        f.write_str(name)
    }
}
