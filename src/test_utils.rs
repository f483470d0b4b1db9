// Shared helpers for the unit tests.

use anyhow::Result;
use burn::prelude::*;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::domain::metrics::ParameterStats;
use crate::domain::traits::{Artifact, ExperimentTracker, WatchSpec};
use crate::ml::model::ResNet;

static BACKEND_RNG: Mutex<()> = Mutex::new(());

/// The NdArray backend RNG is process-global. Tests that seed it or
/// initialise models hold this guard so parallel tests cannot draw
/// from the stream in between.
pub fn backend_lock() -> MutexGuard<'static, ()> {
    BACKEND_RNG.lock().unwrap_or_else(|e| e.into_inner())
}

/// Every parameter value of `model`, by name.
pub fn param_snapshot<B: Backend>(model: &ResNet<B>) -> Vec<(String, Vec<f32>)> {
    model
        .named_params()
        .into_iter()
        .map(|(name, param)| (name, param.flat().into_data().convert::<f32>().to_vec::<f32>().unwrap()))
        .collect()
}

/// Tracker that keeps everything in memory.
#[derive(Debug, Default)]
pub struct RecordingTracker {
    pub watch:     Option<WatchSpec>,
    pub param_log: Vec<(usize, Vec<ParameterStats>)>,
    pub logs:      Vec<BTreeMap<String, f64>>,
    pub artifacts: Vec<Artifact>,
    pub finished:  bool,
}

impl ExperimentTracker for RecordingTracker {
    fn watch(&mut self, spec: &WatchSpec) -> Result<()> {
        self.watch = Some(spec.clone());
        Ok(())
    }

    fn log_parameters(&mut self, step: usize, stats: &[ParameterStats]) -> Result<()> {
        self.param_log.push((step, stats.to_vec()));
        Ok(())
    }

    fn log(&mut self, values: &BTreeMap<String, f64>) -> Result<()> {
        self.logs.push(values.clone());
        Ok(())
    }

    fn log_artifact(&mut self, artifact: &Artifact) -> Result<()> {
        self.artifacts.push(artifact.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}
