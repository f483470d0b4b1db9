// ============================================================
// Layer 6 — Local Experiment Tracker
// ============================================================
// An ExperimentTracker that keeps the whole run on disk:
//
//   <run_dir>/
//     run.json           project, run id, status, timestamps,
//                        config, watch registration
//     metrics.jsonl      one flat {key: value} object per log call
//     metrics.csv        the epoch records again, as a table
//     watch.jsonl        parameter/gradient norms at watch steps
//     artifacts/<name>/  a copy of each artifact + artifact.json
//
// run.json is rewritten on every status change (write to a
// temporary file, then rename), so a crashed run is left in
// status "running" or "failed", never half-written.
//
// A directory holds one run. Starting a run in a directory used
// before drops the earlier run's logs and artifacts first.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs::{self, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use crate::domain::metrics::{EpochMetrics, ParameterStats};
use crate::domain::traits::{Artifact, ExperimentTracker, WatchSpec};
use crate::infra::metrics::MetricsLogger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Finished,
    Failed,
}

/// Contents of run.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunInfo {
    pub project:     String,
    pub run_id:      String,
    pub status:      RunStatus,
    pub started_at:  DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub config:      serde_json::Value,
    pub watch:       Option<WatchSpec>,
    pub artifacts:   Vec<String>,
    pub error:       Option<String>,
}

#[derive(Serialize)]
struct WatchRow<'a> {
    step:   usize,
    params: &'a [ParameterStats],
}

const RUN_LOGS: [&str; 3] = ["metrics.jsonl", "metrics.csv", "watch.jsonl"];
const ARTIFACT_DIR: &str = "artifacts";

pub struct LocalTracker {
    dir:  PathBuf,
    info: RunInfo,
    csv:  MetricsLogger,
}

impl LocalTracker {
    /// Start a run in `dir` and record its configuration.
    pub fn init(project: &str, dir: impl Into<PathBuf>, config: serde_json::Value) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create run directory '{}'", dir.display()))?;
        clear_previous_run(&dir)?;

        let started_at = Utc::now();
        let info = RunInfo {
            project:     project.to_string(),
            run_id:      format!("{project}-{}", started_at.format("%Y%m%d-%H%M%S")),
            status:      RunStatus::Running,
            started_at,
            finished_at: None,
            config,
            watch:       None,
            artifacts:   Vec::new(),
            error:       None,
        };
        let csv = MetricsLogger::new(&dir)?;

        let tracker = Self { dir, info, csv };
        tracker.write_info()?;
        tracing::info!("Tracking run '{}' in '{}'", tracker.info.run_id, tracker.dir.display());
        Ok(tracker)
    }

    pub fn info(&self) -> &RunInfo {
        &self.info
    }

    /// Close the run as failed, keeping the error message.
    pub fn fail(&mut self, error: &anyhow::Error) -> Result<()> {
        self.info.status      = RunStatus::Failed;
        self.info.finished_at = Some(Utc::now());
        self.info.error       = Some(format!("{error:#}"));
        self.write_info()
    }

    fn write_info(&self) -> Result<()> {
        let path = self.dir.join("run.json");
        let tmp  = path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_string_pretty(&self.info)?)
            .with_context(|| format!("Cannot write '{}'", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("Cannot replace '{}'", path.display()))?;
        Ok(())
    }

    fn append_json_line<T: Serialize>(&self, file: &str, value: &T) -> Result<()> {
        let path = self.dir.join(file);
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Cannot open '{}'", path.display()))?;
        writeln!(f, "{}", serde_json::to_string(value)?)?;
        Ok(())
    }
}

fn clear_previous_run(dir: &Path) -> Result<()> {
    for name in RUN_LOGS {
        let path = dir.join(name);
        match fs::remove_file(&path) {
            Ok(()) => tracing::warn!("Discarding '{}' from an earlier run", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e).with_context(|| format!("Cannot remove '{}'", path.display())),
        }
    }

    let artifacts = dir.join(ARTIFACT_DIR);
    if artifacts.exists() {
        fs::remove_dir_all(&artifacts)
            .with_context(|| format!("Cannot remove '{}'", artifacts.display()))?;
    }
    Ok(())
}

impl ExperimentTracker for LocalTracker {
    fn watch(&mut self, spec: &WatchSpec) -> Result<()> {
        self.info.watch = Some(spec.clone());
        tracing::debug!("Watching model: {:?} every {} steps", spec.log, spec.log_freq);
        self.write_info()
    }

    fn log_parameters(&mut self, step: usize, stats: &[ParameterStats]) -> Result<()> {
        self.append_json_line("watch.jsonl", &WatchRow { step, params: stats })
    }

    fn log(&mut self, values: &BTreeMap<String, f64>) -> Result<()> {
        self.append_json_line("metrics.jsonl", values)
    }

    fn log_epoch(&mut self, metrics: &EpochMetrics) -> Result<()> {
        self.log(&metrics.to_flat())?;
        self.csv.log(metrics)?;
        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, test_loss={:.4}",
            metrics.epoch,
            metrics.train_loss,
            metrics.test_loss,
        );
        Ok(())
    }

    fn log_artifact(&mut self, artifact: &Artifact) -> Result<()> {
        let target_dir = self.dir.join(ARTIFACT_DIR).join(&artifact.name);
        fs::create_dir_all(&target_dir)?;

        let file_name = artifact
            .path
            .file_name()
            .with_context(|| format!("Artifact path '{}' has no file name", artifact.path.display()))?;
        let target = target_dir.join(file_name);
        fs::copy(&artifact.path, &target).with_context(|| {
            format!("Cannot copy artifact '{}' to '{}'", artifact.path.display(), target.display())
        })?;

        let manifest = Artifact { path: target.clone(), ..artifact.clone() };
        fs::write(target_dir.join("artifact.json"), serde_json::to_string_pretty(&manifest)?)?;

        self.info.artifacts.push(artifact.name.clone());
        self.write_info()?;
        tracing::info!("Logged artifact '{}' ({})", artifact.name, target.display());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.info.status      = RunStatus::Finished;
        self.info.finished_at = Some(Utc::now());
        self.write_info()
    }
}
