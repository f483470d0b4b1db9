// ============================================================
// Layer 6 — Metrics CSV
// ============================================================
// Appends one row per epoch to <run_dir>/metrics.csv so the
// learning curves can be plotted without any tooling:
//
//   epoch,train_loss,train_error,test_loss,test_error
//   0,1.512034,0.546200,1.498810,0.541700
//   1,1.106512,0.391040,1.131977,0.398300
//   ...
//
// Reading the curves:
//   - both losses fall while the LR is at its base value
//   - the error drops sharply right after each LR milestone
//   - test error rising while train error keeps falling → overfitting

use anyhow::{Context, Result};
use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::domain::metrics::EpochMetrics;

const HEADER: &str = "epoch,train_loss,train_error,test_loss,test_error";

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Open `<dir>/metrics.csv`, writing the header into an empty file.
    pub fn new(dir: &Path) -> Result<Self> {
        let logger = Self { csv_path: dir.join("metrics.csv") };
        let mut f  = logger.open()?;

        if f.metadata()?.len() == 0 {
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Started '{}'", logger.csv_path.display());
        }
        Ok(logger)
    }

    fn open(&self) -> Result<File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))
    }

    /// Append one epoch row, six decimals per value.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let row = format!(
            "{},{:.6},{:.6},{:.6},{:.6}",
            m.epoch, m.train_loss, m.train_error, m.test_loss, m.test_error,
        );
        writeln!(self.open()?, "{row}")?;
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn appends_rows_under_a_single_header() {
        let dir = tempfile::tempdir().unwrap();

        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger.log(&EpochMetrics::from_accuracies(0, 1.5, 0.25, 1.25, 0.5)).unwrap();

        // Re-opening must not write a second header
        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger.log(&EpochMetrics::from_accuracies(1, 1.0, 0.5, 1.0, 0.75)).unwrap();

        let text  = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, [
            HEADER,
            "0,1.500000,0.750000,1.250000,0.500000",
            "1,1.000000,0.500000,1.000000,0.250000",
        ]);
    }
}
