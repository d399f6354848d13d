// ============================================================
// Layer 6 - Metrics Logger
// ============================================================
// Appends one CSV row per epoch to
// `<save_location>/<experiment_name>/logs/metrics.csv`:
//
//   epoch,train_loss,val_loss,val_snr
//   1,0.031250,,
//   2,0.027100,0.029900,6.412000
//
// Validation columns stay empty on epochs where no validation
// ran. The header is written once, so resumed runs keep
// appending to the same file. A resumed run first drops rows for
// the epochs it is about to repeat.

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

const HEADER: &str = "epoch,train_loss,val_loss,val_snr";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch: usize,

    /// Mean MSE over the epoch's training batches
    pub train_loss: f64,

    /// Mean MSE on the validation set, if it ran this epoch
    pub val_loss: Option<f64>,

    /// Mean SNR of enhanced vs clean in dB, if validation ran
    pub val_snr: Option<f64>,
}

impl EpochMetrics {
    pub fn training(epoch: usize, train_loss: f64) -> Self {
        Self { epoch, train_loss, val_loss: None, val_snr: None }
    }

    /// Higher SNR is better; epochs without validation never improve.
    pub fn is_improvement(&self, best_score: f64) -> bool {
        self.val_snr.map(|snr| snr > best_score).unwrap_or(false)
    }

    fn csv_row(&self) -> String {
        let opt = |v: Option<f64>| v.map(|x| format!("{x:.6}")).unwrap_or_default();
        format!(
            "{},{:.6},{},{}",
            self.epoch,
            self.train_loss,
            opt(self.val_loss),
            opt(self.val_snr),
        )
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create `<experiment>/logs/metrics.csv` with a header if it is new.
    pub fn new(experiment_dir: impl AsRef<Path>) -> Result<Self> {
        let dir = experiment_dir.as_ref().join("logs");
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create log dir '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;
        writeln!(f, "{}", m.csv_row())?;
        Ok(())
    }

    /// Remove rows for `epoch` and later, keeping the header.
    pub fn truncate_from(&self, epoch: usize) -> Result<()> {
        let text = fs::read_to_string(&self.csv_path)
            .with_context(|| format!("Cannot read '{}'", self.csv_path.display()))?;

        let mut kept = String::new();
        for line in text.lines() {
            let row_epoch = line.split(',').next().and_then(|e| e.parse::<usize>().ok());
            if row_epoch.map_or(true, |e| e < epoch) {
                kept.push_str(line);
                kept.push('\n');
            }
        }
        fs::write(&self.csv_path, kept)
            .with_context(|| format!("Cannot rewrite '{}'", self.csv_path.display()))?;
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

    #[test]
    fn test_is_improvement() {
        let mut m = EpochMetrics::training(2, 0.5);
        assert!(!m.is_improvement(f64::NEG_INFINITY));
        m.val_snr = Some(4.0);
        assert!(m.is_improvement(3.0));
        assert!(!m.is_improvement(4.0));
    }

    #[test]
    fn test_rows_append_across_loggers() {
        let dir = tempfile::tempdir().unwrap();

        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger.log(&EpochMetrics::training(1, 0.25)).unwrap();

        // a resumed run reopens the same file
        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger
            .log(&EpochMetrics { epoch: 2, train_loss: 0.125, val_loss: Some(0.5), val_snr: Some(3.0) })
            .unwrap();

        let text = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec![
            HEADER,
            "1,0.250000,,",
            "2,0.125000,0.500000,3.000000",
        ]);
    }

    #[test]
    fn test_truncate_drops_repeated_epochs() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();
        for epoch in 1..=3 {
            logger.log(&EpochMetrics::training(epoch, 0.5)).unwrap();
        }

        logger.truncate_from(2).unwrap();
        logger.log(&EpochMetrics::training(2, 0.25)).unwrap();

        let text = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec![HEADER, "1,0.500000,,", "2,0.250000,,"]);
    }
}
