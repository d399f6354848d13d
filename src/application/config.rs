// ============================================================
// Layer 2 - Training Configuration
// ============================================================
// Typed view of the JSON training configuration file.
//
// Required sections (no defaults, loading fails if absent):
//   train_data_loader  - where the audio lives and how to batch it
//   optimizer          - Adam learning rate and first beta
//
// Optional sections fall back to the defaults below, so a
// minimal file only needs the two sections above.
//
// serde reports a missing key as e.g. "missing field `lr`",
// which is surfaced with the file path attached.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};

/// Second Adam beta. Only the first beta is configurable.
pub const ADAM_BETA_2: f64 = 0.999;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Free-form note copied into the experiment directory
    #[serde(default)]
    pub description: String,

    /// Root directory for all experiments
    #[serde(default = "default_save_location")]
    pub save_location: PathBuf,

    /// Subdirectory of `save_location` for this run
    #[serde(default = "default_experiment_name")]
    pub experiment_name: String,

    /// Seeds loader shuffling and segment cropping
    #[serde(default = "default_seed")]
    pub seed: u64,

    #[serde(default)]
    pub trainer: TrainerSection,

    pub train_data_loader: DataLoaderSection,

    pub optimizer: OptimizerSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataLoaderSection {
    pub dataset_dir: PathBuf,
    /// Maximum number of pairs to use; `null` means all.
    /// The key itself must be present.
    #[serde(deserialize_with = "Option::deserialize")]
    pub limit:       Option<usize>,
    /// Number of sorted pairs to skip before taking `limit`
    pub offset:      usize,
    pub batch_size:  usize,
    pub num_workers: usize,
    pub shuffle:     bool,
    /// Samples per training segment
    #[serde(default = "default_sample_length")]
    pub sample_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerSection {
    pub lr: f64,
    pub b1: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerSection {
    #[serde(default = "default_epochs")]
    pub epochs: usize,
    #[serde(default = "default_interval")]
    pub save_checkpoint_interval: usize,
    #[serde(default = "default_interval")]
    pub validation_interval: usize,
}

impl Default for TrainerSection {
    fn default() -> Self {
        Self {
            epochs:                   default_epochs(),
            save_checkpoint_interval: default_interval(),
            validation_interval:      default_interval(),
        }
    }
}

fn default_save_location() -> PathBuf { PathBuf::from("./experiments") }
fn default_experiment_name() -> String { "unet".to_string() }
fn default_seed() -> u64 { 42 }
fn default_sample_length() -> usize { 16384 }
fn default_epochs() -> usize { 100 }
fn default_interval() -> usize { 10 }

impl TrainConfig {
    /// Read and parse a configuration file.
    /// Fails if the file is missing, is not JSON, or lacks a required key.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file '{}'", path.display()))?;
        Self::from_json(&json)
            .with_context(|| format!("Invalid config file '{}'", path.display()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: TrainConfig = serde_json::from_str(json)?;
        cfg.check()?;
        Ok(cfg)
    }

    /// Values serde accepts but training cannot use.
    fn check(&self) -> Result<()> {
        let dl = &self.train_data_loader;
        anyhow::ensure!(dl.batch_size > 0, "train_data_loader.batch_size must be positive");
        anyhow::ensure!(dl.sample_length > 0, "train_data_loader.sample_length must be positive");
        anyhow::ensure!(self.trainer.epochs > 0, "trainer.epochs must be positive");
        anyhow::ensure!(
            self.trainer.save_checkpoint_interval > 0 && self.trainer.validation_interval > 0,
            "trainer intervals must be positive"
        );
        anyhow::ensure!(self.optimizer.lr > 0.0, "optimizer.lr must be positive");
        anyhow::ensure!(
            (0.0..1.0).contains(&self.optimizer.b1),
            "optimizer.b1 must be in [0, 1)"
        );
        Ok(())
    }

    /// `<save_location>/<experiment_name>`
    pub fn experiment_dir(&self) -> PathBuf {
        self.save_location.join(&self.experiment_name)
    }

    /// Adam betas as `(b1, 0.999)`
    pub fn betas(&self) -> (f64, f64) {
        (self.optimizer.b1, ADAM_BETA_2)
    }
}
