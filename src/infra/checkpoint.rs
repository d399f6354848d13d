// ============================================================
// Layer 6 - Checkpoint Manager
// ============================================================
// Saves and restores training state with Burn's CompactRecorder
// (named MessagePack, half precision, `.mpk` files).
//
// Layout under `<save_location>/<experiment_name>/`:
//
//   train_config.json            ← copy of the run's config
//   checkpoints/
//     model_epoch_10.mpk         ← model weights after epoch 10
//     optim_epoch_10.mpk         ← Adam moments after epoch 10
//     state_epoch_10.json        ← {"epoch": 10, "best_score": ...}
//     best_model.mpk             ← weights with the best score
//     latest.json                ← copy of the newest state file
//
// Resuming needs both the model and optimizer files for the
// same epoch; `latest.json` is only rewritten after both exist.

use anyhow::{Context, Result};
use burn::{
    module::Module,
    optim::Optimizer,
    record::{CompactRecorder, Recorder},
    tensor::backend::{AutodiffBackend, Backend},
};
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};

use crate::application::config::TrainConfig;
use crate::ml::model::UNet;

const LATEST_FILE: &str = "latest.json";
/// Extension CompactRecorder appends to every record path
pub const RECORD_EXTENSION: &str = "mpk";
const CONFIG_FILE: &str = "train_config.json";

/// Contents of `latest.json`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheckpointState {
    pub epoch:      usize,
    /// Best validation SNR so far; `None` until validation has run
    pub best_score: Option<f64>,
}

pub struct CheckpointManager {
    /// `<experiment>/checkpoints`
    dir:      PathBuf,
    /// `<experiment>`
    root_dir: PathBuf,
}

impl CheckpointManager {
    pub fn new(experiment_dir: impl Into<PathBuf>) -> Result<Self> {
        let root_dir = experiment_dir.into();
        let dir      = root_dir.join("checkpoints");
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint dir '{}'", dir.display()))?;
        Ok(Self { dir, root_dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // Record paths are given to the recorder without an extension.
    fn model_path(&self, epoch: usize) -> PathBuf {
        self.dir.join(format!("model_epoch_{epoch}"))
    }

    fn optim_path(&self, epoch: usize) -> PathBuf {
        self.dir.join(format!("optim_epoch_{epoch}"))
    }

    fn best_path(&self) -> PathBuf {
        self.dir.join("best_model")
    }

    fn state_path(&self, epoch: usize) -> PathBuf {
        self.dir.join(format!("state_epoch_{epoch}.json"))
    }

    /// On-disk model file for `epoch`.
    pub fn model_file(&self, epoch: usize) -> PathBuf {
        self.model_path(epoch).with_extension(RECORD_EXTENSION)
    }

    /// On-disk optimizer file for `epoch`.
    pub fn optim_file(&self, epoch: usize) -> PathBuf {
        self.optim_path(epoch).with_extension(RECORD_EXTENSION)
    }

    pub fn best_model_file(&self) -> PathBuf {
        self.best_path().with_extension(RECORD_EXTENSION)
    }

    /// Save model and optimizer for `epoch`, then point `latest.json` at it.
    pub fn save<B, O>(
        &self,
        model: &UNet<B>,
        optim: &O,
        state: CheckpointState,
    ) -> Result<()>
    where
        B: AutodiffBackend,
        O: Optimizer<UNet<B>, B>,
    {
        let recorder = CompactRecorder::new();

        let model_path = self.model_path(state.epoch);
        Recorder::<B>::record(&recorder, model.clone().into_record(), model_path.clone())
            .with_context(|| format!("Failed to save model to '{}'", self.model_file(state.epoch).display()))?;

        let optim_path = self.optim_path(state.epoch);
        Recorder::<B>::record(&recorder, optim.to_record(), optim_path.clone())
            .with_context(|| format!("Failed to save optimizer to '{}'", self.optim_file(state.epoch).display()))?;

        let json = serde_json::to_string(&state)?;
        for path in [self.state_path(state.epoch), self.dir.join(LATEST_FILE)] {
            fs::write(&path, &json)
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
        }

        tracing::debug!("Saved checkpoint: epoch {}", state.epoch);
        Ok(())
    }

    /// Save the weights that produced the best validation score so far.
    pub fn save_best<B: Backend>(&self, model: &UNet<B>) -> Result<()> {
        let path = self.best_path();
        Recorder::<B>::record(&CompactRecorder::new(), model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save best model to '{}'", self.best_model_file().display()))?;
        Ok(())
    }

    /// Restore model and optimizer saved at `epoch`.
    pub fn load<B, O>(
        &self,
        model:  UNet<B>,
        optim:  O,
        epoch:  usize,
        device: &B::Device,
    ) -> Result<(UNet<B>, O)>
    where
        B: AutodiffBackend,
        O: Optimizer<UNet<B>, B>,
    {
        let recorder = CompactRecorder::new();

        let model_path = self.model_path(epoch);
        let model_record = Recorder::<B>::load(&recorder, model_path.clone(), device)
            .with_context(|| {
                format!("Cannot load model checkpoint '{}'", self.model_file(epoch).display())
            })?;

        let optim_path = self.optim_path(epoch);
        let optim_record = Recorder::<B>::load(&recorder, optim_path.clone(), device)
            .with_context(|| {
                format!("Cannot load optimizer checkpoint '{}'", self.optim_file(epoch).display())
            })?;

        tracing::info!("Restored checkpoint from epoch {}", epoch);
        Ok((model.load_record(model_record), optim.load_record(optim_record)))
    }

    /// Read `latest.json`. Fails if nothing has been saved yet.
    pub fn latest(&self) -> Result<CheckpointState> {
        let path = self.dir.join(LATEST_FILE);
        let s = fs::read_to_string(&path).with_context(|| {
            format!("Cannot resume: no checkpoint pointer at '{}'", path.display())
        })?;
        serde_json::from_str(&s)
            .with_context(|| format!("Corrupt checkpoint pointer '{}'", path.display()))
    }

    /// State saved alongside the checkpoint of `epoch`.
    pub fn state(&self, epoch: usize) -> Result<CheckpointState> {
        let path = self.state_path(epoch);
        let s = fs::read_to_string(&path).with_context(|| {
            format!("Cannot resume: no checkpoint state at '{}'", path.display())
        })?;
        serde_json::from_str(&s)
            .with_context(|| format!("Corrupt checkpoint state '{}'", path.display()))
    }

    /// Copy the run configuration next to the checkpoints.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.root_dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::UNetConfig;
    use burn::{
        backend::{Autodiff, NdArray},
        optim::AdamConfig,
        prelude::*,
    };

    type TestBackend = Autodiff<NdArray>;

    #[test]
    fn test_latest_missing_is_error() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        let err  = ckpt.latest().unwrap_err();
        assert!(err.to_string().contains("latest.json"));
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path()).unwrap();
        let device = Default::default();
        let cfg    = UNetConfig::new().with_depth(1).with_base_channels(2);

        let model: UNet<TestBackend> = cfg.init(&device);
        let optim = AdamConfig::new().init::<TestBackend, UNet<TestBackend>>();
        let state = CheckpointState { epoch: 3, best_score: Some(1.5) };
        ckpt.save(&model, &optim, state).unwrap();

        assert_eq!(ckpt.latest().unwrap(), state);
        assert!(ckpt.model_file(3).exists());
        assert!(ckpt.optim_file(3).exists());
        assert!(ckpt.dir().join("model_epoch_3.mpk").exists());
        assert_eq!(ckpt.state(3).unwrap(), state);

        let fresh: UNet<TestBackend> = cfg.init(&device);
        let fresh_optim = AdamConfig::new().init::<TestBackend, UNet<TestBackend>>();
        let (restored, _) = ckpt.load(fresh, fresh_optim, 3, &device).unwrap();

        let x = Tensor::<TestBackend, 3>::ones([1, 1, 8], &device);
        let a: Vec<f32> = model.forward(x.clone()).into_data().to_vec::<f32>().unwrap();
        let b: Vec<f32> = restored.forward(x).into_data().to_vec::<f32>().unwrap();
        for (x, y) in a.iter().zip(&b) {
            // half-precision storage
            assert!((x - y).abs() < 1e-2);
        }
    }

    #[test]
    fn test_state_is_kept_per_epoch() {
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path()).unwrap();
        let device = Default::default();
        let model: UNet<TestBackend> = UNetConfig::new().with_depth(1).init(&device);
        let optim = AdamConfig::new().init::<TestBackend, UNet<TestBackend>>();

        let early = CheckpointState { epoch: 1, best_score: Some(2.0) };
        let later = CheckpointState { epoch: 2, best_score: Some(5.0) };
        ckpt.save(&model, &optim, early).unwrap();
        ckpt.save(&model, &optim, later).unwrap();

        assert_eq!(ckpt.latest().unwrap(), later);
        assert_eq!(ckpt.state(1).unwrap(), early);
        assert!(ckpt.state(7).is_err());
    }

    #[test]
    fn test_load_missing_epoch_is_error() {
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path()).unwrap();
        let device = Default::default();
        let model: UNet<TestBackend> = UNetConfig::new().with_depth(1).init(&device);
        let optim = AdamConfig::new().init::<TestBackend, UNet<TestBackend>>();
        assert!(ckpt.load(model, optim, 9, &device).is_err());
    }
}
