// ============================================================
// Layer 2 - TrainUseCase
// ============================================================
// Straight-line wiring from launch options to a running trainer:
//
//   Step 1: Load the JSON config          (Layer 2 - config)
//   Step 2: Resolve the compute device     (DeviceSelection)
//   Step 3: Build the paired WAV dataset   (Layer 4 - data)
//   Step 4: Wrap it in a DataLoader        (Layer 4 - data)
//   Step 5: Build the UNet                 (Layer 5 - ml)
//   Step 6: Build Adam bound to the model  (Burn optim)
//   Step 7: Build the trainer and train()  (Layer 5 - ml)
//
// Steps 3-7 live in `assemble` so they can run on any backend;
// `execute` picks the GPU backend and the device.

use std::path::PathBuf;

use anyhow::{ensure, Result};
use burn::{
    backend::{
        wgpu::{Wgpu, WgpuDevice},
        Autodiff,
    },
    optim::{AdamConfig, Optimizer},
    tensor::backend::AutodiffBackend,
};

use crate::application::config::TrainConfig;
use crate::data::{batcher::build_loader, dataset::load_dataset_dir};
use crate::domain::run_mode::{DeviceSelection, ResumeMode};
use crate::ml::{
    model::{UNet, UNetConfig},
    trainer::{TrainSummary, Trainer},
};

type TrainBackend = Autodiff<Wgpu>;

/// Everything the command line decides.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchOptions {
    pub config_path: PathBuf,
    pub device:      DeviceSelection,
    pub resume:      ResumeMode,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    options: LaunchOptions,
    config:  TrainConfig,
}

impl TrainUseCase {
    /// Load and validate the config. Nothing else is built yet.
    pub fn new(options: LaunchOptions) -> Result<Self> {
        let config = TrainConfig::from_file(&options.config_path)?;
        tracing::info!(
            "Loaded config '{}' (experiment '{}')",
            options.config_path.display(),
            config.experiment_name
        );
        Ok(Self { options, config })
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Build dataset, loader, model, optimizer and trainer on `device`.
    pub fn assemble<B: AutodiffBackend>(
        &self,
        device: B::Device,
    ) -> Result<Trainer<'_, B, impl Optimizer<UNet<B>, B>>> {
        let cfg = &self.config;
        let dl  = &cfg.train_data_loader;

        let model_config = UNetConfig::new();
        let multiple     = model_config.length_multiple();
        ensure!(
            dl.sample_length % multiple == 0,
            "sample_length {} must be a multiple of {} for a depth-{} UNet",
            dl.sample_length, multiple, model_config.depth
        );

        // ── Step 3: Dataset ───────────────────────────────────────────────────
        let dataset = load_dataset_dir(
            &dl.dataset_dir,
            dl.limit,
            dl.offset,
            dl.sample_length,
            cfg.seed,
        )?;
        tracing::info!("Training on {} pairs", dataset.pair_count());
        tracing::debug!("First pairs: {:?}", dataset.names().take(3).collect::<Vec<_>>());

        // ── Step 4: DataLoader ────────────────────────────────────────────────
        let shuffle_seed = dl.shuffle.then_some(cfg.seed);
        let train_dl = build_loader::<B>(
            dataset,
            dl.batch_size,
            dl.num_workers,
            shuffle_seed,
            device.clone(),
        );

        // ── Step 5: Model ─────────────────────────────────────────────────────
        let model: UNet<B> = model_config.init(&device);

        // ── Step 6: Optimizer ─────────────────────────────────────────────────
        let (b1, b2) = cfg.betas();
        let optim = AdamConfig::new()
            .with_beta_1(b1 as f32)
            .with_beta_2(b2 as f32)
            .init::<B, UNet<B>>();

        // ── Step 7: Trainer ───────────────────────────────────────────────────
        Ok(Trainer::new(cfg, self.options.resume, model, optim, train_dl, None, device))
    }

    /// Run the full pipeline on the GPU backend.
    pub fn execute(&self) -> Result<TrainSummary> {
        let device = wgpu_device(&self.options.device);
        tracing::info!("Using device {:?} (selection: {})", device, self.options.device);

        let trainer = self.assemble::<TrainBackend>(device)?;
        tracing::info!(
            "Trainer ready: {} batches per epoch, {}, validation loader: {}",
            trainer.train_loader().num_items().div_ceil(self.config.train_data_loader.batch_size),
            trainer.resume_mode(),
            if trainer.has_validation_loader() { "yes" } else { "none" },
        );
        trainer.train()
    }
}

/// Map the selection onto a Wgpu device. Training runs on the first
/// listed index; further indices are reported and left idle.
fn wgpu_device(selection: &DeviceSelection) -> WgpuDevice {
    match selection.primary() {
        None => WgpuDevice::default(),
        Some(index) => {
            if selection.indices().len() > 1 {
                tracing::warn!(
                    "Multiple devices requested ({}); training on device {} only",
                    selection, index
                );
            }
            WgpuDevice::DiscreteGpu(index)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{numbered_stems, write_config, write_pair_tree};
    use burn::backend::{Autodiff, NdArray};
    use std::path::Path;

    type TestBackend = Autodiff<NdArray>;

    /// Eight pairs, sample_length 64 (a multiple of 2^6).
    fn fixture(root: &Path, batch_size: usize, shuffle: bool) -> PathBuf {
        let stems = numbered_stems(8);
        let refs: Vec<&str> = stems.iter().map(String::as_str).collect();
        write_pair_tree(&root.join("dataset"), &refs, 80);
        write_config(root, batch_size, shuffle, 64, 1)
    }

    fn options(config_path: PathBuf, resume: ResumeMode) -> LaunchOptions {
        LaunchOptions { config_path, device: DeviceSelection::Default, resume }
    }

    fn batch_order(use_case: &TrainUseCase) -> Vec<Vec<String>> {
        let trainer = use_case.assemble::<TestBackend>(Default::default()).unwrap();
        trainer.train_loader().iter().map(|b| b.names).collect()
    }

    #[test]
    fn test_wgpu_device_follows_selection() {
        assert_eq!(wgpu_device(&DeviceSelection::Default), WgpuDevice::default());
        let sel: DeviceSelection = "1,2".parse().unwrap();
        assert_eq!(wgpu_device(&sel), WgpuDevice::DiscreteGpu(1));
    }

    #[test]
    fn test_missing_lr_fails_before_assembly() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("train_config.json");
        std::fs::write(
            &path,
            r#"{
                "train_data_loader": {
                    "dataset_dir": "nowhere", "limit": null, "offset": 0,
                    "batch_size": 2, "num_workers": 0, "shuffle": false
                },
                "optimizer": { "b1": 0.9 }
            }"#,
        )
        .unwrap();

        let err = TrainUseCase::new(options(path, ResumeMode::Fresh)).err().unwrap();
        assert!(format!("{err:#}").contains("lr"));
    }

    #[test]
    fn test_resume_mode_reaches_trainer() {
        let dir  = tempfile::tempdir().unwrap();
        let path = fixture(dir.path(), 4, false);

        // no checkpoint exists yet; assembly still succeeds
        let use_case = TrainUseCase::new(options(path, ResumeMode::ResumeFromLatest)).unwrap();
        let trainer  = use_case.assemble::<TestBackend>(Default::default()).unwrap();
        assert_eq!(trainer.resume_mode(), ResumeMode::ResumeFromLatest);
        assert!(!trainer.has_validation_loader());
    }

    #[test]
    fn test_unshuffled_batches_are_reproducible() {
        let dir  = tempfile::tempdir().unwrap();
        let path = fixture(dir.path(), 4, false);
        let use_case = TrainUseCase::new(options(path, ResumeMode::Fresh)).unwrap();

        let first = batch_order(&use_case);
        assert_eq!(first.len(), 2);
        assert_eq!(first[0], vec!["utt_00", "utt_01", "utt_02", "utt_03"]);
        assert_eq!(first, batch_order(&use_case));
    }

    #[test]
    fn test_shuffled_batches_cover_every_pair() {
        let dir  = tempfile::tempdir().unwrap();
        let path = fixture(dir.path(), 4, true);
        let use_case = TrainUseCase::new(options(path, ResumeMode::Fresh)).unwrap();

        let mut names: Vec<String> = batch_order(&use_case).into_iter().flatten().collect();
        names.sort();
        assert_eq!(names, numbered_stems(8));
    }

    #[test]
    fn test_sample_length_must_fit_depth() {
        let dir  = tempfile::tempdir().unwrap();
        let stems = numbered_stems(2);
        let refs: Vec<&str> = stems.iter().map(String::as_str).collect();
        write_pair_tree(&dir.path().join("dataset"), &refs, 80);
        let path = write_config(dir.path(), 2, false, 50, 1);

        let use_case = TrainUseCase::new(options(path, ResumeMode::Fresh)).unwrap();
        let err = use_case.assemble::<TestBackend>(Default::default()).err().unwrap();
        assert!(err.to_string().contains("multiple of 64"));
    }

    #[test]
    fn test_fresh_run_end_to_end() {
        let dir  = tempfile::tempdir().unwrap();
        let path = fixture(dir.path(), 4, false);
        let use_case = TrainUseCase::new(options(path, ResumeMode::Fresh)).unwrap();

        let summary = use_case.assemble::<TestBackend>(Default::default()).unwrap().train().unwrap();
        assert_eq!(summary.epochs_run(), 1);
        assert!(use_case.config().experiment_dir().join("checkpoints/latest.json").exists());
    }
}
