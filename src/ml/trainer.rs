// ============================================================
// Layer 5 - Training Loop
// ============================================================
// Owns everything the launcher hands over (model, optimizer,
// loaders) and runs the epoch loop:
//
//   resume?  → restore model + optimizer from a checkpoint
//   per epoch:
//     train      MSE(enhanced, clean) → backward → Adam step
//     validate   only if a validation loader was supplied and
//                epoch % validation_interval == 0
//     checkpoint every save_checkpoint_interval epochs and on
//                the final epoch
//     metrics    one CSV row
//
// Validation runs on model.valid(), i.e. the inner backend
// without autodiff, so the validation loader must produce
// inner-backend batches.

use anyhow::Result;
use burn::{
    module::AutodiffModule,
    nn::loss::{MseLoss, Reduction},
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::config::TrainConfig;
use crate::data::batcher::EnhancementLoader;
use crate::domain::run_mode::ResumeMode;
use crate::infra::checkpoint::{CheckpointManager, CheckpointState};
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::model::UNet;

/// Loader type for validation batches (inner backend, no autodiff).
pub type ValidationLoader<B> = EnhancementLoader<<B as AutodiffBackend>::InnerBackend>;

/// What a finished `train()` call reports back.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainSummary {
    pub first_epoch:      usize,
    pub last_epoch:       usize,
    pub final_train_loss: Option<f64>,
    pub best_score:       Option<f64>,
}

impl TrainSummary {
    pub fn epochs_run(&self) -> usize {
        (self.last_epoch + 1).saturating_sub(self.first_epoch)
    }
}

pub struct Trainer<'a, B, O>
where
    B: AutodiffBackend,
    O: Optimizer<UNet<B>, B>,
{
    config:        &'a TrainConfig,
    resume:        ResumeMode,
    model:         UNet<B>,
    optim:         O,
    train_dl:      EnhancementLoader<B>,
    validation_dl: Option<ValidationLoader<B>>,
    device:        B::Device,
}

impl<'a, B, O> Trainer<'a, B, O>
where
    B: AutodiffBackend,
    O: Optimizer<UNet<B>, B>,
{
    pub fn new(
        config:        &'a TrainConfig,
        resume:        ResumeMode,
        model:         UNet<B>,
        optim:         O,
        train_dl:      EnhancementLoader<B>,
        validation_dl: Option<ValidationLoader<B>>,
        device:        B::Device,
    ) -> Self {
        Self { config, resume, model, optim, train_dl, validation_dl, device }
    }

    pub fn resume_mode(&self) -> ResumeMode {
        self.resume
    }

    pub fn has_validation_loader(&self) -> bool {
        self.validation_dl.is_some()
    }

    pub fn train_loader(&self) -> &EnhancementLoader<B> {
        &self.train_dl
    }

    /// Run the epoch loop to completion. Blocks until done.
    pub fn train(self) -> Result<TrainSummary> {
        let Trainer { config, resume, mut model, mut optim, train_dl, validation_dl, device } = self;
        let tc = &config.trainer;
        let lr = config.optimizer.lr;

        let experiment_dir = config.experiment_dir();
        let checkpoints    = CheckpointManager::new(&experiment_dir)?;
        let metrics_log    = MetricsLogger::new(&experiment_dir)?;
        checkpoints.save_config(config)?;
        tracing::debug!(
            "Checkpoints in '{}', metrics in '{}'",
            checkpoints.dir().display(), metrics_log.csv_path().display()
        );

        // ── Resume ────────────────────────────────────────────────────────────
        let (first_epoch, mut best_score) = match resume {
            ResumeMode::Fresh => (1, None),
            ResumeMode::ResumeFromLatest => {
                let state = checkpoints.latest()?;
                (model, optim) = checkpoints.load(model, optim, state.epoch, &device)?;
                (state.epoch + 1, state.best_score)
            }
            ResumeMode::ResumeFromCheckpoint(epoch) => {
                let state = checkpoints.state(epoch)?;
                (model, optim) = checkpoints.load(model, optim, epoch, &device)?;
                (epoch + 1, state.best_score)
            }
        };
        if resume.is_resume() {
            metrics_log.truncate_from(first_epoch)?;
        }

        if first_epoch > tc.epochs {
            tracing::warn!(
                "Checkpoint is already at epoch {}, configured epochs = {}; nothing to do",
                first_epoch - 1, tc.epochs
            );
        } else {
            tracing::info!(
                "Training epochs {}..={} ({}), experiment dir '{}'",
                first_epoch, tc.epochs, resume, experiment_dir.display()
            );
        }

        let mut final_train_loss = None;

        // ── Epoch loop ────────────────────────────────────────────────────────
        for epoch in first_epoch..=tc.epochs {
            let mut loss_sum = 0.0f64;
            let mut batches  = 0usize;

            for batch in train_dl.iter() {
                tracing::trace!("Epoch {} batch {}: {:?}", epoch, batches, batch.names);
                let (loss, _) = model.forward_loss(batch.noisy, batch.clean);
                loss_sum += loss.clone().into_scalar().elem::<f64>();
                batches  += 1;

                let grads = GradientsParams::from_grads(loss.backward(), &model);
                model = optim.step(lr, model, grads);
            }

            let train_loss = if batches > 0 { loss_sum / batches as f64 } else { f64::NAN };
            final_train_loss = Some(train_loss);
            let mut metrics = EpochMetrics::training(epoch, train_loss);

            // ── Validation ────────────────────────────────────────────────────
            if let Some(valid_dl) = &validation_dl {
                if epoch % tc.validation_interval == 0 {
                    let (val_loss, val_snr) = validate(&model.valid(), valid_dl);
                    metrics.val_loss = Some(val_loss);
                    metrics.val_snr  = Some(val_snr);

                    if metrics.is_improvement(best_score.unwrap_or(f64::NEG_INFINITY)) {
                        best_score = Some(val_snr);
                        checkpoints.save_best(&model)?;
                        tracing::info!("New best SNR {:.3} dB at epoch {}", val_snr, epoch);
                    }
                }
            }

            println!(
                "Epoch {:>3}/{} | train_loss={:.6}{}",
                epoch,
                tc.epochs,
                train_loss,
                match (metrics.val_loss, metrics.val_snr) {
                    (Some(l), Some(s)) => format!(" | val_loss={l:.6} | val_snr={s:.2} dB"),
                    _ => String::new(),
                },
            );
            metrics_log.log(&metrics)?;

            // ── Checkpoint ────────────────────────────────────────────────────
            if epoch % tc.save_checkpoint_interval == 0 || epoch == tc.epochs {
                checkpoints.save(&model, &optim, CheckpointState { epoch, best_score })?;
                tracing::info!("Checkpoint saved for epoch {}", epoch);
            }
        }

        tracing::info!("Training complete!");
        Ok(TrainSummary {
            first_epoch,
            last_epoch: tc.epochs.max(first_epoch.saturating_sub(1)),
            final_train_loss,
            best_score,
        })
    }
}

/// Mean MSE and mean per-utterance SNR (dB) over a loader.
fn validate<B: Backend>(model: &UNet<B>, loader: &EnhancementLoader<B>) -> (f64, f64) {
    let mse = MseLoss::new();

    let mut loss_sum = 0.0f64;
    let mut batches  = 0usize;
    let mut snr_sum  = 0.0f64;
    let mut items    = 0usize;

    for batch in loader.iter() {
        let [n, _, t] = batch.clean.dims();
        let enhanced  = model.forward(batch.noisy);

        loss_sum += mse
            .forward(enhanced.clone(), batch.clean.clone(), Reduction::Mean)
            .into_scalar()
            .elem::<f64>();
        batches += 1;

        let clean: Vec<f32> = batch.clean.into_data().to_vec::<f32>().unwrap_or_default();
        let est:   Vec<f32> = enhanced.into_data().to_vec::<f32>().unwrap_or_default();
        for (c, e) in clean.chunks(t.max(1)).zip(est.chunks(t.max(1))).take(n) {
            snr_sum += snr_db(c, e);
            items   += 1;
        }
    }

    let mean = |sum: f64, count: usize| if count > 0 { sum / count as f64 } else { f64::NAN };
    (mean(loss_sum, batches), mean(snr_sum, items))
}

/// 10·log10(‖clean‖² / ‖clean − estimate‖²), floored to keep silence finite.
pub fn snr_db(clean: &[f32], estimate: &[f32]) -> f64 {
    const EPS: f64 = 1e-10;
    let (signal, noise) = clean.iter().zip(estimate).fold((0.0f64, 0.0f64), |(s, n), (&c, &e)| {
        let diff = (c - e) as f64;
        (s + (c as f64).powi(2), n + diff * diff)
    });
    10.0 * ((signal + EPS) / (noise + EPS)).log10()
}
