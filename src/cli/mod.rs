// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// Parses the launcher flags with clap and hands a LaunchOptions
// value to the application layer. No training logic here.
//
//   unet-se [-c CONFIG] [-d 0,1] [-r | --resume-from EPOCH]

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::application::train_use_case::{LaunchOptions, TrainUseCase};
use crate::domain::run_mode::{DeviceSelection, ResumeMode};

#[derive(Parser, Debug)]
#[command(
    name = "unet-se",
    version,
    about = "Train a waveform UNet for speech enhancement from a JSON config."
)]
pub struct Cli {
    /// Training configuration file
    #[arg(short, long, default_value = "./config/train_config.json")]
    pub config: PathBuf,

    /// Comma-separated device indices, e.g. "0" or "1,2".
    /// Training runs on the first one.
    #[arg(short, long)]
    pub device: Option<DeviceSelection>,

    /// Resume from the latest checkpoint of this experiment
    #[arg(short, long, conflicts_with = "resume_from")]
    pub resume: bool,

    /// Resume from the checkpoint saved at this epoch
    #[arg(long, value_name = "EPOCH")]
    pub resume_from: Option<usize>,
}

impl Cli {
    pub fn launch_options(&self) -> LaunchOptions {
        LaunchOptions {
            config_path: self.config.clone(),
            device:      self.device.clone().unwrap_or_default(),
            resume:      ResumeMode::from_flags(self.resume, self.resume_from),
        }
    }

    pub fn run(self) -> Result<()> {
        let options = self.launch_options();
        tracing::info!(
            "Launching with config '{}', device {}, {}",
            options.config_path.display(), options.device, options.resume
        );

        let use_case = TrainUseCase::new(options)?;
        let summary  = use_case.execute()?;

        println!(
            "Training finished in '{}': epochs {}..={} ({} run){}{}",
            use_case.config().experiment_dir().display(),
            summary.first_epoch,
            summary.last_epoch,
            summary.epochs_run(),
            summary
                .final_train_loss
                .map(|l| format!(", final train loss {l:.6}"))
                .unwrap_or_default(),
            summary
                .best_score
                .map(|s| format!(", best SNR {s:.2} dB"))
                .unwrap_or_default(),
        );
        Ok(())
    }
}
