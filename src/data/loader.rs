// ============================================================
// Layer 4 - WAV Pair Loader
// ============================================================
// Finds and decodes the paired recordings under a dataset root:
//
//   dataset_dir/
//     noisy/  p232_001.wav  p232_002.wav ...
//     clean/  p232_001.wav  p232_002.wav ...
//
// A noisy file and a clean file belong together when they have
// the same file name. Every noisy file must have a clean twin;
// extra clean files are ignored. A pair is named by the shared
// file stem (`p232_001`).
//
// Pairs are returned sorted by file name so that `offset` and
// `limit` always select the same files.

use anyhow::{bail, Context, Result};
use std::{
    fs,
    io::BufReader,
    path::{Path, PathBuf},
};

use crate::domain::speech_pair::PairPaths;
use crate::domain::traits::PairSource;

pub const NOISY_SUBDIR: &str = "noisy";
pub const CLEAN_SUBDIR: &str = "clean";

/// Lists noisy/clean pairs from a dataset directory.
pub struct WavPairLoader {
    root: PathBuf,
}

impl WavPairLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl PairSource for WavPairLoader {
    fn list_pairs(&self) -> Result<Vec<PairPaths>> {
        let noisy_dir = self.root.join(NOISY_SUBDIR);
        let clean_dir = self.root.join(CLEAN_SUBDIR);

        if !noisy_dir.is_dir() {
            bail!("Missing noisy directory '{}'", noisy_dir.display());
        }
        if !clean_dir.is_dir() {
            bail!("Missing clean directory '{}'", clean_dir.display());
        }

        let mut file_names: Vec<String> = Vec::new();
        for entry in fs::read_dir(&noisy_dir)
            .with_context(|| format!("Cannot read directory '{}'", noisy_dir.display()))?
        {
            let path = entry?.path();
            if path.is_file() && is_wav(&path) {
                if let Some(file_name) = path.file_name().and_then(|n| n.to_str()) {
                    file_names.push(file_name.to_string());
                }
            }
        }
        file_names.sort();

        let mut pairs = Vec::with_capacity(file_names.len());
        for file_name in file_names {
            let clean = clean_dir.join(&file_name);
            if !clean.is_file() {
                bail!(
                    "No clean reference for '{}' (expected '{}')",
                    file_name,
                    clean.display()
                );
            }
            let noisy = noisy_dir.join(&file_name);
            let name  = noisy
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(&file_name)
                .to_string();
            pairs.push(PairPaths { name, noisy, clean });
        }

        tracing::debug!("Found {} pairs under '{}'", pairs.len(), self.root.display());
        Ok(pairs)
    }
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("wav"))
        .unwrap_or(false)
}

/// Decode a WAV file into mono samples in [-1, 1].
///
/// Integer PCM is scaled by its bit depth; float PCM is passed
/// through. Multi-channel audio is averaged down to one channel.
/// Returns the samples and the file's sample rate.
pub fn read_wav(path: &Path) -> Result<(Vec<f32>, u32)> {
    let file = fs::File::open(path)
        .with_context(|| format!("Cannot open '{}'", path.display()))?;
    let mut reader = hound::WavReader::new(BufReader::new(file))
        .with_context(|| format!("Cannot parse WAV header of '{}'", path.display()))?;

    let spec = reader.spec();
    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<Result<Vec<f32>, _>>()
        }
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<f32>, _>>(),
    }
    .with_context(|| format!("Corrupt sample data in '{}'", path.display()))?;

    let channels = spec.channels.max(1) as usize;
    let mono = if channels == 1 {
        samples
    } else {
        samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    };

    Ok((mono, spec.sample_rate))
}
