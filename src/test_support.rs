// Shared fixtures for unit tests: tiny deterministic WAV trees
// and config files written into temporary directories.

use std::{fs, path::Path};

use crate::data::loader::{CLEAN_SUBDIR, NOISY_SUBDIR};

pub const SAMPLE_RATE: u32 = 16_000;

/// Write interleaved samples as 16-bit PCM.
pub fn write_wav_i16(path: &Path, samples: &[f32], channels: u16) {
    let spec = hound::WavSpec {
        channels,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &s in samples {
        writer.write_sample((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16).unwrap();
    }
    writer.finalize().unwrap();
}

/// Deterministic clean tone for fixture `index`
pub fn clean_signal(index: usize, len: usize) -> Vec<f32> {
    let freq = 220.0 * (index + 1) as f32;
    (0..len)
        .map(|i| 0.5 * (2.0 * std::f32::consts::PI * freq * i as f32 / SAMPLE_RATE as f32).sin())
        .collect()
}

/// Clean tone plus a fixed pseudo-noise pattern
pub fn noisy_signal(index: usize, len: usize) -> Vec<f32> {
    clean_signal(index, len)
        .into_iter()
        .enumerate()
        .map(|(i, s)| s + 0.1 * (((i * 7919 + index * 104_729) % 200) as f32 / 100.0 - 1.0))
        .collect()
}

/// Create `root/noisy/<stem>.wav` and `root/clean/<stem>.wav` for every stem.
pub fn write_pair_tree(root: &Path, stems: &[&str], len: usize) {
    let noisy_dir = root.join(NOISY_SUBDIR);
    let clean_dir = root.join(CLEAN_SUBDIR);
    fs::create_dir_all(&noisy_dir).unwrap();
    fs::create_dir_all(&clean_dir).unwrap();
    for (i, stem) in stems.iter().enumerate() {
        let file = format!("{stem}.wav");
        write_wav_i16(&noisy_dir.join(&file), &noisy_signal(i, len), 1);
        write_wav_i16(&clean_dir.join(&file), &clean_signal(i, len), 1);
    }
}

/// Numbered stems `utt_00`, `utt_01`, ...
pub fn numbered_stems(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("utt_{i:02}")).collect()
}

/// Write a config whose dataset and experiment dirs live under `root`.
pub fn write_config(
    root: &Path,
    batch_size: usize,
    shuffle: bool,
    sample_length: usize,
    epochs: usize,
) -> std::path::PathBuf {
    let json = serde_json::json!({
        "description": "fixture run",
        "save_location": root.join("experiments"),
        "experiment_name": "fixture",
        "seed": 7,
        "trainer": {
            "epochs": epochs,
            "save_checkpoint_interval": 1,
            "validation_interval": 1
        },
        "train_data_loader": {
            "dataset_dir": root.join("dataset"),
            "limit": null,
            "offset": 0,
            "batch_size": batch_size,
            "num_workers": 0,
            "shuffle": shuffle,
            "sample_length": sample_length
        },
        "optimizer": { "lr": 0.001, "b1": 0.9 }
    });
    let path = root.join("train_config.json");
    fs::write(&path, serde_json::to_string_pretty(&json).unwrap()).unwrap();
    path
}
