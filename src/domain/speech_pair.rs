// ============================================================
// Layer 3 - SpeechPair Domain Type
// ============================================================
// The unit of training data for speech enhancement: the same
// utterance recorded (or synthesised) with and without noise.
// The model sees `noisy` and is trained to reproduce `clean`.
//
// By the time a SpeechPair exists both signals are mono,
// normalised to [-1, 1] and exactly the same length.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechPair {
    /// File stem shared by the noisy and clean recordings
    pub name: String,

    /// Degraded input waveform
    pub noisy: Vec<f32>,

    /// Reference target waveform
    pub clean: Vec<f32>,
}

impl SpeechPair {
    pub fn new(name: impl Into<String>, noisy: Vec<f32>, clean: Vec<f32>) -> Self {
        debug_assert_eq!(noisy.len(), clean.len());
        Self { name: name.into(), noisy, clean }
    }

    /// Number of samples in each signal
    pub fn num_samples(&self) -> usize {
        self.noisy.len()
    }
}

/// Location of one noisy/clean file pair on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairPaths {
    pub name:  String,
    pub noisy: std::path::PathBuf,
    pub clean: std::path::PathBuf,
}
