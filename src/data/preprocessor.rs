// ============================================================
// Layer 4 - Segment Preprocessor
// ============================================================
// Brings every noisy/clean pair to exactly `sample_length`
// samples so the batcher can stack them into one tensor.
//
// Rules (applied in order):
//   1. If the two signals differ in length, truncate both to the
//      shorter one so they stay sample-aligned.
//   2. Shorter than `sample_length`: zero-pad at the end.
//   3. Longer: take one window. The window start is drawn from an
//      RNG seeded with `seed + index`, so the same item always gets
//      the same window, run after run.
//
// Noisy and clean are always cut at the same offset.

use rand::{rngs::StdRng, Rng, SeedableRng};

pub struct Preprocessor {
    sample_length: usize,
    seed:          u64,
}

impl Preprocessor {
    pub fn new(sample_length: usize, seed: u64) -> Self {
        Self { sample_length, seed }
    }

    pub fn sample_length(&self) -> usize {
        self.sample_length
    }

    /// Fit one pair to the segment length. `index` identifies the
    /// item within the dataset and picks its crop window.
    pub fn fit(&self, index: usize, mut noisy: Vec<f32>, mut clean: Vec<f32>) -> (Vec<f32>, Vec<f32>) {
        let shared = noisy.len().min(clean.len());
        if noisy.len() != clean.len() {
            tracing::debug!(
                "Length mismatch on item {} ({} vs {}), truncating to {}",
                index, noisy.len(), clean.len(), shared
            );
        }
        noisy.truncate(shared);
        clean.truncate(shared);

        if shared <= self.sample_length {
            noisy.resize(self.sample_length, 0.0);
            clean.resize(self.sample_length, 0.0);
            return (noisy, clean);
        }

        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(index as u64));
        let start = rng.gen_range(0..=shared - self.sample_length);
        let end   = start + self.sample_length;
        (noisy[start..end].to_vec(), clean[start..end].to_vec())
    }
}
