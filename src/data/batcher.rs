// ============================================================
// Layer 4 - Enhancement Batcher
// ============================================================
// Implements Burn's Batcher trait: stacks N SpeechPairs into
// two float tensors of shape [N, 1, T] (batch, channel, time).
//
// Every pair is already exactly T samples long (see
// preprocessor.rs), so batching is a flatten + reshape:
//   [p1_s1 .. p1_sT, p2_s1 .. pN_sT] → [N, 1, T]
//
// Tensors are created directly on the batcher's device, so a
// batch is ready for the forward pass as soon as it is yielded.

use std::sync::Arc;

use burn::{
    data::dataloader::{batcher::Batcher, DataLoader, DataLoaderBuilder},
    prelude::*,
};

use crate::data::dataset::SpeechDataset;
use crate::domain::speech_pair::SpeechPair;

/// Shared handle to a batch iterator, as returned by Burn's builder.
pub type EnhancementLoader<B> = Arc<dyn DataLoader<EnhancementBatch<B>>>;

// ─── EnhancementBatch ─────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct EnhancementBatch<B: Backend> {
    /// Item names in batch order
    pub names: Vec<String>,

    /// Model input, shape [batch, 1, samples]
    pub noisy: Tensor<B, 3>,

    /// Regression target, shape [batch, 1, samples]
    pub clean: Tensor<B, 3>,
}

// ─── EnhancementBatcher ───────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct EnhancementBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> EnhancementBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<SpeechPair, EnhancementBatch<B>> for EnhancementBatcher<B> {
    fn batch(&self, items: Vec<SpeechPair>) -> EnhancementBatch<B> {
        let batch_size = items.len();
        let samples    = items.first().map(|p| p.num_samples()).unwrap_or(0);

        let noisy_flat: Vec<f32> = items.iter().flat_map(|p| p.noisy.iter().copied()).collect();
        let clean_flat: Vec<f32> = items.iter().flat_map(|p| p.clean.iter().copied()).collect();

        let noisy = Tensor::<B, 3>::from_data(
            TensorData::new(noisy_flat, [batch_size, 1, samples]),
            &self.device,
        );
        let clean = Tensor::<B, 3>::from_data(
            TensorData::new(clean_flat, [batch_size, 1, samples]),
            &self.device,
        );

        let names = items.into_iter().map(|p| p.name).collect();

        EnhancementBatch { names, noisy, clean }
    }
}

/// Wrap a dataset in Burn's DataLoader.
///
/// `shuffle_seed: None` keeps dataset order. `num_workers: 0`
/// batches on the calling thread; more workers prefetch in
/// parallel and may interleave batches.
pub fn build_loader<B: Backend>(
    dataset:      SpeechDataset,
    batch_size:   usize,
    num_workers:  usize,
    shuffle_seed: Option<u64>,
    device:       B::Device,
) -> EnhancementLoader<B> {
    let mut builder = DataLoaderBuilder::new(EnhancementBatcher::<B>::new(device))
        .batch_size(batch_size);
    // Burn spawns exactly `num_workers` threads when set, so 0 must stay unset.
    if num_workers > 0 {
        builder = builder.num_workers(num_workers);
    }
    if let Some(seed) = shuffle_seed {
        builder = builder.shuffle(seed);
    }
    builder.build(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_batch_shape_and_order() {
        let device  = Default::default();
        let batcher = EnhancementBatcher::<NdArray>::new(device);
        let items = vec![
            SpeechPair::new("a", vec![0.1, 0.2, 0.3], vec![1.0, 1.0, 1.0]),
            SpeechPair::new("b", vec![0.4, 0.5, 0.6], vec![2.0, 2.0, 2.0]),
        ];

        let batch = batcher.batch(items);
        assert_eq!(batch.names, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(batch.noisy.dims(), [2, 1, 3]);
        assert_eq!(batch.clean.dims(), [2, 1, 3]);

        let noisy: Vec<f32> = batch.noisy.into_data().to_vec::<f32>().unwrap();
        assert_eq!(noisy, vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
    }
}
