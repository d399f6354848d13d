// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// Everything between WAV files on disk and tensor batches:
//
//   dataset_dir/{noisy,clean}/*.wav
//       │
//       ▼
//   WavPairLoader     → lists pairs in sorted order, decodes WAV
//       │
//       ▼
//   SpeechDataset     → applies offset/limit, Burn Dataset impl
//       │  (Preprocessor fits every pair to sample_length)
//       ▼
//   EnhancementBatcher → stacks pairs into [N, 1, T] tensors
//       │
//       ▼
//   DataLoader        → Burn's DataLoaderBuilder (batch size,
//                       workers, shuffle) feeds the trainer

/// Finds noisy/clean pairs and decodes WAV files
pub mod loader;

/// Crops or pads pairs to a fixed segment length
pub mod preprocessor;

/// Implements Burn's Dataset trait for speech pairs
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
