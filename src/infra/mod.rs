// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// File-backed concerns the trainer relies on:
//
//   checkpoint.rs - model/optimizer weights via Burn's
//                   CompactRecorder, a `latest.json` pointer
//                   for resuming, and a copy of the config
//
//   metrics.rs    - one CSV row per epoch for plotting
//                   learning curves after the run

/// Model and optimizer checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;
