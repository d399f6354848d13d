// ============================================================
// Layer 5 - ML / Model Layer (Burn)
// ============================================================
// Burn-specific model and training code.
//
//   model.rs   - 1-D UNet operating on raw waveforms
//                [batch, 1, samples] → [batch, 1, samples]
//
//   trainer.rs - epoch loop: MSE loss, Adam step, periodic
//                validation (SNR), checkpointing and resume

/// Waveform UNet architecture
pub mod model;

/// Training loop with validation and checkpointing
pub mod trainer;
