// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Plain Rust types that describe a training run:
//
//   speech_pair.rs - one aligned (noisy, clean) utterance
//   run_mode.rs    - how the run starts (fresh or resumed) and
//                    which devices it may allocate on
//   traits.rs      - abstractions the data layer implements
//
// Nothing in here touches Burn, the filesystem, or clap.

// One aligned noisy/clean utterance
pub mod speech_pair;

// Resume intent and device selection
pub mod run_mode;

// Core abstractions (traits) that other layers implement
pub mod traits;
