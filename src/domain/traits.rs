// ============================================================
// Layer 3 - Core Traits (Abstractions)
// ============================================================
// The application layer asks for speech pairs through these
// traits, so the WAV-directory loader can be swapped for any
// other source (a manifest file, an archive) without touching
// the launcher.

use anyhow::Result;
use crate::domain::speech_pair::PairPaths;

// ─── PairSource ───────────────────────────────────────────────────────────────
/// Anything that can enumerate noisy/clean file pairs.
///
/// Implementations:
///   - WavPairLoader → `noisy/` and `clean/` subdirectories of one root
pub trait PairSource {
    /// List every available pair in a stable order.
    fn list_pairs(&self) -> Result<Vec<PairPaths>>;
}
