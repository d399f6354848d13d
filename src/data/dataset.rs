use anyhow::{bail, Context, Result};
use burn::data::dataset::Dataset;

use crate::data::{loader::read_wav, preprocessor::Preprocessor};
use crate::domain::speech_pair::{PairPaths, SpeechPair};
use crate::domain::traits::PairSource;

/// Paired noisy/clean utterances, decoded and fitted to a fixed
/// segment length when the dataset is built.
///
/// All audio is decoded up front. A file that cannot be read
/// fails construction instead of surfacing mid-epoch.
#[derive(Debug)]
pub struct SpeechDataset {
    pairs: Vec<SpeechPair>,
}

impl SpeechDataset {
    /// Select the `[offset, offset + limit)` window of the source's
    /// sorted pairs and load it.
    pub fn from_source(
        source:       &dyn PairSource,
        limit:        Option<usize>,
        offset:       usize,
        preprocessor: &Preprocessor,
    ) -> Result<Self> {
        let all      = source.list_pairs()?;
        let total    = all.len();
        let selected = select_window(all, limit, offset);

        if selected.is_empty() {
            bail!(
                "No training pairs selected (found {total}, offset {offset}, limit {limit:?})"
            );
        }

        let mut pairs = Vec::with_capacity(selected.len());
        for (index, paths) in selected.iter().enumerate() {
            pairs.push(load_pair(index, paths, preprocessor)?);
        }

        tracing::info!(
            "Loaded {} of {} pairs ({} samples each)",
            pairs.len(), total, preprocessor.sample_length()
        );
        Ok(Self { pairs })
    }

    pub fn pair_count(&self) -> usize { self.pairs.len() }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|p| p.name.as_str())
    }
}

impl Dataset<SpeechPair> for SpeechDataset {
    fn get(&self, index: usize) -> Option<SpeechPair> {
        self.pairs.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.pairs.len()
    }
}

/// Pagination over an already sorted list: skip `offset`, then
/// keep at most `limit` entries (all of them when `None`).
pub fn select_window<T>(items: Vec<T>, limit: Option<usize>, offset: usize) -> Vec<T> {
    let skipped = items.into_iter().skip(offset);
    match limit {
        Some(n) => skipped.take(n).collect(),
        None    => skipped.collect(),
    }
}

fn load_pair(index: usize, paths: &PairPaths, preprocessor: &Preprocessor) -> Result<SpeechPair> {
    let (noisy, noisy_rate) = read_wav(&paths.noisy)?;
    let (clean, clean_rate) = read_wav(&paths.clean)?;
    if noisy_rate != clean_rate {
        bail!(
            "Sample rate mismatch for '{}': noisy {} Hz, clean {} Hz",
            paths.name, noisy_rate, clean_rate
        );
    }
    let (noisy, clean) = preprocessor.fit(index, noisy, clean);
    Ok(SpeechPair::new(paths.name.clone(), noisy, clean))
}

/// Convenience used by the launcher: list, window and load in one call.
pub fn load_dataset_dir(
    dir:           &std::path::Path,
    limit:         Option<usize>,
    offset:        usize,
    sample_length: usize,
    seed:          u64,
) -> Result<SpeechDataset> {
    let loader       = crate::data::loader::WavPairLoader::new(dir);
    let preprocessor = Preprocessor::new(sample_length, seed);
    SpeechDataset::from_source(&loader, limit, offset, &preprocessor)
        .with_context(|| format!("Cannot build dataset from '{}'", dir.display()))
}
