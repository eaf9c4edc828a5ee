//! Ensemble splitters: k-means, field similarity, and rank ordering.

pub mod agglomerative;
pub mod features;
pub mod field_similarity;
pub mod kmeans;
pub mod ranking;

use ensemble_core::config::{EnsembleConfig, SplitterKind};
use ensemble_core::errors::SplitError;
use ensemble_core::traits::EnsembleSplitter;
use ensemble_core::types::{EnsembleView, VoxelMask};

pub use field_similarity::FieldSimilaritySplitter;
pub use kmeans::KMeansSplitter;
pub use ranking::RankSplitter;

/// Build the splitter for `kind` from the resolved configuration.
pub fn build_splitter(kind: SplitterKind, config: &EnsembleConfig) -> Box<dyn EnsembleSplitter> {
    match kind {
        SplitterKind::Kmeans => Box::new(KMeansSplitter::from_config(&config.kmeans)),
        SplitterKind::FieldSimilarity => Box::new(FieldSimilaritySplitter::new()),
        SplitterKind::Ranking => Box::new(RankSplitter::from_config(config)),
    }
}

/// Reject views with fewer than `required` members and empty masks.
pub(crate) fn check_inputs(
    splitter: &str,
    ensemble: &EnsembleView<'_>,
    mask: &VoxelMask,
    required: usize,
) -> Result<(), SplitError> {
    if ensemble.member_count() < required {
        return Err(SplitError::TooFewMembers {
            splitter: splitter.to_string(),
            required,
            actual: ensemble.member_count(),
        });
    }
    ensemble.shape().ensure_matches(&mask.shape())?;
    if mask.is_empty() {
        return Err(SplitError::EmptyMask {
            splitter: splitter.to_string(),
        });
    }
    Ok(())
}
