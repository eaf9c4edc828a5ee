//! Member clustering by pairwise value-range overlap.

use ensemble_core::constants::FIELD_SIMILARITY_IDENTIFIER;
use ensemble_core::errors::SplitError;
use ensemble_core::events::types::SplitProgressEvent;
use ensemble_core::events::EventDispatcher;
use ensemble_core::traits::EnsembleSplitter;
use ensemble_core::types::{EnsembleView, VoxelMask};

use super::agglomerative::{complete_linkage, DistanceMatrix};
use super::check_inputs;
use super::features::FeatureMatrix;

/// Overlap similarity of two member fields.
///
/// Both fields are rescaled into their joint value range. With `lo` and `hi`
/// the element-wise minimum and maximum of the rescaled fields, the similarity
/// is `Σ(1 - hi) / Σ(1 - lo)`: 1.0 when the fields coincide, falling towards
/// 0.0 as one field sits above the other. A zero joint range or a zero
/// denominator yields 1.0.
pub fn field_similarity(a: &[f64], a_range: (f64, f64), b: &[f64], b_range: (f64, f64)) -> f64 {
    let low = a_range.0.min(b_range.0);
    let high = a_range.1.max(b_range.1);
    let span = high - low;
    if span.is_nan() || span <= 0.0 {
        return 1.0;
    }

    let (mut numerator, mut denominator) = (0.0, 0.0);
    for (&x, &y) in a.iter().zip(b) {
        let x = (x - low) / span;
        let y = (y - low) / span;
        numerator += 1.0 - x.max(y);
        denominator += 1.0 - x.min(y);
    }
    if denominator == 0.0 {
        return 1.0;
    }
    numerator / denominator
}

/// `1 - similarity` for every member pair. `on_row` is called after each row.
pub fn distance_matrix(features: &FeatureMatrix, mut on_row: impl FnMut(usize)) -> DistanceMatrix {
    let n = features.rows();
    let ranges = features.row_ranges();
    let mut distances = DistanceMatrix::zeros(n);
    for i in 0..n {
        for j in i + 1..n {
            let similarity = field_similarity(features.row(i), ranges[i], features.row(j), ranges[j]);
            distances.set(i, j, 1.0 - similarity);
        }
        on_row(i + 1);
    }
    distances
}

/// Splits members into two complete-linkage clusters of field similarity.
/// The cluster holding the first member is the first group.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldSimilaritySplitter;

impl FieldSimilaritySplitter {
    pub fn new() -> Self {
        Self
    }
}

impl EnsembleSplitter for FieldSimilaritySplitter {
    fn identifier(&self) -> &str {
        FIELD_SIMILARITY_IDENTIFIER
    }

    fn split(
        &self,
        ensemble: &EnsembleView<'_>,
        mask: &VoxelMask,
        events: &EventDispatcher,
    ) -> Result<Vec<bool>, SplitError> {
        check_inputs(self.identifier(), ensemble, mask, 2)?;
        let features = FeatureMatrix::from_view(ensemble, mask);
        if !features.is_finite() {
            return Err(SplitError::ClusteringFailed {
                reason: "feature matrix contains non-finite values".to_string(),
            });
        }
        let total = features.rows();
        let distances = distance_matrix(&features, |completed| {
            events.emit_split_progress(&SplitProgressEvent {
                splitter: FIELD_SIMILARITY_IDENTIFIER.to_string(),
                completed,
                total,
            })
        });
        let labels = complete_linkage(&distances, 2);
        Ok(labels.iter().map(|&label| label != 0).collect())
    }
}
