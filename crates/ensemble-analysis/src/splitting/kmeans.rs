//! Two-cluster k-means over member feature vectors.

use ensemble_core::config::KMeansConfig;
use ensemble_core::constants::KMEANS_IDENTIFIER;
use ensemble_core::errors::SplitError;
use ensemble_core::events::types::SplitProgressEvent;
use ensemble_core::events::EventDispatcher;
use ensemble_core::traits::EnsembleSplitter;
use ensemble_core::types::{EnsembleView, VoxelMask};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::features::{squared_distance, FeatureMatrix};
use super::check_inputs;

/// Result of a k-means run.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit {
    pub labels: Vec<usize>,
    pub centroids: Vec<Vec<f64>>,
    pub iterations: usize,
    /// Sum of squared distances to the assigned centroid.
    pub inertia: f64,
}

/// k-means++ seeding: the first centroid is uniform, each next one is drawn
/// with probability proportional to the squared distance to the nearest
/// centroid chosen so far.
pub fn kmeans_plus_plus_init(features: &FeatureMatrix, k: usize, rng: &mut ChaCha8Rng) -> Vec<Vec<f64>> {
    let n = features.rows();
    let mut centroids: Vec<Vec<f64>> = Vec::with_capacity(k);
    if n == 0 || k == 0 {
        return centroids;
    }
    centroids.push(features.row(rng.gen_range(0..n)).to_vec());

    let mut min_distances = vec![f64::INFINITY; n];
    while centroids.len() < k {
        if let Some(last) = centroids.last() {
            for (i, d) in min_distances.iter_mut().enumerate() {
                *d = d.min(squared_distance(features.row(i), last));
            }
        }
        let total: f64 = min_distances.iter().sum();
        let next = if total > 0.0 {
            let target = rng.gen::<f64>() * total;
            let mut cumulative = 0.0;
            let mut chosen = n - 1;
            for (i, &d) in min_distances.iter().enumerate() {
                cumulative += d;
                if cumulative > target && d > 0.0 {
                    chosen = i;
                    break;
                }
            }
            chosen
        } else {
            // Every point coincides with a centroid.
            0
        };
        centroids.push(features.row(next).to_vec());
    }
    centroids
}

fn nearest(point: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (c, centroid) in centroids.iter().enumerate() {
        let d = squared_distance(point, centroid);
        if d < best.1 {
            best = (c, d);
        }
    }
    best
}

/// Lloyd iterations from k-means++ seeds.
///
/// Converges when the total squared centroid shift drops to
/// `tolerance * mean column variance`. A cluster that loses all its points is
/// re-seeded with the point farthest from its current centroid.
pub fn kmeans(
    features: &FeatureMatrix,
    k: usize,
    seed: u64,
    max_iterations: usize,
    tolerance: f64,
    mut on_iteration: impl FnMut(usize),
) -> Result<KMeansFit, SplitError> {
    let n = features.rows();
    if n < k || k == 0 {
        return Err(SplitError::ClusteringFailed {
            reason: format!("cannot form {k} clusters from {n} points"),
        });
    }
    if !features.is_finite() {
        return Err(SplitError::ClusteringFailed {
            reason: "feature matrix contains non-finite values".to_string(),
        });
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut centroids = kmeans_plus_plus_init(features, k, &mut rng);
    let threshold = tolerance * features.mean_column_variance();
    let mut labels = vec![0usize; n];
    let mut iterations = 0;

    while iterations < max_iterations {
        iterations += 1;

        let mut distances = vec![0.0; n];
        for i in 0..n {
            let (label, d) = nearest(features.row(i), &centroids);
            labels[i] = label;
            distances[i] = d;
        }

        let mut counts = vec![0usize; k];
        for &label in &labels {
            counts[label] += 1;
        }
        for cluster in 0..k {
            if counts[cluster] > 0 {
                continue;
            }
            let farthest = distances
                .iter()
                .enumerate()
                .filter(|(i, _)| counts[labels[*i]] > 1)
                .max_by(|(_, a), (_, b)| a.total_cmp(b))
                .map(|(i, _)| i);
            if let Some(i) = farthest {
                counts[labels[i]] -= 1;
                labels[i] = cluster;
                counts[cluster] = 1;
                distances[i] = 0.0;
                tracing::debug!(cluster, point = i, "re-seeded empty cluster");
            }
        }

        let cols = features.cols();
        let mut sums = vec![vec![0.0; cols]; k];
        for (i, &label) in labels.iter().enumerate() {
            for (s, v) in sums[label].iter_mut().zip(features.row(i)) {
                *s += v;
            }
        }
        let mut shift = 0.0;
        for (cluster, sum) in sums.into_iter().enumerate() {
            if counts[cluster] == 0 {
                continue;
            }
            let centroid: Vec<f64> = sum.iter().map(|s| s / counts[cluster] as f64).collect();
            shift += squared_distance(&centroid, &centroids[cluster]);
            centroids[cluster] = centroid;
        }

        on_iteration(iterations);
        if shift <= threshold {
            break;
        }
    }

    for (i, label) in labels.iter_mut().enumerate() {
        *label = nearest(features.row(i), &centroids).0;
    }
    let inertia = labels
        .iter()
        .enumerate()
        .map(|(i, &label)| squared_distance(features.row(i), &centroids[label]))
        .sum();

    Ok(KMeansFit {
        labels,
        centroids,
        iterations,
        inertia,
    })
}

/// Splits members into the two k-means clusters of their active voxel values.
#[derive(Debug, Clone)]
pub struct KMeansSplitter {
    seed: u64,
    max_iterations: usize,
    tolerance: f64,
}

impl Default for KMeansSplitter {
    fn default() -> Self {
        Self::from_config(&KMeansConfig::default())
    }
}

impl KMeansSplitter {
    pub fn new(seed: u64, max_iterations: usize, tolerance: f64) -> Self {
        Self {
            seed,
            max_iterations,
            tolerance,
        }
    }

    pub fn from_config(config: &KMeansConfig) -> Self {
        Self::new(
            config.effective_seed(),
            config.effective_max_iterations(),
            config.effective_tolerance(),
        )
    }
}

impl EnsembleSplitter for KMeansSplitter {
    fn identifier(&self) -> &str {
        KMEANS_IDENTIFIER
    }

    fn split(
        &self,
        ensemble: &EnsembleView<'_>,
        mask: &VoxelMask,
        events: &EventDispatcher,
    ) -> Result<Vec<bool>, SplitError> {
        check_inputs(self.identifier(), ensemble, mask, 2)?;
        let features = FeatureMatrix::from_view(ensemble, mask);
        let fit = kmeans(
            &features,
            2,
            self.seed,
            self.max_iterations,
            self.tolerance,
            |iteration| {
                events.emit_split_progress(&SplitProgressEvent {
                    splitter: KMEANS_IDENTIFIER.to_string(),
                    completed: iteration,
                    total: self.max_iterations,
                })
            },
        )?;
        tracing::debug!(
            iterations = fit.iterations,
            inertia = fit.inertia,
            "k-means converged"
        );
        Ok(fit.labels.iter().map(|&label| label == 1).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_blobs() -> FeatureMatrix {
        FeatureMatrix::from_rows(vec![
            vec![0.0, 0.1],
            vec![0.2, 0.0],
            vec![0.1, 0.2],
            vec![10.0, 10.1],
            vec![10.2, 9.9],
            vec![9.9, 10.0],
        ])
    }

    #[test]
    fn separates_two_blobs() {
        let fit = kmeans(&two_blobs(), 2, 42, 300, 1e-4, |_| {}).unwrap();
        assert_eq!(fit.labels[0], fit.labels[1]);
        assert_eq!(fit.labels[1], fit.labels[2]);
        assert_eq!(fit.labels[3], fit.labels[4]);
        assert_eq!(fit.labels[4], fit.labels[5]);
        assert_ne!(fit.labels[0], fit.labels[3]);
        assert!(fit.inertia < 1.0);
    }

    #[test]
    fn same_seed_same_labels() {
        let a = kmeans(&two_blobs(), 2, 7, 300, 1e-4, |_| {}).unwrap();
        let b = kmeans(&two_blobs(), 2, 7, 300, 1e-4, |_| {}).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn identical_points_do_not_fail() {
        let features = FeatureMatrix::from_rows(vec![vec![1.0, 1.0]; 5]);
        let fit = kmeans(&features, 2, 42, 300, 1e-4, |_| {}).unwrap();
        assert_eq!(fit.labels.len(), 5);
        assert_eq!(fit.inertia, 0.0);
    }

    #[test]
    fn too_few_points_is_an_error() {
        let features = FeatureMatrix::from_rows(vec![vec![1.0]]);
        assert!(matches!(
            kmeans(&features, 2, 42, 300, 1e-4, |_| {}),
            Err(SplitError::ClusteringFailed { .. })
        ));
    }

    #[test]
    fn non_finite_features_are_rejected() {
        let features = FeatureMatrix::from_rows(vec![vec![1.0], vec![f64::NAN], vec![2.0]]);
        assert!(kmeans(&features, 2, 42, 300, 1e-4, |_| {}).is_err());
    }

    #[test]
    fn iterations_are_bounded() {
        let mut calls = 0;
        let fit = kmeans(&two_blobs(), 2, 42, 1, 0.0, |_| calls += 1).unwrap();
        assert_eq!(fit.iterations, 1);
        assert_eq!(calls, 1);
    }
}
