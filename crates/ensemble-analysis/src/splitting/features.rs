//! Member feature vectors over the active voxels.

use ensemble_core::types::{EnsembleView, VoxelMask};

/// Dense row-major matrix: one row per member, one column per active voxel.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl FeatureMatrix {
    /// Gather every member's values at the active voxels of `mask`.
    pub fn from_view(ensemble: &EnsembleView<'_>, mask: &VoxelMask) -> Self {
        let voxels: Vec<usize> = mask.active_voxels().collect();
        let rows = ensemble.member_count();
        let cols = voxels.len();
        let mut data = Vec::with_capacity(rows * cols);
        for member in 0..rows {
            data.extend(voxels.iter().map(|&v| f64::from(ensemble.value(member, v))));
        }
        Self { rows, cols, data }
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> Self {
        let cols = rows.first().map_or(0, Vec::len);
        let n = rows.len();
        let data: Vec<f64> = rows.into_iter().flatten().collect();
        debug_assert_eq!(data.len(), n * cols);
        Self {
            rows: n,
            cols,
            data,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }

    /// `(min, max)` of each row. Empty rows give `(+inf, -inf)`.
    pub fn row_ranges(&self) -> Vec<(f64, f64)> {
        (0..self.rows)
            .map(|i| {
                self.row(i)
                    .iter()
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                        (lo.min(v), hi.max(v))
                    })
            })
            .collect()
    }

    /// Mean over columns of the population variance of each column.
    pub fn mean_column_variance(&self) -> f64 {
        if self.rows == 0 || self.cols == 0 {
            return 0.0;
        }
        let n = self.rows as f64;
        let mut total = 0.0;
        for c in 0..self.cols {
            let mean = (0..self.rows).map(|r| self.data[r * self.cols + c]).sum::<f64>() / n;
            total += (0..self.rows)
                .map(|r| {
                    let d = self.data[r * self.cols + c] - mean;
                    d * d
                })
                .sum::<f64>()
                / n;
        }
        total / self.cols as f64
    }
}

pub fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
