//! Agglomerative clustering with complete linkage.

/// Symmetric pairwise distance matrix with a zero diagonal.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    n: usize,
    data: Vec<f64>,
}

impl DistanceMatrix {
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            data: vec![0.0; n * n],
        }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    /// Set both `(i, j)` and `(j, i)`.
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.n + j] = value;
        self.data[j * self.n + i] = value;
    }
}

/// Merge clusters until `target` remain, always joining the closest pair.
///
/// Cluster distance is the maximum member distance (complete linkage),
/// maintained with the Lance-Williams update `d(k, i ∪ j) = max(d(k, i), d(k, j))`.
/// Ties go to the lexicographically smallest pair. Returns one label per
/// point; labels are numbered by each cluster's smallest point, so point 0 is
/// always in cluster 0.
pub fn complete_linkage(distances: &DistanceMatrix, target: usize) -> Vec<usize> {
    let n = distances.len();
    let mut d = distances.clone();
    // Each active cluster is represented by its smallest point.
    let mut representative: Vec<usize> = (0..n).collect();
    let mut active = vec![true; n];
    let mut remaining = n;

    while remaining > target.max(1) {
        let mut best: Option<(usize, usize, f64)> = None;
        for i in (0..n).filter(|&i| active[i]) {
            for j in (i + 1..n).filter(|&j| active[j]) {
                let dij = d.get(i, j);
                if best.map_or(!dij.is_nan(), |(_, _, b)| dij < b) {
                    best = Some((i, j, dij));
                }
            }
        }
        let Some((i, j, _)) = best else {
            break;
        };

        for k in (0..n).filter(|&k| active[k] && k != i && k != j) {
            let merged = d.get(k, i).max(d.get(k, j));
            d.set(k, i, merged);
        }
        active[j] = false;
        for r in representative.iter_mut() {
            if *r == j {
                *r = i;
            }
        }
        remaining -= 1;
    }

    let mut label_of = vec![usize::MAX; n];
    let mut next = 0;
    for rep in (0..n).filter(|&r| active[r]) {
        label_of[rep] = next;
        next += 1;
    }
    representative.iter().map(|&r| label_of[r]).collect()
}
