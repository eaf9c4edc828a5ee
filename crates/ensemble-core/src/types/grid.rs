//! Voxel grid extents.

use serde::{Deserialize, Serialize};

use crate::errors::EnsembleError;

/// Extents of a 3D voxel grid. Voxels are stored x-major (`x` slowest,
/// `z` fastest), matching a C-ordered `[x][y][z]` array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridShape {
    dims: [usize; 3],
}

impl GridShape {
    /// Create a grid shape. Every extent must be non-zero.
    pub fn new(dims: [usize; 3]) -> Result<Self, EnsembleError> {
        if dims.iter().any(|&d| d == 0) {
            return Err(EnsembleError::EmptyGrid { dims });
        }
        Ok(Self { dims })
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// Total number of voxels.
    pub fn voxel_count(&self) -> usize {
        self.dims.iter().product()
    }

    /// Flat voxel index of `(x, y, z)`, or `None` when out of bounds.
    pub fn index(&self, x: usize, y: usize, z: usize) -> Option<usize> {
        let [dx, dy, dz] = self.dims;
        if x >= dx || y >= dy || z >= dz {
            return None;
        }
        Some((x * dy + y) * dz + z)
    }

    /// Inverse of [`GridShape::index`].
    pub fn coordinates(&self, index: usize) -> Option<(usize, usize, usize)> {
        if index >= self.voxel_count() {
            return None;
        }
        let [_, dy, dz] = self.dims;
        Some((index / (dy * dz), (index / dz) % dy, index % dz))
    }

    /// Fail with `ShapeMismatch` unless `other` has the same extents.
    pub fn ensure_matches(&self, other: &GridShape) -> Result<(), EnsembleError> {
        if self != other {
            return Err(EnsembleError::ShapeMismatch {
                expected: self.dims,
                actual: other.dims,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_extent_is_rejected() {
        assert!(GridShape::new([4, 0, 2]).is_err());
    }

    #[test]
    fn index_and_coordinates_are_inverse() {
        let shape = GridShape::new([3, 4, 5]).unwrap();
        for i in 0..shape.voxel_count() {
            let (x, y, z) = shape.coordinates(i).unwrap();
            assert_eq!(shape.index(x, y, z), Some(i));
        }
        assert_eq!(shape.index(3, 0, 0), None);
        assert_eq!(shape.coordinates(60), None);
    }
}
