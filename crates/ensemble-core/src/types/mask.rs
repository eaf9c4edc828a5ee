//! Boolean voxel masks.

use serde::{Deserialize, Serialize};

use super::GridShape;
use crate::errors::EnsembleError;

/// Boolean field over a voxel grid marking the voxels under consideration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoxelMask {
    shape: GridShape,
    bits: Vec<bool>,
}

impl VoxelMask {
    /// Mask with every voxel active.
    pub fn full(shape: GridShape) -> Self {
        Self {
            shape,
            bits: vec![true; shape.voxel_count()],
        }
    }

    /// Mask with no voxel active.
    pub fn empty(shape: GridShape) -> Self {
        Self {
            shape,
            bits: vec![false; shape.voxel_count()],
        }
    }

    pub fn from_bits(shape: GridShape, bits: Vec<bool>) -> Result<Self, EnsembleError> {
        if bits.len() != shape.voxel_count() {
            return Err(EnsembleError::FieldLength {
                expected: shape.voxel_count(),
                actual: bits.len(),
            });
        }
        Ok(Self { shape, bits })
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    pub fn get(&self, voxel: usize) -> bool {
        self.bits.get(voxel).copied().unwrap_or(false)
    }

    /// Number of active voxels.
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.bits.iter().any(|&b| b)
    }

    /// Flat indices of the active voxels, ascending.
    pub fn active_voxels(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits
            .iter()
            .enumerate()
            .filter_map(|(i, &b)| if b { Some(i) } else { None })
    }

    pub fn and(&self, other: &VoxelMask) -> Result<VoxelMask, EnsembleError> {
        self.zip_with(other, |a, b| a && b)
    }

    pub fn or(&self, other: &VoxelMask) -> Result<VoxelMask, EnsembleError> {
        self.zip_with(other, |a, b| a || b)
    }

    /// `self AND NOT other`.
    pub fn and_not(&self, other: &VoxelMask) -> Result<VoxelMask, EnsembleError> {
        self.zip_with(other, |a, b| a && !b)
    }

    /// True when every voxel active here is also active in `other`.
    pub fn is_subset_of(&self, other: &VoxelMask) -> bool {
        self.shape == other.shape
            && self
                .bits
                .iter()
                .zip(&other.bits)
                .all(|(&a, &b)| !a || b)
    }

    fn zip_with(
        &self,
        other: &VoxelMask,
        op: impl Fn(bool, bool) -> bool,
    ) -> Result<VoxelMask, EnsembleError> {
        self.shape.ensure_matches(&other.shape)?;
        let bits = self
            .bits
            .iter()
            .zip(&other.bits)
            .map(|(&a, &b)| op(a, b))
            .collect();
        Ok(VoxelMask {
            shape: self.shape,
            bits,
        })
    }
}
