//! Per-voxel normality p-values.

use serde::{Deserialize, Serialize};

use super::{GridShape, VoxelMask};
use crate::errors::EnsembleError;

/// Per-voxel p-value field produced by the normality tester.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalityField {
    shape: GridShape,
    p_values: Vec<f32>,
}

impl NormalityField {
    /// Field with every voxel set to `value`.
    pub fn filled(shape: GridShape, value: f32) -> Self {
        Self {
            shape,
            p_values: vec![value; shape.voxel_count()],
        }
    }

    pub fn from_values(shape: GridShape, p_values: Vec<f32>) -> Result<Self, EnsembleError> {
        if p_values.len() != shape.voxel_count() {
            return Err(EnsembleError::FieldLength {
                expected: shape.voxel_count(),
                actual: p_values.len(),
            });
        }
        Ok(Self { shape, p_values })
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    pub fn p_values(&self) -> &[f32] {
        &self.p_values
    }

    pub fn p_value(&self, voxel: usize) -> Option<f32> {
        self.p_values.get(voxel).copied()
    }

    /// Voxels of `mask` whose p-value is at least `significance`.
    pub fn classify(&self, mask: &VoxelMask, significance: f64) -> Result<VoxelMask, EnsembleError> {
        self.shape.ensure_matches(&mask.shape())?;
        let bits = mask
            .bits()
            .iter()
            .zip(&self.p_values)
            .map(|(&active, &p)| active && f64::from(p) >= significance)
            .collect();
        VoxelMask::from_bits(self.shape, bits)
    }

    /// Set a voxel's p-value. Out-of-range voxels are ignored.
    pub fn set(&mut self, voxel: usize, p_value: f32) {
        if let Some(slot) = self.p_values.get_mut(voxel) {
            *slot = p_value;
        }
    }
}
