//! Per-voxel normality testing.

pub mod field;
pub mod shapiro_wilk;

pub use field::NormalityTester;
pub use shapiro_wilk::{shapiro_wilk, ShapiroWilk, ShapiroWilkResult};
