//! Ensemble data model: grid, volume stack, masks, member sets, node identity.

pub mod field;
pub mod grid;
pub mod mask;
pub mod members;
pub mod node;
pub mod stack;

pub use field::NormalityField;
pub use grid::GridShape;
pub use mask::VoxelMask;
pub use members::MemberSet;
pub use node::{Branch, NodeKey, NodePath, NodeState};
pub use stack::{EnsembleStack, EnsembleView};
