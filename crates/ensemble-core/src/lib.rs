//! # ensemble-core
//!
//! Foundation crate for sub-ensemble decomposition.
//! Defines the ensemble data model, node identity, errors, config, events,
//! tracing setup, and the repository/splitter traits.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod events;
pub mod traits;
pub mod tracing;
pub mod types;

// Re-export the most commonly used types at the crate root.
pub use config::EnsembleConfig;
pub use errors::{DecompositionError, EnsembleError, SplitError, StorageError};
pub use events::EventDispatcher;
pub use traits::{EnsembleSplitter, NodeRepository, StoreOutcome};
pub use types::{
    Branch, EnsembleStack, EnsembleView, GridShape, MemberSet, NodeKey, NodePath, NodeState,
    NormalityField, VoxelMask,
};
