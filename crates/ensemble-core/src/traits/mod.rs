//! Seams between the decomposition engine and its collaborators.

pub mod node_repository;
pub mod splitter;

pub use node_repository::{NodeRepository, StoreOutcome};
pub use splitter::EnsembleSplitter;
