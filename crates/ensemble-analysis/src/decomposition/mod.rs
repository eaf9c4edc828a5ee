//! Resumable recursive decomposition into sub-ensembles.

pub mod decomposer;
pub mod report;

pub use decomposer::Decomposer;
pub use report::{DecompositionReport, NodeSummary};
