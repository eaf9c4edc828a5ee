//! # ensemble-analysis
//!
//! Splits an ensemble of 3D scalar fields into a binary tree of
//! sub-ensembles whose voxels pass a per-voxel Shapiro-Wilk normality test,
//! then scores how much of the grid the tree explains.
//!
//! - [`normality`]: per-voxel p-value fields.
//! - [`splitting`]: k-means, field-similarity and rank-based bipartitions.
//! - [`decomposition`]: resumable recursive decomposer over a node repository.
//! - [`evaluation`]: explainability aggregation and JSON reports.
//! - [`pipeline`]: runs every configured splitter end to end.

pub mod decomposition;
pub mod evaluation;
pub mod normality;
pub mod pipeline;
pub mod splitting;

pub use decomposition::{DecompositionReport, Decomposer};
pub use evaluation::{EvaluationRecord, Evaluator};
pub use normality::NormalityTester;
pub use pipeline::{DecompositionPipeline, SplitterRun};
pub use splitting::{build_splitter, FieldSimilaritySplitter, KMeansSplitter, RankSplitter};
