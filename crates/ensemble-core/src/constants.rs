// Single source of truth for all default values.

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// --- Normality ---
/// p-value at or above which a voxel counts as normal.
pub const DEFAULT_SIGNIFICANCE: f64 = 0.05;
/// Below this many members no normality test is run and every voxel is normal.
pub const MIN_TESTABLE_MEMBERS: usize = 3;
/// p-value stored for voxels outside the active mask.
pub const UNTESTED_P_VALUE: f32 = 1.0;

// --- Decomposition ---
pub const DEFAULT_MAX_DEPTH: usize = 4;
/// Nodes with fewer members than this are leaves.
pub const DEFAULT_MIN_SPLIT_MEMBERS: usize = 6;

// --- Splitters ---
pub const KMEANS_IDENTIFIER: &str = "kmeans";
pub const FIELD_SIMILARITY_IDENTIFIER: &str = "field_similarity";
pub const RANKING_IDENTIFIER: &str = "ranking";
pub const DEFAULT_KMEANS_SEED: u64 = 42;
pub const DEFAULT_KMEANS_MAX_ITERATIONS: usize = 300;
pub const DEFAULT_KMEANS_TOLERANCE: f64 = 1e-4;
pub const DEFAULT_RANKING_MIN_SIDE_MEMBERS: usize = 3;

// --- Evaluation ---
pub const DEFAULT_EVALUATION_MAX_LEVEL: usize = 512;
pub const DEFAULT_WRITE_REPORTS: bool = true;
pub const EVALUATION_REPORT_SUFFIX: &str = "_evaluation.json";

// --- Storage ---
pub const DEFAULT_STORAGE_DIRECTORY: &str = "subensembles";
pub const DEFAULT_DB_FILENAME: &str = "subensembles.db";
pub const ROOT_KEY: &str = "root";
