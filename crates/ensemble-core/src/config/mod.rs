//! Configuration system.
//! TOML-based, layered resolution: CLI > env > project file > defaults.

pub mod decomposition_config;
pub mod ensemble_config;
pub mod evaluation_config;
pub mod splitter_config;
pub mod storage_config;

pub use decomposition_config::{DecompositionConfig, SplitterKind};
pub use ensemble_config::{CliOverrides, EnsembleConfig, PROJECT_CONFIG_FILE};
pub use evaluation_config::EvaluationConfig;
pub use splitter_config::{KMeansConfig, RankingConfig};
pub use storage_config::{StorageBackend, StorageConfig};
