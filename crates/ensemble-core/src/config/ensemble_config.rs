//! Top-level configuration with layered resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{
    DecompositionConfig, EvaluationConfig, KMeansConfig, RankingConfig, SplitterKind,
    StorageBackend, StorageConfig,
};
use crate::errors::ConfigError;

/// Project configuration file looked up in the project root.
pub const PROJECT_CONFIG_FILE: &str = "ensemble.toml";

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`ENSEMBLE_*`)
/// 3. Project config (`ensemble.toml` in the project root)
/// 4. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EnsembleConfig {
    pub decomposition: DecompositionConfig,
    pub kmeans: KMeansConfig,
    pub ranking: RankingConfig,
    pub evaluation: EvaluationConfig,
    pub storage: StorageConfig,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub max_depth: Option<usize>,
    pub significance: Option<f64>,
    pub splitters: Option<Vec<SplitterKind>>,
    pub storage_backend: Option<StorageBackend>,
    pub storage_directory: Option<String>,
    pub evaluation_max_level: Option<usize>,
}

impl EnsembleConfig {
    /// Load configuration with layered resolution rooted at `root`.
    pub fn load(root: &Path, cli_overrides: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Layer 3: project config
        let project_config_path = root.join(PROJECT_CONFIG_FILE);
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        // Layer 2: environment variables
        Self::apply_env_overrides(&mut config);

        // Layer 1 (highest priority): CLI flags
        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration values.
    pub fn validate(config: &EnsembleConfig) -> Result<(), ConfigError> {
        let significance = config.decomposition.effective_significance();
        if !(significance > 0.0 && significance < 1.0) {
            return Err(ConfigError::ValidationFailed {
                field: "decomposition.significance".to_string(),
                message: "must be strictly between 0.0 and 1.0".to_string(),
            });
        }
        let min_split = config.decomposition.effective_min_split_members();
        if min_split < 2 {
            return Err(ConfigError::ValidationFailed {
                field: "decomposition.min_split_members".to_string(),
                message: "must be at least 2".to_string(),
            });
        }
        if config.kmeans.effective_max_iterations() == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "kmeans.max_iterations".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        let tolerance = config.kmeans.effective_tolerance();
        if !(tolerance.is_finite() && tolerance > 0.0) {
            return Err(ConfigError::ValidationFailed {
                field: "kmeans.tolerance".to_string(),
                message: "must be a positive number".to_string(),
            });
        }
        let min_side = config.ranking.effective_min_side_members();
        if min_side == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "ranking.min_side_members".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if 2 * min_side > min_split {
            return Err(ConfigError::ValidationFailed {
                field: "ranking.min_side_members".to_string(),
                message: format!(
                    "two sides of {min_side} members do not fit in a node of {min_split}"
                ),
            });
        }
        if let Some(ref dir) = config.storage.directory {
            if dir.trim().is_empty() {
                return Err(ConfigError::ValidationFailed {
                    field: "storage.directory".to_string(),
                    message: "must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Directory receiving evaluation reports.
    pub fn report_directory(&self) -> PathBuf {
        self.evaluation
            .report_directory
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| self.storage.effective_directory())
    }

    /// Merge a TOML file into the existing config.
    fn merge_toml_file(config: &mut EnsembleConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: EnsembleConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`, where `other` values override `base` values
    /// only when `other` has a `Some` value.
    fn merge(base: &mut EnsembleConfig, other: &EnsembleConfig) {
        // Decomposition
        if other.decomposition.max_depth.is_some() {
            base.decomposition.max_depth = other.decomposition.max_depth;
        }
        if other.decomposition.min_split_members.is_some() {
            base.decomposition.min_split_members = other.decomposition.min_split_members;
        }
        if other.decomposition.significance.is_some() {
            base.decomposition.significance = other.decomposition.significance;
        }
        if !other.decomposition.splitters.is_empty() {
            base.decomposition.splitters = other.decomposition.splitters.clone();
        }

        // Splitters
        if other.kmeans.seed.is_some() {
            base.kmeans.seed = other.kmeans.seed;
        }
        if other.kmeans.max_iterations.is_some() {
            base.kmeans.max_iterations = other.kmeans.max_iterations;
        }
        if other.kmeans.tolerance.is_some() {
            base.kmeans.tolerance = other.kmeans.tolerance;
        }
        if other.ranking.min_side_members.is_some() {
            base.ranking.min_side_members = other.ranking.min_side_members;
        }

        // Evaluation
        if other.evaluation.max_level.is_some() {
            base.evaluation.max_level = other.evaluation.max_level;
        }
        if other.evaluation.write_reports.is_some() {
            base.evaluation.write_reports = other.evaluation.write_reports;
        }
        if other.evaluation.report_directory.is_some() {
            base.evaluation.report_directory = other.evaluation.report_directory.clone();
        }

        // Storage
        if other.storage.backend.is_some() {
            base.storage.backend = other.storage.backend;
        }
        if other.storage.directory.is_some() {
            base.storage.directory = other.storage.directory.clone();
        }
        if other.storage.database_file.is_some() {
            base.storage.database_file = other.storage.database_file.clone();
        }
    }

    /// Apply environment variable overrides.
    /// Pattern: `ENSEMBLE_MAX_DEPTH`, `ENSEMBLE_STORAGE_BACKEND`, etc.
    /// Unparseable values are ignored.
    fn apply_env_overrides(config: &mut EnsembleConfig) {
        if let Ok(val) = std::env::var("ENSEMBLE_MAX_DEPTH") {
            if let Ok(v) = val.parse::<usize>() {
                config.decomposition.max_depth = Some(v);
            }
        }
        if let Ok(val) = std::env::var("ENSEMBLE_MIN_SPLIT_MEMBERS") {
            if let Ok(v) = val.parse::<usize>() {
                config.decomposition.min_split_members = Some(v);
            }
        }
        if let Ok(val) = std::env::var("ENSEMBLE_SIGNIFICANCE") {
            if let Ok(v) = val.parse::<f64>() {
                config.decomposition.significance = Some(v);
            }
        }
        if let Ok(val) = std::env::var("ENSEMBLE_SPLITTERS") {
            let parsed: Result<Vec<SplitterKind>, _> = val
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(str::parse)
                .collect();
            if let Ok(v) = parsed {
                if !v.is_empty() {
                    config.decomposition.splitters = v;
                }
            }
        }
        if let Ok(val) = std::env::var("ENSEMBLE_KMEANS_SEED") {
            if let Ok(v) = val.parse::<u64>() {
                config.kmeans.seed = Some(v);
            }
        }
        if let Ok(val) = std::env::var("ENSEMBLE_EVALUATION_MAX_LEVEL") {
            if let Ok(v) = val.parse::<usize>() {
                config.evaluation.max_level = Some(v);
            }
        }
        if let Ok(val) = std::env::var("ENSEMBLE_STORAGE_BACKEND") {
            if let Ok(v) = val.parse::<StorageBackend>() {
                config.storage.backend = Some(v);
            }
        }
        if let Ok(val) = std::env::var("ENSEMBLE_STORAGE_DIRECTORY") {
            config.storage.directory = Some(val);
        }
    }

    /// Apply CLI overrides (highest priority).
    fn apply_cli_overrides(config: &mut EnsembleConfig, cli: &CliOverrides) {
        if let Some(v) = cli.max_depth {
            config.decomposition.max_depth = Some(v);
        }
        if let Some(v) = cli.significance {
            config.decomposition.significance = Some(v);
        }
        if let Some(ref v) = cli.splitters {
            config.decomposition.splitters = v.clone();
        }
        if let Some(v) = cli.storage_backend {
            config.storage.backend = Some(v);
        }
        if let Some(ref v) = cli.storage_directory {
            config.storage.directory = Some(v.clone());
        }
        if let Some(v) = cli.evaluation_max_level {
            config.evaluation.max_level = Some(v);
        }
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}
