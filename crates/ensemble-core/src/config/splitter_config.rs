//! Splitter configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_KMEANS_MAX_ITERATIONS, DEFAULT_KMEANS_SEED, DEFAULT_KMEANS_TOLERANCE,
    DEFAULT_RANKING_MIN_SIDE_MEMBERS,
};

/// Configuration for the k-means splitter.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct KMeansConfig {
    /// Seed for k-means++ initialization. Default: 42.
    pub seed: Option<u64>,
    /// Maximum Lloyd iterations. Default: 300.
    pub max_iterations: Option<usize>,
    /// Convergence tolerance relative to the mean feature variance. Default: 1e-4.
    pub tolerance: Option<f64>,
}

impl KMeansConfig {
    pub fn effective_seed(&self) -> u64 {
        self.seed.unwrap_or(DEFAULT_KMEANS_SEED)
    }

    pub fn effective_max_iterations(&self) -> usize {
        self.max_iterations.unwrap_or(DEFAULT_KMEANS_MAX_ITERATIONS)
    }

    pub fn effective_tolerance(&self) -> f64 {
        self.tolerance.unwrap_or(DEFAULT_KMEANS_TOLERANCE)
    }
}

/// Configuration for the rank-based splitter.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RankingConfig {
    /// Minimum members on each side of a candidate split. Default: 3.
    pub min_side_members: Option<usize>,
}

impl RankingConfig {
    pub fn effective_min_side_members(&self) -> usize {
        self.min_side_members.unwrap_or(DEFAULT_RANKING_MIN_SIDE_MEMBERS)
    }
}
