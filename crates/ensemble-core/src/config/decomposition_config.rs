//! Decomposition configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_MAX_DEPTH, DEFAULT_MIN_SPLIT_MEMBERS, DEFAULT_SIGNIFICANCE,
    FIELD_SIMILARITY_IDENTIFIER, KMEANS_IDENTIFIER, RANKING_IDENTIFIER,
};

/// The available ensemble splitters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitterKind {
    Kmeans,
    FieldSimilarity,
    Ranking,
}

impl SplitterKind {
    pub const ALL: [SplitterKind; 3] = [
        SplitterKind::Kmeans,
        SplitterKind::FieldSimilarity,
        SplitterKind::Ranking,
    ];

    /// Storage namespace and report prefix of this splitter.
    pub fn identifier(self) -> &'static str {
        match self {
            SplitterKind::Kmeans => KMEANS_IDENTIFIER,
            SplitterKind::FieldSimilarity => FIELD_SIMILARITY_IDENTIFIER,
            SplitterKind::Ranking => RANKING_IDENTIFIER,
        }
    }
}

impl fmt::Display for SplitterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

impl FromStr for SplitterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SplitterKind::ALL
            .into_iter()
            .find(|k| k.identifier() == s.trim())
            .ok_or_else(|| format!("unknown splitter '{s}'"))
    }
}

/// Configuration for the recursive decomposer.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DecompositionConfig {
    /// Maximum tree depth; nodes at this depth are leaves. Default: 4.
    pub max_depth: Option<usize>,
    /// Nodes with fewer members are leaves. Default: 6.
    pub min_split_members: Option<usize>,
    /// p-value at or above which a voxel is normal. Default: 0.05.
    pub significance: Option<f64>,
    /// Splitters run by the pipeline. Default: all three.
    #[serde(default)]
    pub splitters: Vec<SplitterKind>,
}

impl DecompositionConfig {
    /// Returns the effective maximum depth, defaulting to 4.
    pub fn effective_max_depth(&self) -> usize {
        self.max_depth.unwrap_or(DEFAULT_MAX_DEPTH)
    }

    /// Returns the effective split floor, defaulting to 6.
    pub fn effective_min_split_members(&self) -> usize {
        self.min_split_members.unwrap_or(DEFAULT_MIN_SPLIT_MEMBERS)
    }

    /// Returns the effective significance level, defaulting to 0.05.
    pub fn effective_significance(&self) -> f64 {
        self.significance.unwrap_or(DEFAULT_SIGNIFICANCE)
    }

    /// Returns the configured splitters, defaulting to all of them.
    pub fn effective_splitters(&self) -> Vec<SplitterKind> {
        if self.splitters.is_empty() {
            SplitterKind::ALL.to_vec()
        } else {
            self.splitters.clone()
        }
    }
}
