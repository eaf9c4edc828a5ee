//! Evaluation configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_EVALUATION_MAX_LEVEL, DEFAULT_WRITE_REPORTS};

/// Configuration for the evaluator and report writer.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Deepest level whose children are still evaluated. Default: 512.
    pub max_level: Option<usize>,
    /// Write `<splitter>_evaluation.json` after each run. Default: true.
    pub write_reports: Option<bool>,
    /// Directory for reports. Default: the storage directory.
    pub report_directory: Option<String>,
}

impl EvaluationConfig {
    pub fn effective_max_level(&self) -> usize {
        self.max_level.unwrap_or(DEFAULT_EVALUATION_MAX_LEVEL)
    }

    pub fn effective_write_reports(&self) -> bool {
        self.write_reports.unwrap_or(DEFAULT_WRITE_REPORTS)
    }
}
