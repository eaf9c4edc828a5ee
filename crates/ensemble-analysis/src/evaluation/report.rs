//! JSON evaluation reports.

use std::fs;
use std::path::{Path, PathBuf};

use ensemble_core::constants::EVALUATION_REPORT_SUFFIX;
use ensemble_core::errors::StorageError;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use super::record::EvaluationRecord;

/// Render `record` with alphabetically sorted keys and 4-space indentation.
pub fn to_report_json(record: &EvaluationRecord) -> Result<String, StorageError> {
    let encoding = |e: serde_json::Error| StorageError::Encoding {
        message: e.to_string(),
    };
    // serde_json maps are ordered by key.
    let value = serde_json::to_value(record).map_err(encoding)?;
    let mut out = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut serializer).map_err(encoding)?;
    String::from_utf8(out).map_err(|e| StorageError::Encoding {
        message: e.to_string(),
    })
}

/// `<directory>/<namespace>_evaluation.json`
pub fn report_path(directory: &Path, namespace: &str) -> PathBuf {
    directory.join(format!("{namespace}{EVALUATION_REPORT_SUFFIX}"))
}

/// Write the report for `namespace` into `directory` and return its path.
pub fn write_report(
    directory: &Path,
    namespace: &str,
    record: &EvaluationRecord,
) -> Result<PathBuf, StorageError> {
    let io_error = |path: &Path, e: std::io::Error| StorageError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    };
    fs::create_dir_all(directory).map_err(|e| io_error(directory, e))?;
    let path = report_path(directory, namespace);
    fs::write(&path, to_report_json(record)?).map_err(|e| io_error(&path, e))?;
    tracing::info!(path = %path.display(), "wrote evaluation report");
    Ok(path)
}
