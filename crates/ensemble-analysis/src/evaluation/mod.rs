//! Explainability of a persisted decomposition.

pub mod evaluator;
pub mod record;
pub mod report;

pub use evaluator::{CurvePoint, Evaluation, Evaluator};
pub use record::{ChildEvaluation, EvaluationRecord};
pub use report::{report_path, to_report_json, write_report};
