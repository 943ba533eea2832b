//! Sample-quality metrics, the evaluation pipeline and its report writers.

pub mod evaluator;
pub mod metrics;
pub mod report;

pub use evaluator::{Collaborators, EvaluationReport, Evaluator};
pub use metrics::{EvaluatedBatch, EvaluationRequest, MetricEvaluator, MetricSnapshot};
pub use report::{EvaluationRecord, MODEL_PATH_COLUMN, write_grid};
