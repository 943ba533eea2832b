//! # molgen-ml — training and evaluation of molecular graph generators
//!
//! Orchestrates the life of one run configuration:
//! 1. **Training** — epochs over the training stream, a sampled batch scored
//!    every epoch, early stopping on the selection metric and a single-best
//!    checkpoint on disk ([`training`])
//! 2. **Sampling** — raw samples repaired by a fix strategy, and resampling
//!    until a batch is fully valid under a bounded attempt budget ([`sampling`])
//! 3. **Evaluation** — the saved checkpoint scored on raw and resampled
//!    batches, with timings and likelihoods, written as a one-row table and
//!    two image grids ([`eval`])
//!
//! The model, chemistry toolkit and metric implementations stay behind traits
//! ([`GraphModel`], [`chem::MoleculeValidator`], [`chem::MoleculeRenderer`],
//! [`eval::MetricEvaluator`]).

// Data and capabilities
pub mod chem;
pub mod error;
pub mod graph;
pub mod model;
pub mod optim;

// Pipelines
pub mod eval;
pub mod sampling;
pub mod training;

// Re-exports
pub use error::{MlError, MlResult};
pub use eval::{Collaborators, EvaluationReport, Evaluator, MetricEvaluator, MetricSnapshot};
pub use graph::{DataLoaders, DatasetInfo, GraphBatch, GraphLoader, GraphSample, MolecularData};
pub use model::{GraphModel, ModelMode, Parameter};
pub use optim::{Adam, Optimizer};
pub use training::{CheckpointManager, EarlyStopping, Trainer, TrainingOutcome};
