//! Error types for the molgen-ml crate.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for training and evaluation.
#[derive(Debug, Error)]
pub enum MlError {
    #[error("Non-finite loss {value} at batch {batch}")]
    NonFiniteLoss { batch: usize, value: f64 },

    #[error("Loader contains no batches")]
    EmptyLoader,

    #[error("Checkpoint not found: {}", .0.display())]
    CheckpointNotFound(PathBuf),

    #[error("Failed to deserialize checkpoint {}: {source}", .path.display())]
    Deserialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(
        "Resampling budget exhausted: {obtained} of {requested} valid molecules after {attempts} attempts"
    )]
    ResampleBudgetExceeded {
        requested: usize,
        obtained: usize,
        attempts: usize,
    },

    #[error("Shape mismatch: {0}")]
    Shape(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Optimizer error: {0}")]
    Optimizer(String),

    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Configuration error: {0}")]
    Config(#[from] molgen_core::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Collaborator error: {0}")]
    Collaborator(#[from] anyhow::Error),
}

impl MlError {
    pub fn shape(msg: impl Into<String>) -> Self {
        Self::Shape(msg.into())
    }

    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    pub fn optimizer(msg: impl Into<String>) -> Self {
        Self::Optimizer(msg.into())
    }

    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}

pub type MlResult<T> = Result<T, MlError>;
