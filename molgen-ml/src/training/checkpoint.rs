//! Checkpoint management for training runs.
//!
//! A run keeps a single checkpoint: the model state with the best selection
//! metric so far. Promoting a new best writes it durably first and only then
//! retires the previous file.

use crate::error::{MlError, MlResult};
use chrono::{DateTime, Utc};
use molgen_core::persistence;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A checkpoint written during training.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckpointRecord {
    pub path: PathBuf,
    pub epoch: usize,
    pub metric: f64,
    pub sha256: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

/// Owns the single-best checkpoint slot of a run.
#[derive(Debug, Default)]
pub struct CheckpointManager {
    best: Option<CheckpointRecord>,
}

impl CheckpointManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn best(&self) -> Option<&CheckpointRecord> {
        self.best.as_ref()
    }

    pub fn best_path(&self) -> Option<&Path> {
        self.best.as_ref().map(|c| c.path.as_path())
    }

    /// Save `model` as the new best and retire the previous best file.
    pub fn promote<M: Serialize>(
        &mut self,
        model: &M,
        path: &Path,
        epoch: usize,
        metric: f64,
    ) -> MlResult<&CheckpointRecord> {
        let (sha256, size_bytes) = Self::save(model, path)?;
        if let Some(previous) = self.best.take() {
            Self::retain_single_best(path, &previous.path);
        }
        debug!(path = %path.display(), epoch, metric, "checkpoint promoted");
        Ok(self.best.insert(CheckpointRecord {
            path: path.to_path_buf(),
            epoch,
            metric,
            sha256,
            size_bytes,
            created_at: Utc::now(),
        }))
    }

    /// Serialize the full model state to `path`, creating parent directories
    /// and overwriting any existing file. Returns the content hash and size.
    pub fn save<M: Serialize>(model: &M, path: &Path) -> MlResult<(String, u64)> {
        let bytes = serde_json::to_vec(model)?;
        persistence::atomic_write(path, &bytes)?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok((format!("{:x}", hasher.finalize()), bytes.len() as u64))
    }

    /// Delete `previous` unless it is `new_path`. Failures are logged only;
    /// the newer checkpoint stays authoritative.
    pub fn retain_single_best(new_path: &Path, previous: &Path) {
        if previous == new_path {
            return;
        }
        match std::fs::remove_file(previous) {
            Ok(()) => debug!(path = %previous.display(), "retired previous checkpoint"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %previous.display(),
                error = %e,
                "failed to remove previous checkpoint"
            ),
        }
    }

    /// Deserialize a model saved with [`save`](Self::save).
    pub fn load<M: DeserializeOwned>(path: &Path) -> MlResult<M> {
        if !path.is_file() {
            return Err(MlError::CheckpointNotFound(path.to_path_buf()));
        }
        let bytes = std::fs::read(path)?;
        serde_json::from_slice(&bytes).map_err(|source| MlError::Deserialization {
            path: path.to_path_buf(),
            source,
        })
    }
}
