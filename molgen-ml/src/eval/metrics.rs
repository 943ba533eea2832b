//! Metric snapshots and the metric-computation collaborator.

use crate::chem::Molecule;
use crate::error::MlResult;
use crate::graph::{DataLoaders, DatasetInfo, GraphBatch};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metric name to value, e.g. `valid`, `unique`, `novel`, `score`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot(BTreeMap<String, f64>);

impl MetricSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Copy with every name prefixed.
    pub fn with_prefix(&self, prefix: &str) -> Self {
        Self(
            self.0
                .iter()
                .map(|(k, v)| (format!("{prefix}{k}"), *v))
                .collect(),
        )
    }

    /// Merge `other` in; its values win on name collisions.
    pub fn extend(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    /// One-line `name=value` summary for logs.
    pub fn summary(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{k}={v:.4}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromIterator<(String, f64)> for MetricSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// What to compute for a batch of sampled graphs.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationRequest<'a> {
    pub loaders: &'a DataLoaders,
    pub dataset: &'a DatasetInfo,
    pub canonical: bool,
    /// Basic validity/uniqueness/novelty/score only; skip distributional
    /// comparisons and molecule decoding.
    pub metrics_only: bool,
}

/// Metrics of a batch plus, unless `metrics_only`, its decoded molecules.
#[derive(Debug, Clone, Default)]
pub struct EvaluatedBatch {
    pub metrics: MetricSnapshot,
    pub molecules: Vec<Molecule>,
}

/// Computes sample-quality metrics against the reference data.
pub trait MetricEvaluator {
    fn evaluate(&self, batch: &GraphBatch, request: &EvaluationRequest<'_>)
    -> MlResult<EvaluatedBatch>;
}
