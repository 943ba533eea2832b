//! Stub collaborators shared by the integration tests.

#![allow(dead_code)]

use molgen_core::{ArtifactLayout, GridLayout, NamingPolicy, RunConfig};
use molgen_ml::chem::{Molecule, MoleculeRenderer, MoleculeValidator};
use molgen_ml::eval::{EvaluatedBatch, EvaluationRequest, MetricEvaluator, MetricSnapshot};
use molgen_ml::{
    DataLoaders, DatasetInfo, GraphBatch, GraphLoader, GraphModel, GraphSample, MlResult,
    ModelMode, MolecularData, Parameter,
};
use ndarray::{Array2, Array3, ArrayD, IxDyn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};

pub const MAX_ATOMS: usize = 4;

pub fn dataset() -> DatasetInfo {
    DatasetInfo::new("qm9", MAX_ATOMS, &["C", "N", "O", "F"])
}

fn batch(size: usize) -> GraphBatch {
    GraphBatch::new(
        Array2::zeros((size, MAX_ATOMS)),
        Array3::zeros((size, MAX_ATOMS, MAX_ATOMS)),
    )
    .unwrap()
}

pub fn loader(batches: usize) -> GraphLoader {
    GraphLoader::new((0..batches).map(|_| batch(2)).collect())
}

pub fn data() -> MolecularData {
    MolecularData::new(
        dataset(),
        DataLoaders {
            train: loader(3),
            valid: loader(2),
            test: loader(2),
        },
    )
}

pub fn run_config(num_epochs: usize) -> RunConfig {
    RunConfig::parse(
        json!({
            "dataset": "qm9",
            "model": "stub",
            "order": "canonical",
            "fix": "mirror",
            "num_epochs": num_epochs,
            "atom_list": ["C", "N", "O", "F"],
            "bvt_hpars": {"ns": 4},
            "optimizer_hpars": {"lr": 0.05}
        }),
        &NamingPolicy::default(),
    )
    .unwrap()
}

pub fn layout(base: &Path) -> ArtifactLayout {
    ArtifactLayout::new(base.to_path_buf(), NamingPolicy::default())
}

/// Quadratic model: NLL of every batch is `offset + sum(w^2)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StubModel {
    pub params: Vec<Parameter>,
    pub offset: f64,
    /// Optimizer-visible updates so far, one per training batch.
    pub steps: usize,
    #[serde(skip)]
    pub mode: ModelMode,
}

impl StubModel {
    pub fn new(offset: f64) -> Self {
        Self {
            params: vec![Parameter::new(
                "w",
                ArrayD::from_elem(IxDyn(&[3]), 1.0),
            )],
            offset,
            steps: 0,
            mode: ModelMode::Train,
        }
    }

    pub fn weights(&self) -> Vec<f64> {
        self.params[0].value.iter().copied().collect()
    }

    fn nll(&self) -> f64 {
        self.offset + self.params[0].value.iter().map(|w| w * w).sum::<f64>()
    }
}

impl GraphModel for StubModel {
    fn logpdf(&self, _batch: &GraphBatch) -> MlResult<f64> {
        Ok(-self.nll())
    }

    fn backward(&mut self, _batch: &GraphBatch) -> MlResult<f64> {
        let grad = self.params[0].value.mapv(|w| 2.0 * w);
        self.params[0].accumulate_grad(&grad);
        self.steps += 1;
        Ok(self.nll())
    }

    fn sample<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> MlResult<GraphBatch> {
        let nodes = Array2::from_shape_fn((count, MAX_ATOMS), |_| rng.gen_range(0..5));
        let edges = Array3::from_shape_fn((count, MAX_ATOMS, MAX_ATOMS), |_| rng.gen_range(0..3));
        GraphBatch::new(nodes, edges)
    }

    fn set_mode(&mut self, mode: ModelMode) {
        self.mode = mode;
    }

    fn mode(&self) -> ModelMode {
        self.mode
    }

    fn parameters(&self) -> &[Parameter] {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut [Parameter] {
        &mut self.params
    }
}

/// Returns the scripted `score` values in order, one per call.
pub struct ScriptedEvaluator {
    scores: Vec<f64>,
    calls: Cell<usize>,
}

impl ScriptedEvaluator {
    pub fn new(scores: &[f64]) -> Self {
        Self {
            scores: scores.to_vec(),
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl MetricEvaluator for ScriptedEvaluator {
    fn evaluate(
        &self,
        batch: &GraphBatch,
        request: &EvaluationRequest<'_>,
    ) -> MlResult<EvaluatedBatch> {
        let call = self.calls.get();
        self.calls.set(call + 1);
        let score = self.scores.get(call).copied().unwrap_or(0.0);

        let mut metrics = MetricSnapshot::new();
        metrics.insert("valid", 1.0);
        metrics.insert("unique", 1.0);
        metrics.insert("novel", 1.0);
        metrics.insert("score", score);

        let molecules = if request.metrics_only {
            Vec::new()
        } else {
            vec![
                Molecule {
                    smiles: Some("C".to_string())
                };
                batch.len()
            ]
        };
        Ok(EvaluatedBatch { metrics, molecules })
    }
}

/// Accepts every `period`-th graph it sees; `period == 0` accepts none.
pub struct PeriodicValidator {
    period: usize,
    seen: Cell<usize>,
}

impl PeriodicValidator {
    pub fn all() -> Self {
        Self::every(1)
    }

    pub fn none() -> Self {
        Self::every(0)
    }

    pub fn every(period: usize) -> Self {
        Self {
            period,
            seen: Cell::new(0),
        }
    }
}

impl MoleculeValidator for PeriodicValidator {
    fn validate(
        &self,
        batch: &GraphBatch,
        _dataset: &DatasetInfo,
        _canonical: bool,
    ) -> MlResult<Vec<Option<GraphSample>>> {
        Ok(batch
            .samples()
            .map(|sample| {
                let index = self.seen.get();
                self.seen.set(index + 1);
                (self.period > 0 && index % self.period == 0).then_some(sample)
            })
            .collect())
    }
}

/// Records each grid it is asked for and writes a placeholder file.
#[derive(Default)]
pub struct RecordingRenderer {
    pub grids: RefCell<Vec<(PathBuf, usize)>>,
}

impl MoleculeRenderer for RecordingRenderer {
    fn render_grid(
        &self,
        molecules: &[Molecule],
        _layout: &GridLayout,
        path: &Path,
    ) -> MlResult<()> {
        std::fs::write(path, b"grid")?;
        self.grids
            .borrow_mut()
            .push((path.to_path_buf(), molecules.len()));
        Ok(())
    }
}
