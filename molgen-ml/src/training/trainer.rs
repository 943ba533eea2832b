//! The training loop: epochs, per-epoch sampling and metrics, early stopping
//! and single-best checkpointing.

use crate::error::{MlError, MlResult};
use crate::eval::metrics::{EvaluationRequest, MetricEvaluator, MetricSnapshot};
use crate::graph::MolecularData;
use crate::model::{GraphModel, ModelMode};
use crate::optim::{Adam, Optimizer};
use crate::sampling::sample_with_fix;
use crate::training::checkpoint::{CheckpointManager, CheckpointRecord};
use crate::training::early_stopping::{EarlyStopping, StoppingState};
use crate::training::epoch::run_epoch;
use molgen_core::{ArtifactLayout, ExperimentSettings, MetricKind, RunConfig, TrainingSettings};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Per-epoch record kept in the training history.
#[derive(Debug, Clone, Serialize)]
pub struct EpochReport {
    pub epoch: usize,
    pub nll_trn: f64,
    /// Value of the selection metric.
    pub metric: f64,
    pub metrics: MetricSnapshot,
    pub state: StoppingState,
    pub saved: bool,
}

/// Result of a training run.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub best_checkpoint: Option<CheckpointRecord>,
    pub epochs_run: usize,
    pub stopped_early: bool,
    pub history: Vec<EpochReport>,
}

impl TrainingOutcome {
    /// Path of the best checkpoint; `None` when no epoch improved.
    pub fn best_path(&self) -> Option<&Path> {
        self.best_checkpoint.as_ref().map(|c| c.path.as_path())
    }

    pub fn best_epoch(&self) -> Option<usize> {
        self.best_checkpoint.as_ref().map(|c| c.epoch)
    }

    pub fn best_metric(&self) -> Option<f64> {
        self.best_checkpoint.as_ref().map(|c| c.metric)
    }
}

/// Drives training epochs for one run configuration.
#[derive(Debug, Clone)]
pub struct Trainer {
    settings: TrainingSettings,
    layout: ArtifactLayout,
    seed: u64,
}

impl Trainer {
    pub fn new(settings: TrainingSettings, layout: ArtifactLayout) -> Self {
        Self {
            settings,
            layout,
            seed: 0,
        }
    }

    /// Training settings, artifact layout and sampling seed from `settings`.
    pub fn from_settings(settings: &ExperimentSettings) -> Self {
        Self::new(settings.training.clone(), settings.layout()).with_seed(settings.seed)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn settings(&self) -> &TrainingSettings {
        &self.settings
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Like [`train`](Self::train), sampling from a generator seeded with
    /// [`seed`](Self::seed). Equal seeds give equal runs.
    pub fn train_seeded<M>(
        &self,
        model: &mut M,
        run: &RunConfig,
        data: &MolecularData,
        evaluator: &dyn MetricEvaluator,
    ) -> MlResult<TrainingOutcome>
    where
        M: GraphModel + Serialize,
    {
        let mut rng = StdRng::seed_from_u64(self.seed);
        self.train(model, run, data, evaluator, &mut rng)
    }

    /// Train with an Adam optimizer built from the run's `optimizer_hpars`.
    pub fn train<M, R>(
        &self,
        model: &mut M,
        run: &RunConfig,
        data: &MolecularData,
        evaluator: &dyn MetricEvaluator,
        rng: &mut R,
    ) -> MlResult<TrainingOutcome>
    where
        M: GraphModel + Serialize,
        R: Rng + ?Sized,
    {
        let mut optimizer = Adam::new(run.optimizer().clone());
        self.train_with_optimizer(model, &mut optimizer, run, data, evaluator, rng)
    }

    /// Train with a caller-supplied optimizer, which must be freshly reset.
    pub fn train_with_optimizer<M, R>(
        &self,
        model: &mut M,
        optimizer: &mut dyn Optimizer,
        run: &RunConfig,
        data: &MolecularData,
        evaluator: &dyn MetricEvaluator,
        rng: &mut R,
    ) -> MlResult<TrainingOutcome>
    where
        M: GraphModel + Serialize,
        R: Rng + ?Sized,
    {
        self.settings.validate()?;
        let metric = self.settings.metric;
        let mut stopper = EarlyStopping::for_metric(metric, self.settings.patience);
        let mut checkpoints = CheckpointManager::new();
        let path = self.layout.checkpoint_path(run);
        let request = EvaluationRequest {
            loaders: &data.loaders,
            dataset: &data.info,
            canonical: run.is_canonical(),
            metrics_only: true,
        };

        info!(
            dataset = run.dataset(),
            model = run.model(),
            epochs = run.num_epochs(),
            metric = %metric,
            patience = self.settings.patience,
            "training started"
        );

        let mut history = Vec::new();
        let mut stopped_early = false;

        for epoch in 0..run.num_epochs() {
            model.set_mode(ModelMode::Train);
            let nll_trn = run_epoch(model, &data.loaders.train, Some(&mut *optimizer))?;
            model.set_mode(ModelMode::Eval);

            let batch = sample_with_fix(
                &*model,
                self.settings.epoch_samples,
                run.fix(),
                &data.info,
                rng,
            )?;
            let mut metrics = evaluator.evaluate(&batch, &request)?.metrics;

            let value = if metric.is_sample_based() {
                metrics.get(metric.key()).ok_or_else(|| {
                    MlError::evaluation(format!("metric '{metric}' missing from evaluator output"))
                })?
            } else {
                let nll_val = run_epoch(model, &data.loaders.valid, None)?;
                metrics.insert(MetricKind::ValidationNll.key(), nll_val);
                nll_val
            };

            info!(
                "epoch {epoch:3}: ll_trn={:.4}, {}",
                -nll_trn,
                metrics.summary()
            );

            let decision = stopper.observe(value);
            if decision.save {
                checkpoints.promote(&*model, &path, epoch, value)?;
            }

            history.push(EpochReport {
                epoch,
                nll_trn,
                metric: value,
                metrics,
                state: decision.state,
                saved: decision.save,
            });

            if decision.state == StoppingState::Stopped {
                info!(epoch, best = stopper.best(), "early stopping");
                stopped_early = true;
                break;
            }
        }

        let best_checkpoint = checkpoints.best().cloned();
        info!(
            epochs_run = history.len(),
            best = stopper.best(),
            checkpoint = ?best_checkpoint.as_ref().map(|c| c.path.display().to_string()),
            "training finished"
        );

        Ok(TrainingOutcome {
            best_checkpoint,
            epochs_run: history.len(),
            stopped_early,
            history,
        })
    }
}
