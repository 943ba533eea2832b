//! Post-training evaluation of a saved checkpoint.

use crate::chem::{MoleculeRenderer, MoleculeValidator};
use crate::error::MlResult;
use crate::eval::metrics::{EvaluationRequest, MetricEvaluator, MetricSnapshot};
use crate::eval::report::{EvaluationRecord, write_grid};
use crate::graph::MolecularData;
use crate::model::{GraphModel, ModelMode, count_parameters};
use crate::sampling::{ResampleOptions, resample_invalid, sample_with_fix};
use crate::training::checkpoint::CheckpointManager;
use crate::training::epoch::run_epoch;
use molgen_core::naming::{RESAMPLED_IMAGE_SUFFIX, SAMPLED_IMAGE_SUFFIX};
use molgen_core::{ArtifactLayout, EvaluationSettings, ExperimentSettings, RunConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Prefix of metrics computed on the raw sampled batch.
pub const SAMPLED_PREFIX: &str = "sam_";
/// Prefix of metrics computed on the resampled, all-valid batch.
pub const RESAMPLED_PREFIX: &str = "res_";

pub const TIME_SAMPLE: &str = "time_sam";
pub const TIME_RESAMPLE: &str = "time_res";
pub const NUM_PARAMS: &str = "num_params";
pub const NLL_TRAIN: &str = "nll_trn_approx";
pub const NLL_VALID: &str = "nll_val_approx";
pub const NLL_TEST: &str = "nll_tst_approx";

/// External capabilities evaluation calls through.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub metrics: &'a dyn MetricEvaluator,
    pub validator: &'a dyn MoleculeValidator,
    pub renderer: &'a dyn MoleculeRenderer,
}

/// Result of [`Evaluator::evaluate`], with the artifacts it wrote.
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    pub record: EvaluationRecord,
    pub metrics_path: PathBuf,
    pub sampled_image: PathBuf,
    pub resampled_image: PathBuf,
}

impl EvaluationReport {
    pub fn metrics(&self) -> &MetricSnapshot {
        &self.record.metrics
    }
}

/// Scores the checkpoint of one run configuration.
#[derive(Debug, Clone)]
pub struct Evaluator {
    settings: EvaluationSettings,
    layout: ArtifactLayout,
    seed: u64,
}

impl Evaluator {
    pub fn new(settings: EvaluationSettings, layout: ArtifactLayout) -> Self {
        Self {
            settings,
            layout,
            seed: 0,
        }
    }

    pub fn from_settings(settings: &ExperimentSettings) -> Self {
        Self::new(settings.evaluation.clone(), settings.layout()).with_seed(settings.seed)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn settings(&self) -> &EvaluationSettings {
        &self.settings
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// [`evaluate`](Self::evaluate) with a generator seeded from
    /// [`seed`](Self::seed).
    pub fn evaluate_seeded<M>(
        &self,
        run: &RunConfig,
        data: &MolecularData,
        collaborators: Collaborators<'_>,
    ) -> MlResult<EvaluationReport>
    where
        M: GraphModel + DeserializeOwned,
    {
        let mut rng = StdRng::seed_from_u64(self.seed);
        self.evaluate::<M, _>(run, data, collaborators, &mut rng)
    }

    /// Load the run's checkpoint and evaluate it.
    ///
    /// A missing or unreadable checkpoint aborts the evaluation.
    pub fn evaluate<M, R>(
        &self,
        run: &RunConfig,
        data: &MolecularData,
        collaborators: Collaborators<'_>,
        rng: &mut R,
    ) -> MlResult<EvaluationReport>
    where
        M: GraphModel + DeserializeOwned,
        R: Rng + ?Sized,
    {
        let model_path = self.layout.checkpoint_path(run);
        let mut model: M = CheckpointManager::load(&model_path)?;
        self.evaluate_model(&mut model, model_path, run, data, collaborators, rng)
    }

    /// Evaluate an already loaded model; `model_path` is recorded in the table.
    pub fn evaluate_model<M, R>(
        &self,
        model: &mut M,
        model_path: PathBuf,
        run: &RunConfig,
        data: &MolecularData,
        collaborators: Collaborators<'_>,
        rng: &mut R,
    ) -> MlResult<EvaluationReport>
    where
        M: GraphModel,
        R: Rng + ?Sized,
    {
        self.settings.validate()?;
        model.set_mode(ModelMode::Eval);
        let count = self.settings.num_samples;
        let canonical = run.is_canonical();

        let start = Instant::now();
        let sampled = sample_with_fix(&*model, count, run.fix(), &data.info, rng)?;
        let time_sam = start.elapsed().as_secs_f64();
        info!(count, seconds = time_sam, "finished sampling");

        let start = Instant::now();
        let options = ResampleOptions {
            count,
            fix: run.fix(),
            canonical,
            max_attempts: self.settings.max_resample_attempts,
        };
        let resampled =
            resample_invalid(&*model, collaborators.validator, &data.info, options, rng)?;
        let time_res = start.elapsed().as_secs_f64();
        info!(
            count,
            attempts = resampled.attempts,
            drawn = resampled.drawn,
            seconds = time_res,
            "finished resampling"
        );

        let mut metrics = MetricSnapshot::new();
        if self.settings.compute_nll {
            metrics.insert(NLL_TRAIN, run_epoch(model, &data.loaders.train, None)?);
            metrics.insert(NLL_VALID, run_epoch(model, &data.loaders.valid, None)?);
            metrics.insert(NLL_TEST, run_epoch(model, &data.loaders.test, None)?);
            info!("finished likelihoods");
        }

        let request = EvaluationRequest {
            loaders: &data.loaders,
            dataset: &data.info,
            canonical,
            metrics_only: false,
        };
        let evaluated_sam = collaborators.metrics.evaluate(&sampled, &request)?;
        let evaluated_res = collaborators
            .metrics
            .evaluate(&resampled.batch, &request)?;

        let mut all = evaluated_sam.metrics.with_prefix(SAMPLED_PREFIX);
        all.extend(evaluated_res.metrics.with_prefix(RESAMPLED_PREFIX));
        all.extend(metrics);
        all.insert(TIME_SAMPLE, time_sam);
        all.insert(TIME_RESAMPLE, time_res);
        all.insert(NUM_PARAMS, count_parameters(&*model) as f64);

        let record = EvaluationRecord {
            config: run.flatten(),
            metrics: all,
            model_path,
        };
        let metrics_path = self.layout.metrics_path(run);
        record.write_csv(&metrics_path)?;

        let grid = &self.settings.grid;
        let sampled_image = self
            .layout
            .image_path(run, SAMPLED_IMAGE_SUFFIX, &grid.format);
        let resampled_image = self
            .layout
            .image_path(run, RESAMPLED_IMAGE_SUFFIX, &grid.format);
        write_grid(
            collaborators.renderer,
            &evaluated_sam.molecules,
            grid,
            &sampled_image,
        )?;
        write_grid(
            collaborators.renderer,
            &evaluated_res.molecules,
            grid,
            &resampled_image,
        )?;

        info!(
            metrics = %metrics_path.display(),
            "evaluation finished: {}",
            record.metrics.summary()
        );

        Ok(EvaluationReport {
            record,
            metrics_path,
            sampled_image,
            resampled_image,
        })
    }
}
