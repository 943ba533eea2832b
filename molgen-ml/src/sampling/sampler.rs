//! Sampling with repair, and resampling until a batch is fully valid.

use crate::chem::MoleculeValidator;
use crate::error::{MlError, MlResult};
use crate::graph::{DatasetInfo, GraphBatch, GraphSample};
use crate::model::GraphModel;
use crate::sampling::fix::apply_fix;
use molgen_core::FixStrategy;
use rand::Rng;
use tracing::{debug, warn};

/// Draw `count` graphs and repair them with `fix`.
pub fn sample_with_fix<M, R>(
    model: &M,
    count: usize,
    fix: FixStrategy,
    dataset: &DatasetInfo,
    rng: &mut R,
) -> MlResult<GraphBatch>
where
    M: GraphModel,
    R: Rng + ?Sized,
{
    let mut batch = model.sample(count, rng)?;
    if batch.len() != count {
        return Err(MlError::model(format!(
            "asked for {count} samples, model returned {}",
            batch.len()
        )));
    }
    apply_fix(fix, &mut batch, dataset, rng);
    Ok(batch)
}

/// Options for [`resample_invalid`].
#[derive(Debug, Clone, Copy)]
pub struct ResampleOptions {
    pub count: usize,
    pub fix: FixStrategy,
    pub canonical: bool,
    /// Maximum number of sampling rounds.
    pub max_attempts: usize,
}

/// Result of a successful resampling run.
#[derive(Debug, Clone)]
pub struct Resampled {
    pub batch: GraphBatch,
    pub attempts: usize,
    /// Graphs drawn in total, valid or not.
    pub drawn: usize,
}

/// Accumulate exactly `count` valid graphs, replacing invalid draws.
///
/// Each round draws only as many graphs as are still missing. Fails with
/// [`MlError::ResampleBudgetExceeded`] when `max_attempts` rounds do not
/// produce enough valid graphs.
pub fn resample_invalid<M, V, R>(
    model: &M,
    validator: &V,
    dataset: &DatasetInfo,
    options: ResampleOptions,
    rng: &mut R,
) -> MlResult<Resampled>
where
    M: GraphModel,
    V: MoleculeValidator + ?Sized,
    R: Rng + ?Sized,
{
    let ResampleOptions {
        count,
        fix,
        canonical,
        max_attempts,
    } = options;

    let mut kept: Vec<GraphSample> = Vec::with_capacity(count);
    let mut attempts = 0;
    let mut drawn = 0;

    while kept.len() < count && attempts < max_attempts {
        attempts += 1;
        let missing = count - kept.len();
        let batch = sample_with_fix(model, missing, fix, dataset, rng)?;
        drawn += batch.len();

        let verdicts = validator.validate(&batch, dataset, canonical)?;
        if verdicts.len() != batch.len() {
            return Err(MlError::evaluation(format!(
                "validator returned {} verdicts for {} graphs",
                verdicts.len(),
                batch.len()
            )));
        }
        let before = kept.len();
        kept.extend(verdicts.into_iter().flatten().take(missing));
        debug!(
            attempt = attempts,
            drawn = missing,
            valid = kept.len() - before,
            total = kept.len(),
            "resample round"
        );
    }

    if kept.len() < count {
        warn!(
            requested = count,
            obtained = kept.len(),
            attempts,
            "resampling budget exhausted"
        );
        return Err(MlError::ResampleBudgetExceeded {
            requested: count,
            obtained: kept.len(),
            attempts,
        });
    }

    Ok(Resampled {
        batch: GraphBatch::from_samples(&kept, dataset.max_atoms)?,
        attempts,
        drawn,
    })
}
