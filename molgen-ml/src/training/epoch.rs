//! One pass over a data stream.

use crate::error::{MlError, MlResult};
use crate::graph::GraphLoader;
use crate::model::GraphModel;
use crate::optim::Optimizer;
use tracing::trace;

/// Mean per-batch negative log-likelihood over `loader`.
///
/// With an optimizer every batch clears gradients, back-propagates its loss and
/// takes one step. Without one the model is only scored and its parameters are
/// left untouched.
pub fn run_epoch<M: GraphModel>(
    model: &mut M,
    loader: &GraphLoader,
    mut optimizer: Option<&mut dyn Optimizer>,
) -> MlResult<f64> {
    if loader.is_empty() {
        return Err(MlError::EmptyLoader);
    }

    let mut nll_sum = 0.0;
    for (i, batch) in loader.iter().enumerate() {
        let nll = match optimizer.as_deref_mut() {
            Some(opt) => {
                opt.zero_grad(model.parameters_mut());
                let nll = model.backward(batch)?;
                ensure_finite(i, nll)?;
                opt.step(model.parameters_mut())?;
                nll
            }
            None => {
                let nll = -model.logpdf(batch)?;
                ensure_finite(i, nll)?;
                nll
            }
        };
        trace!(batch = i, nll, "batch done");
        nll_sum += nll;
    }

    Ok(nll_sum / loader.len() as f64)
}

fn ensure_finite(batch: usize, value: f64) -> MlResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(MlError::NonFiniteLoss { batch, value })
    }
}
