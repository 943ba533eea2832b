//! The generative model capability consumed by training and evaluation.
//!
//! The model's architecture and likelihood are opaque here: the loop only needs
//! to score batches, differentiate the loss, draw samples and toggle modes.
//! Checkpointing goes through `serde`, so implementors derive
//! `Serialize`/`Deserialize` for their full state.

use crate::error::MlResult;
use crate::graph::GraphBatch;
use ndarray::ArrayD;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Training vs. evaluation behaviour of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelMode {
    #[default]
    Train,
    Eval,
}

/// A named trainable tensor with its accumulated gradient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub value: ArrayD<f64>,
    #[serde(skip)]
    pub grad: Option<ArrayD<f64>>,
}

impl Parameter {
    pub fn new(name: &str, value: ArrayD<f64>) -> Self {
        Self {
            name: name.to_string(),
            value,
            grad: None,
        }
    }

    pub fn numel(&self) -> usize {
        self.value.len()
    }

    /// Add `grad` into the accumulated gradient.
    pub fn accumulate_grad(&mut self, grad: &ArrayD<f64>) {
        match &mut self.grad {
            Some(acc) => *acc += grad,
            None => self.grad = Some(grad.clone()),
        }
    }
}

/// A generative model over molecular graphs.
pub trait GraphModel {
    /// Mean log-likelihood of the batch under the model.
    fn logpdf(&self, batch: &GraphBatch) -> MlResult<f64>;

    /// Negative log-likelihood of the batch, accumulating its gradient into
    /// the parameters.
    fn backward(&mut self, batch: &GraphBatch) -> MlResult<f64>;

    /// Draw `count` raw graphs.
    fn sample<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> MlResult<GraphBatch>;

    fn set_mode(&mut self, mode: ModelMode);

    fn mode(&self) -> ModelMode;

    fn parameters(&self) -> &[Parameter];

    fn parameters_mut(&mut self) -> &mut [Parameter];
}

/// Total number of scalar trainable values.
pub fn count_parameters<M: GraphModel>(model: &M) -> usize {
    model.parameters().iter().map(Parameter::numel).sum()
}
