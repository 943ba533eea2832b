//! Gradient-based optimizers.

use crate::error::{MlError, MlResult};
use crate::model::Parameter;
use molgen_core::OptimizerSettings;
use ndarray::{ArrayD, Zip};

/// A parameter-update rule bound to one model's parameters.
pub trait Optimizer {
    /// Clear accumulated gradients.
    fn zero_grad(&mut self, params: &mut [Parameter]) {
        for p in params {
            p.grad = None;
        }
    }

    /// Apply one update from the accumulated gradients.
    fn step(&mut self, params: &mut [Parameter]) -> MlResult<()>;
}

/// Adam with optional L2 weight decay.
#[derive(Debug, Clone)]
pub struct Adam {
    settings: OptimizerSettings,
    step: i32,
    moments: Vec<(ArrayD<f64>, ArrayD<f64>)>,
}

impl Adam {
    pub fn new(settings: OptimizerSettings) -> Self {
        Self {
            settings,
            step: 0,
            moments: Vec::new(),
        }
    }

    pub fn steps_taken(&self) -> i32 {
        self.step
    }

    fn ensure_state(&mut self, params: &[Parameter]) -> MlResult<()> {
        if self.moments.is_empty() {
            self.moments = params
                .iter()
                .map(|p| (ArrayD::zeros(p.value.raw_dim()), ArrayD::zeros(p.value.raw_dim())))
                .collect();
            return Ok(());
        }
        if self.moments.len() != params.len() {
            return Err(MlError::optimizer(format!(
                "bound to {} parameters, got {}",
                self.moments.len(),
                params.len()
            )));
        }
        Ok(())
    }
}

impl Optimizer for Adam {
    fn step(&mut self, params: &mut [Parameter]) -> MlResult<()> {
        self.ensure_state(params)?;
        self.step = self.step.saturating_add(1);

        let OptimizerSettings {
            lr,
            betas: [b1, b2],
            eps,
            weight_decay,
        } = self.settings;
        let bias1 = 1.0 - b1.powi(self.step);
        let bias2 = 1.0 - b2.powi(self.step);

        for (p, (m, v)) in params.iter_mut().zip(self.moments.iter_mut()) {
            let Some(grad) = p.grad.as_ref() else {
                continue;
            };
            if grad.shape() != p.value.shape() || m.shape() != p.value.shape() {
                return Err(MlError::optimizer(format!(
                    "gradient shape {:?} does not match parameter '{}' {:?}",
                    grad.shape(),
                    p.name,
                    p.value.shape()
                )));
            }
            Zip::from(&mut p.value)
                .and(grad)
                .and(m)
                .and(v)
                .for_each(|w, &g, m, v| {
                    let g = g + weight_decay * *w;
                    *m = b1 * *m + (1.0 - b1) * g;
                    *v = b2 * *v + (1.0 - b2) * g * g;
                    let m_hat = *m / bias1;
                    let v_hat = *v / bias2;
                    *w -= lr * m_hat / (v_hat.sqrt() + eps);
                });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::IxDyn;

    fn param(value: f64) -> Parameter {
        Parameter::new("w", ArrayD::from_elem(IxDyn(&[1]), value))
    }

    fn scalar(p: &Parameter) -> f64 {
        p.value.iter().copied().next().unwrap()
    }

    #[test]
    fn test_first_step_moves_by_lr() {
        let mut params = vec![param(1.0)];
        params[0].accumulate_grad(&ArrayD::from_elem(IxDyn(&[1]), 4.0));

        let mut adam = Adam::new(OptimizerSettings {
            lr: 0.1,
            ..OptimizerSettings::default()
        });
        adam.step(&mut params).unwrap();

        // Bias-corrected first step has magnitude ~lr regardless of gradient scale.
        assert!((scalar(&params[0]) - 0.9).abs() < 1e-6);
        assert_eq!(adam.steps_taken(), 1);
    }

    #[test]
    fn test_minimizes_quadratic() {
        let mut params = vec![param(3.0)];
        let mut adam = Adam::new(OptimizerSettings {
            lr: 0.1,
            ..OptimizerSettings::default()
        });
        for _ in 0..500 {
            adam.zero_grad(&mut params);
            let w = scalar(&params[0]);
            params[0].accumulate_grad(&ArrayD::from_elem(IxDyn(&[1]), 2.0 * w));
            adam.step(&mut params).unwrap();
        }
        assert!(scalar(&params[0]).abs() < 0.5);
    }

    #[test]
    fn test_zero_grad_skips_update() {
        let mut params = vec![param(1.0)];
        let mut adam = Adam::new(OptimizerSettings::default());
        adam.zero_grad(&mut params);
        adam.step(&mut params).unwrap();
        assert_eq!(scalar(&params[0]), 1.0);
    }

    #[test]
    fn test_parameter_count_change_rejected() {
        let mut adam = Adam::new(OptimizerSettings::default());
        adam.step(&mut [param(1.0)]).unwrap();
        assert!(adam.step(&mut [param(1.0), param(2.0)]).is_err());
    }
}
