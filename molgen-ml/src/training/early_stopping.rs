//! Early stopping on a model-selection metric.

use molgen_core::{Direction, MetricKind};
use serde::{Deserialize, Serialize};

/// Controller state after the latest observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoppingState {
    Improving,
    Plateaued,
    Stopped,
}

/// What the training loop should do after an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// The observation is the new best; persist the model.
    pub save: bool,
    pub state: StoppingState,
}

/// Tracks the best metric and the remaining patience.
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    direction: Direction,
    patience: usize,
    best: f64,
    remaining: usize,
    state: StoppingState,
}

impl EarlyStopping {
    pub fn new(direction: Direction, patience: usize) -> Self {
        Self {
            direction,
            patience,
            best: direction.initial_best(),
            remaining: patience,
            state: StoppingState::Improving,
        }
    }

    pub fn for_metric(metric: MetricKind, patience: usize) -> Self {
        Self::new(metric.direction(), patience)
    }

    /// Feed one epoch's metric value.
    ///
    /// Once [`StoppingState::Stopped`] is reached further observations are
    /// ignored.
    pub fn observe(&mut self, value: f64) -> Decision {
        if self.state == StoppingState::Stopped {
            return Decision {
                save: false,
                state: self.state,
            };
        }

        if self.direction.improves(value, self.best) {
            self.best = value;
            self.remaining = self.patience;
            self.state = StoppingState::Improving;
            return Decision {
                save: true,
                state: self.state,
            };
        }

        self.remaining = self.remaining.saturating_sub(1);
        self.state = if self.remaining > 0 {
            StoppingState::Plateaued
        } else {
            StoppingState::Stopped
        };
        Decision {
            save: false,
            state: self.state,
        }
    }

    pub fn best(&self) -> f64 {
        self.best
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn state(&self) -> StoppingState {
        self.state
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_stopped(&self) -> bool {
        self.state == StoppingState::Stopped
    }
}
