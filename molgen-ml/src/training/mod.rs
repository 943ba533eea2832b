//! Training: the epoch runner, early stopping, checkpointing and the loop
//! that drives them.

pub mod checkpoint;
pub mod early_stopping;
pub mod epoch;
pub mod trainer;

pub use checkpoint::{CheckpointManager, CheckpointRecord};
pub use early_stopping::{Decision, EarlyStopping, StoppingState};
pub use epoch::run_epoch;
pub use trainer::{EpochReport, Trainer, TrainingOutcome};
