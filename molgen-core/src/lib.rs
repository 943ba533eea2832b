//! # molgen-core — run configuration, artifact naming and settings
//!
//! Shared foundation for `molgen-ml`:
//! - parsing the nested hyperparameter mapping of a run ([`RunConfig`])
//! - deterministic artifact paths derived from it ([`ArtifactLayout`])
//! - the metric comparison policy used for model selection ([`MetricKind`])
//! - layered experiment settings, tracing setup and atomic persistence

pub mod config;
pub mod error;
pub mod hyperparams;
pub mod logging;
pub mod metric;
pub mod naming;
pub mod persistence;

pub use config::{
    EvaluationSettings, ExperimentSettings, GridLayout, LoggingSettings, TrainingSettings,
    load_settings,
};
pub use error::{ConfigError, CoreError, CoreResult};
pub use hyperparams::{
    BackendGroup, BackendKind, FixStrategy, NamingPolicy, OptimizerSettings, RunConfig,
    render_value,
};
pub use metric::{Direction, MetricKind};
pub use naming::{ArtifactLayout, config_stem};
