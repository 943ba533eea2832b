//! Experiment settings.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! workspace config file -> environment -> explicit overrides. Settings are
//! loaded from `~/.config/molgen/config.toml` and/or `.molgen/config.toml` in the
//! workspace directory.
//!
//! The per-run hyperparameters are not part of these settings; they arrive as a
//! nested mapping and are parsed by [`crate::hyperparams::RunConfig`].

use crate::error::ConfigError;
use crate::hyperparams::NamingPolicy;
use crate::metric::MetricKind;
use crate::naming::ArtifactLayout;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level settings shared by training and evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentSettings {
    /// Root directory for checkpoints, metrics tables and images.
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
    /// Seed for sampling randomness.
    #[serde(default)]
    pub seed: u64,
    /// Artifact naming rules.
    #[serde(default)]
    pub naming: NamingPolicy,
    #[serde(default)]
    pub training: TrainingSettings,
    #[serde(default)]
    pub evaluation: EvaluationSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Default for ExperimentSettings {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            seed: 0,
            naming: NamingPolicy::default(),
            training: TrainingSettings::default(),
            evaluation: EvaluationSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("results")
}

impl ExperimentSettings {
    pub fn layout(&self) -> ArtifactLayout {
        ArtifactLayout::new(self.base_dir.clone(), self.naming.clone())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.naming.validate()?;
        self.training.validate()?;
        self.evaluation.validate()?;
        Ok(())
    }
}

/// Training loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSettings {
    /// Consecutive non-improving epochs tolerated before stopping.
    #[serde(default = "default_patience")]
    pub patience: usize,
    /// Metric used for model selection.
    #[serde(default)]
    pub metric: MetricKind,
    /// Molecules drawn each epoch to score the model.
    #[serde(default = "default_epoch_samples")]
    pub epoch_samples: usize,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            patience: default_patience(),
            metric: MetricKind::default(),
            epoch_samples: default_epoch_samples(),
        }
    }
}

fn default_patience() -> usize {
    2000
}

fn default_epoch_samples() -> usize {
    1000
}

impl TrainingSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.patience == 0 {
            return Err(ConfigError::invalid("training.patience", "must be >= 1"));
        }
        if self.epoch_samples == 0 {
            return Err(ConfigError::invalid("training.epoch_samples", "must be >= 1"));
        }
        Ok(())
    }
}

/// Evaluation pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationSettings {
    /// Molecules drawn for both the raw and the resampled batch.
    #[serde(default = "default_num_samples")]
    pub num_samples: usize,
    /// Estimate negative log-likelihood over train/validation/test loaders.
    #[serde(default = "default_true")]
    pub compute_nll: bool,
    /// Upper bound on sampling rounds while replacing invalid molecules.
    #[serde(default = "default_max_resample_attempts")]
    pub max_resample_attempts: usize,
    #[serde(default)]
    pub grid: GridLayout,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            num_samples: default_num_samples(),
            compute_nll: true,
            max_resample_attempts: default_max_resample_attempts(),
            grid: GridLayout::default(),
        }
    }
}

fn default_num_samples() -> usize {
    10_000
}

fn default_max_resample_attempts() -> usize {
    100
}

fn default_true() -> bool {
    true
}

impl EvaluationSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_samples == 0 {
            return Err(ConfigError::invalid("evaluation.num_samples", "must be >= 1"));
        }
        if self.max_resample_attempts == 0 {
            return Err(ConfigError::invalid(
                "evaluation.max_resample_attempts",
                "must be >= 1",
            ));
        }
        self.grid.validate()
    }
}

/// Image grid of rendered molecules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayout {
    #[serde(default = "default_max_molecules")]
    pub max_molecules: usize,
    #[serde(default = "default_per_row")]
    pub per_row: usize,
    #[serde(default = "default_cell_size")]
    pub cell_size: (u32, u32),
    #[serde(default = "default_image_format")]
    pub format: String,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            max_molecules: default_max_molecules(),
            per_row: default_per_row(),
            cell_size: default_cell_size(),
            format: default_image_format(),
        }
    }
}

fn default_max_molecules() -> usize {
    64
}

fn default_per_row() -> usize {
    8
}

fn default_cell_size() -> (u32, u32) {
    (200, 200)
}

fn default_image_format() -> String {
    "png".to_string()
}

impl GridLayout {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.per_row == 0 {
            return Err(ConfigError::invalid("evaluation.grid.per_row", "must be >= 1"));
        }
        if self.format.trim().is_empty() {
            return Err(ConfigError::invalid("evaluation.grid.format", "must not be empty"));
        }
        Ok(())
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directive for the stderr layer.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Directory for daily-rolling JSON logs; disabled when unset.
    #[serde(default)]
    pub json_dir: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load settings from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `MOLGEN_`)
/// 3. Workspace-local config (`.molgen/config.toml`)
/// 4. User config (`~/.config/molgen/config.toml`)
/// 5. Built-in defaults
pub fn load_settings(
    workspace: Option<&Path>,
    overrides: Option<&ExperimentSettings>,
) -> Result<ExperimentSettings, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(ExperimentSettings::default()));

    if let Some(config_dir) = directories::ProjectDirs::from("dev", "molgen", "molgen") {
        let user_config = config_dir.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(".molgen").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // MOLGEN_TRAINING__PATIENCE, MOLGEN_EVALUATION__NUM_SAMPLES, etc.
    figment = figment.merge(Env::prefixed("MOLGEN_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    let settings: ExperimentSettings = figment.extract().map_err(|e| ConfigError::Load {
        message: e.to_string(),
    })?;
    settings.validate()?;
    Ok(settings)
}
