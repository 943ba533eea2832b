//! Error types for the molgen core library.
//!
//! Uses `thiserror` with structured variants for run-configuration parsing,
//! settings validation and artifact persistence.

/// Top-level error type for the core library.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while parsing a run configuration or validating settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Run configuration must be a mapping at the top level")]
    NotAMapping,

    #[error("Missing required key '{key}'")]
    MissingKey { key: String },

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Unknown fix strategy '{name}' (expected one of: none, mirror, random)")]
    UnknownFixStrategy { name: String },

    #[error("Group '{group}' is mapped to more than one backend kind")]
    DuplicateBackendGroup { group: String },

    #[error("Failed to load settings: {message}")]
    Load { message: String },
}

impl ConfigError {
    pub fn missing(key: impl Into<String>) -> Self {
        Self::MissingKey { key: key.into() }
    }

    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias for core results.
pub type CoreResult<T> = Result<T, CoreError>;
