//! Error types for the simulation core.
//!
//! Out-of-range parameter values are not errors: the parameter store clamps
//! them silently.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),

    #[error("invalid parameter '{name}' = {value}: {reason}")]
    InvalidParameter {
        name: String,
        value: f64,
        reason: &'static str,
    },

    #[error("unknown model id '{0}'")]
    UnknownModel(String),

    #[error("unknown shape '{0}'")]
    UnknownShape(String),

    #[error("unknown integration mode '{0}'")]
    UnknownMode(String),

    #[error("unknown string preset '{0}'")]
    UnknownPreset(String),

    #[error("model '{model}' does not support {feature}")]
    Unsupported { model: &'static str, feature: String },
}

impl SimError {
    pub(crate) fn invalid(name: &str, value: f64, reason: &'static str) -> Self {
        SimError::InvalidParameter {
            name: name.to_string(),
            value,
            reason,
        }
    }

    pub(crate) fn unsupported(model: &'static str, feature: impl Into<String>) -> Self {
        SimError::Unsupported {
            model,
            feature: feature.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
