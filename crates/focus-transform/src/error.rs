use focus_model::ModelError;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Fatal errors raised while producing target columns.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// The mapping or spec is unusable; aborts the whole generation.
    #[error("configuration error for target {target}: {message}")]
    Configuration { target: String, message: String },

    /// A step failed while running against the data.
    #[error("execution error for target {target}: {message}")]
    Execution { target: String, message: String },

    #[error("mapping targets FOCUS {mapping} but the spec is FOCUS {spec}")]
    VersionMismatch { mapping: String, spec: String },
}

impl TransformError {
    pub fn configuration(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            target: target.into(),
            message: message.into(),
        }
    }

    pub fn execution(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Execution {
            target: target.into(),
            message: message.into(),
        }
    }

    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Configuration { target, .. } | Self::Execution { target, .. } => Some(target),
            Self::VersionMismatch { .. } => None,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. } | Self::VersionMismatch { .. })
    }
}

pub type Result<T> = std::result::Result<T, TransformError>;

/// Failure converting between [`focus_model::Table`] and a polars `DataFrame`.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("invalid table: {0}")]
    Model(#[from] ModelError),
}
