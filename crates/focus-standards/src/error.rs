#![deny(unsafe_code)]

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StandardsError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse spec document {path}: {source}")]
    SpecJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse mapping YAML: {source}")]
    MappingYaml {
        #[source]
        source: serde_yaml::Error,
    },

    #[error("spec version {version} not found (searched: {searched})")]
    SpecNotFound { version: String, searched: String },

    #[error("invalid mapping: {message}")]
    InvalidMapping { message: String },
}

impl StandardsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn mapping(message: impl Into<String>) -> Self {
        Self::InvalidMapping {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StandardsError>;
