//! Error types for schema translation and model generation

use std::path::PathBuf;
use thiserror::Error;

/// Result type for modelgen operations
pub type Result<T> = std::result::Result<T, ModelgenError>;

/// Generation errors
#[derive(Error, Debug)]
pub enum ModelgenError {
    #[error("Failed to load {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    #[error("Invalid type node at {path}: {reason}")]
    InvalidNode { path: String, reason: String },

    #[error("Failed to write {path}: {source}")]
    Emission {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot construct model {model}: {reason}")]
    RegistryConstruction { model: String, reason: String },

    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl ModelgenError {
    pub(crate) fn invalid_node(path: &str, reason: impl Into<String>) -> Self {
        Self::InvalidNode {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn construction(model: &str, reason: impl Into<String>) -> Self {
        Self::RegistryConstruction {
            model: model.to_string(),
            reason: reason.into(),
        }
    }
}

/// One failing path in a validated document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Document rejected by a model; lists every failing path
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{model} validation failed: {}", join_errors(.errors))]
pub struct ValidationError {
    pub model: String,
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    /// Whether `path` is among the failing paths
    pub fn has_path(&self, path: &str) -> bool {
        self.errors.iter().any(|e| e.path == path)
    }

    pub fn paths(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.path.as_str()).collect()
    }
}
