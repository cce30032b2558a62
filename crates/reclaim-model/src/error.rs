//! Error types for artifact loading and prediction.

use crate::target::Target;
use std::path::PathBuf;

/// Failure while loading or assembling the model bundle.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifact not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("Failed to read artifact {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode artifact {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid artifact {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },

    #[error("No model provided for target {0}")]
    MissingTarget(Target),
}

/// Failure of a single regressor on an encoded feature vector.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    #[error("expected {expected} features, got {found}")]
    FeatureCount { expected: usize, found: usize },

    #[error(
        "feature names do not match those seen at fit time \
         (first mismatch at position {position}: expected {expected:?}, got {found:?})"
    )]
    FeatureNames {
        position: usize,
        expected: String,
        found: String,
    },
}

/// Failure of model-backed prediction. Surfaced to HTTP clients as a 500.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    #[error("Column {0} is missing from the input row")]
    MissingColumn(String),

    #[error("Input contains a missing value in column {column}")]
    MissingValue { column: String },

    #[error("Could not convert {value:?} in column {column} to float")]
    NotNumeric { column: String, value: String },

    #[error("Found unknown category {value:?} in column {column} during transform")]
    UnknownCategory { column: String, value: String },

    #[error("{target} model: {source}")]
    Inference {
        target: Target,
        #[source]
        source: InferenceError,
    },
}
