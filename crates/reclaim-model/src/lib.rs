//! Reclaim model library - artifact loading and score prediction
//!
//! Turns a plastic item description into three scores (resale value, recycle
//! value, reuse score). Predictions come from pretrained artifacts when they
//! are available on disk and from a closed-form heuristic otherwise.
//!
//! The pieces, leaf-first:
//! - [`artifacts`]: loads the preprocessor and the three regressors into a [`ModelBundle`]
//! - [`record`]: typed request payload and the fixed-schema [`ItemRecord`]
//! - [`pipeline`]: the [`Predictor`] that picks model-backed or fallback scoring

pub mod artifacts;
pub mod error;
pub mod pipeline;
pub mod preprocess;
pub mod record;
pub mod regressor;
pub mod target;

pub use artifacts::{artifact_inventory, ArtifactStatus, ModelBundle, DEFAULT_MODELS_DIR};
pub use error::{ArtifactError, InferenceError, PipelineError};
pub use pipeline::{fallback_scores, Prediction, PredictionMode, Predictor};
pub use preprocess::{EncodedFeatures, Preprocessor};
pub use record::{build_record, condition_ordinal, Cell, Condition, ItemRecord, PredictRequest, Row};
pub use regressor::GradientBoostingRegressor;
pub use target::Target;
