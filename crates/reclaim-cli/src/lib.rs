//! Reclaim CLI library - server and command modules
//!
//! The `reclaim` binary is a thin wrapper around these modules so the HTTP
//! surface can be exercised with `warp::test` without binding a socket.

pub mod api;
pub mod config;
pub mod diagnostics;
pub mod pages;
pub mod routes;
pub mod security;

use anyhow::Result;
use reclaim_model::{build_record, PredictRequest, Predictor};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::api::PredictResponse;
use crate::config::LoggingConfig;

/// Install the global tracing subscriber. `RUST_LOG` overrides the
/// configured level.
pub fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .map_err(|e| anyhow::anyhow!("Invalid log filter '{}': {}", logging.level, e))?;

    let registry = tracing_subscriber::registry().with(filter);
    match logging.format.as_str() {
        "json" => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?,
        "text" => registry.with(tracing_subscriber::fmt::layer()).try_init()?,
        other => anyhow::bail!("Unsupported log format: {}. Use 'text' or 'json'", other),
    }
    Ok(())
}

/// Score one JSON payload the same way `POST /predict` does.
pub fn predict_json(predictor: &Predictor, source: &str) -> Result<PredictResponse> {
    let value: serde_json::Value =
        serde_json::from_str(source).map_err(|e| anyhow::anyhow!("Invalid JSON: {}", e))?;
    let request = PredictRequest::from_value(value)
        .map_err(|e| anyhow::anyhow!("Expected a JSON object: {}", e))?;
    let prediction = predictor
        .predict(&build_record(&request))
        .map_err(|e| anyhow::anyhow!("Prediction failed: {}", e))?;
    Ok(PredictResponse::new(
        &prediction,
        predictor.bundle().is_loaded(),
    ))
}
