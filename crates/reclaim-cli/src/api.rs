//! HTTP surface
//!
//! Page routes, the routes index, static files, `POST /predict` and the
//! catch-all. All state is carried in an [`AppState`] built once before the
//! server starts and shared read-only between requests.

use crate::config::Config;
use crate::pages::{Page, PageStore, HOME_PAGE};
use crate::routes::routes_page;
use reclaim_model::{build_record, ModelBundle, PredictRequest, Prediction, Predictor, Target};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::path::Tail;
use warp::{Filter, Rejection, Reply};

// =============================================================================
// Request/Response types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub resale_value: f64,
    pub recycle_score: f64,
    pub reuse_score: f64,
    pub models_loaded: bool,
}

impl PredictResponse {
    pub fn new(prediction: &Prediction, models_loaded: bool) -> Self {
        let score = |t: Target| prediction.score(t).unwrap_or_default();
        Self {
            resale_value: score(Target::ResaleValue),
            recycle_score: score(Target::RecycleValue),
            reuse_score: score(Target::ReuseScore),
            models_loaded,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

// =============================================================================
// State
// =============================================================================

/// Everything a request handler needs.
#[derive(Debug, Clone)]
pub struct AppState {
    pub predictor: Predictor,
    pub pages: PageStore,
    pub static_dir: PathBuf,
    pub fallback_to_home: bool,
    pub max_body_bytes: u64,
}

impl AppState {
    pub fn new(config: &Config, bundle: Arc<ModelBundle>) -> Self {
        Self {
            predictor: Predictor::new(bundle),
            pages: PageStore::new(&config.pages.templates_dir),
            static_dir: config.pages.static_dir.clone(),
            fallback_to_home: config.pages.fallback_to_home,
            max_body_bytes: config.server.max_body_bytes,
        }
    }
}

// =============================================================================
// Routes
// =============================================================================

/// Build the complete route tree
pub fn app_routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    // A missing static file is a 404, not a catch-all hit.
    let static_files = warp::path("static").and(
        warp::fs::dir(state.static_dir.clone())
            .map(|file: warp::fs::File| file.into_response())
            .or(warp::any().map(|| {
                warp::reply::with_status("Not Found", StatusCode::NOT_FOUND).into_response()
            }))
            .unify(),
    );

    let index = warp::path::end()
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(|state: Arc<AppState>| handle_page(state, HOME_PAGE));

    let ourai = page_route("ourai", "ourai.html", state.clone());
    let about = page_route("about", "about.html", state.clone());
    let contact = page_route("contact", "contact.html", state.clone());

    let routes = warp::path("routes")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| warp::reply::html(routes_page()));

    let predict = warp::path("predict")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::content_length_limit(state.max_body_bytes))
        .and(warp::body::bytes())
        .and(with_state(state.clone()))
        .and_then(handle_predict);

    let catch_all = warp::get()
        .and(warp::path::tail())
        .and(with_state(state))
        .and_then(handle_catch_all);

    let access_log = warp::log::custom(|info| {
        debug!(
            method = %info.method(),
            path = info.path(),
            status = info.status().as_u16(),
            elapsed_ms = info.elapsed().as_millis() as u64,
            "request"
        );
    });

    static_files
        .or(index)
        .or(ourai)
        .or(about)
        .or(contact)
        .or(routes)
        .or(predict)
        .or(catch_all)
        .recover(handle_rejection)
        .with(access_log)
}

fn page_route(
    segment: &'static str,
    template: &'static str,
    state: Arc<AppState>,
) -> impl Filter<Extract = (Page,), Error = Rejection> + Clone {
    warp::path(segment)
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state))
        .and_then(move |state: Arc<AppState>| handle_page(state, template))
}

// =============================================================================
// Filters
// =============================================================================

fn with_state(
    state: Arc<AppState>,
) -> impl Filter<Extract = (Arc<AppState>,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

// =============================================================================
// Handlers
// =============================================================================

async fn handle_page(state: Arc<AppState>, template: &'static str) -> Result<Page, Infallible> {
    Ok(state.pages.fetch(template).await)
}

async fn handle_predict(body: Bytes, state: Arc<AppState>) -> Result<impl Reply, Infallible> {
    let value: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "Rejected /predict body");
            return Ok(error_response(StatusCode::BAD_REQUEST, "Invalid JSON", None));
        }
    };

    let request = match PredictRequest::from_value(value) {
        Ok(request) => request,
        Err(e) => {
            debug!(error = %e, "Rejected /predict payload");
            return Ok(error_response(
                StatusCode::BAD_REQUEST,
                "Invalid JSON",
                Some(format!("expected a JSON object: {e}")),
            ));
        }
    };

    let record = build_record(&request);
    match state.predictor.predict(&record) {
        Ok(prediction) => {
            let resp = PredictResponse::new(&prediction, state.predictor.bundle().is_loaded());
            Ok(warp::reply::with_status(warp::reply::json(&resp), StatusCode::OK).into_response())
        }
        Err(e) => {
            warn!(error = %e, "Prediction failed");
            Ok(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Prediction failed",
                Some(e.to_string()),
            ))
        }
    }
}

/// Serve `<path>` if it names an existing `.html` template, otherwise the
/// home page (or a 404 when `fallback_to_home` is off).
async fn handle_catch_all(tail: Tail, state: Arc<AppState>) -> Result<Page, Infallible> {
    let candidate = tail.as_str();
    if candidate.ends_with(".html") && state.pages.exists(candidate) {
        return Ok(state.pages.fetch(candidate).await);
    }
    if state.fallback_to_home {
        debug!(path = candidate, "Unmatched path, serving home page");
        Ok(state.pages.fetch(HOME_PAGE).await)
    } else {
        Ok(Page::NotFound)
    }
}

pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (code, message) = if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Request payload too large")
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        (StatusCode::LENGTH_REQUIRED, "Content-Length required")
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found")
    } else {
        tracing::error!("Unhandled rejection: {:?}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    };

    Ok(error_response(code, message, None))
}

fn error_response(
    status: StatusCode,
    error: &str,
    details: Option<String>,
) -> warp::reply::Response {
    let body = ApiError {
        error: error.to_string(),
        details,
    };
    warp::reply::with_status(warp::reply::json(&body), status).into_response()
}
