//! `/api/v2` handlers
//!
//! All handlers return `Response` via [`ApiResponse::ok`] or [`ApiErrorResponse`].
//! Evaluation is CPU-bound (detectors fan out on rayon), so it runs on the
//! blocking pool instead of an async worker.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::envelope::{ApiErrorResponse, ApiResponse};
use crate::config::{validation, TunerConfig, ValidationWarning};
use crate::engine::TuningEngine;
use crate::types::{CascadeGains, GainSet, IssueLabel, Sample};

// ============================================================================
// State
// ============================================================================

/// Shared state: one engine (immutable config inside) for every request.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<TuningEngine>,
}

impl AppState {
    pub fn new(config: Arc<TunerConfig>) -> Self {
        Self {
            engine: Arc::new(TuningEngine::new(config)),
        }
    }
}

// ============================================================================
// Request / Response types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    pub samples: Vec<Sample>,
    pub outer_gains: GainSet,
    pub inner_gains: GainSet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendRequest {
    /// Label text (`"Oscillations"`) or CLI name (`"oscillation"`).
    pub issue: String,
    pub outer_gains: GainSet,
    pub inner_gains: GainSet,
}

#[derive(Debug, Deserialize)]
struct ValidateConfigRequest {
    toml: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub plant: String,
}

#[derive(Debug, Serialize)]
pub struct ConfigValidation {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<ValidationWarning>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v2/system/health
pub async fn system_health(State(state): State<AppState>) -> Response {
    ApiResponse::ok(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        plant: state.engine.config().plant.name.clone(),
    })
}

/// POST /api/v2/evaluate
pub async fn evaluate(
    State(state): State<AppState>,
    payload: Result<Json<EvaluateRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(body) => body,
        Err(rejection) => return ApiErrorResponse::bad_request(rejection.body_text()),
    };
    let gains = CascadeGains::new(request.outer_gains, request.inner_gains);
    let count = request.samples.len();
    let engine = Arc::clone(&state.engine);

    let outcome =
        tokio::task::spawn_blocking(move || engine.evaluate_samples(request.samples, &gains)).await;

    match outcome {
        Ok(Ok(report)) => {
            info!(samples = count, status = %report.status, "Evaluate request served");
            ApiResponse::ok(report)
        }
        Ok(Err(e)) => {
            warn!(samples = count, error = %e, "Evaluate request rejected");
            ApiErrorResponse::evaluation(&e)
        }
        Err(e) => ApiErrorResponse::internal(format!("Evaluation task failed: {e}")),
    }
}

/// POST /api/v2/recommend
pub async fn recommend(
    State(state): State<AppState>,
    payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(body) => body,
        Err(rejection) => return ApiErrorResponse::bad_request(rejection.body_text()),
    };
    let label: IssueLabel = match request.issue.parse() {
        Ok(label) => label,
        Err(e) => return ApiErrorResponse::bad_request(e),
    };
    let gains = CascadeGains::new(request.outer_gains, request.inner_gains);

    match state.engine.recommend(label, &gains) {
        Ok(rec) => ApiResponse::ok(rec),
        Err(e) => ApiErrorResponse::evaluation(&e),
    }
}

/// GET /api/v2/config
pub async fn get_config(State(state): State<AppState>) -> Response {
    ApiResponse::ok(state.engine.config().clone())
}

/// POST /api/v2/config/validate
///
/// Body is raw TOML, or JSON `{ "toml": "..." }`.
pub async fn validate_config(body: String) -> Response {
    let text = serde_json::from_str::<ValidateConfigRequest>(&body)
        .map_or(body, |request| request.toml);
    ApiResponse::ok(check_config(&text))
}

fn check_config(text: &str) -> ConfigValidation {
    let mut warnings = validation::validate_unknown_keys(text);
    let config: TunerConfig = match toml::from_str(text) {
        Ok(c) => c,
        Err(e) => {
            return ConfigValidation {
                valid: false,
                errors: vec![format!("TOML parse error: {e}")],
                warnings,
            }
        }
    };
    let (errors, range_warnings) = validation::validate_ranges(&config);
    warnings.extend(range_warnings);
    if !errors.is_empty() {
        warn!(count = errors.len(), "Candidate config rejected");
    }
    ConfigValidation {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}
