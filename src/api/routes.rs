//! `/api/v2` route table.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{self, AppState};

/// Build the v2 API router.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/system/health", get(handlers::system_health))
        // Evaluation
        .route("/evaluate", post(handlers::evaluate))
        .route("/recommend", post(handlers::recommend))
        // Config
        .route("/config", get(handlers::get_config))
        .route("/config/validate", post(handlers::validate_config))
        .with_state(state)
}
