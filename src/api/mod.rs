//! REST API module using Axum
//!
//! Exposes the tuning engine over HTTP under `/api/v2`. Every response uses
//! the envelope in [`envelope`].

pub mod envelope;
pub mod handlers;
mod routes;

pub use handlers::AppState;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Comma-separated origins allowed to call the API cross-origin.
pub const CORS_ENV_VAR: &str = "TUNER_CORS_ORIGINS";

/// Same-origin only unless `TUNER_CORS_ORIGINS` lists allowed origins.
fn build_cors_layer() -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    match std::env::var(CORS_ENV_VAR) {
        Ok(origins) => {
            let allowed: Vec<_> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            tracing::info!(origins = %origins, "CORS: allowing configured origins");
            base.allow_origin(allowed)
        }
        Err(_) => base,
    }
}

/// Create the application router.
pub fn create_app(state: AppState) -> Router {
    let body_limit = state.engine.config().server.max_body_bytes;

    Router::new()
        .nest("/api/v2", routes::api_routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(build_cors_layer())
}
