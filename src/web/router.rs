//! Router configuration for Web API.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{upload_files, AppState};

/// Create the upload API router.
///
/// axum's default body limit is disabled on the upload route; the upload
/// policy's request cap applies instead.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let upload_routes = Router::new()
        .route("/upload", post(upload_files))
        .layer(DefaultBodyLimit::disable());

    Router::new()
        .merge(upload_routes)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
