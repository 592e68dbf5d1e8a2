pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::extraction::handlers as extraction;
use crate::generation::handlers as generation;
use crate::state::AppState;
use crate::usage::handlers as usage;

/// Largest accepted resume upload.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/extract",
            post(extraction::handle_extract).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/v1/generate", post(generation::handle_generate))
        .route("/api/v1/download", post(generation::handle_download))
        .route("/api/v1/usage", get(usage::handle_get_usage))
        .with_state(state)
}
