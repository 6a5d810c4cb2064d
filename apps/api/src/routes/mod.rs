pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers::{handle_create_analysis, handle_get_analysis};
use crate::optimization::handlers::handle_optimize;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/analyses", post(handle_create_analysis))
        .route("/api/v1/analyses/:id", get(handle_get_analysis))
        .route("/api/v1/analyses/:id/optimize", post(handle_optimize))
        .layer(body_limit)
        .with_state(state)
}
