pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::parser::handlers;
use crate::render::handlers::handle_render;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Parse API
        .route("/api/v1/parse", post(handlers::handle_parse))
        .route("/api/v1/parse/upload", post(handlers::handle_upload))
        .route("/api/v1/parse/sections", post(handlers::handle_sections))
        // Render API
        .route("/api/v1/render", post(handle_render))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
