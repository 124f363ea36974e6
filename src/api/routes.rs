use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.max_upload_size as usize;

    Router::new()
        // Projects
        .route("/projects", get(handlers::list_projects))
        .route("/projects", post(handlers::create_project))
        .route("/projects/:id", delete(handlers::delete_project))
        .route("/projects/:id", get(handlers::get_project))
        .route("/projects/:id", put(handlers::update_project))
        // Per-project file management
        .route("/projects/:id/files", get(handlers::list_files))
        .route("/projects/:id/files/*path", delete(handlers::delete_file))
        .route("/projects/:id/files/*path", get(handlers::read_file))
        .route(
            "/projects/:id/files/*path",
            put(handlers::write_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        // Internal
        .route("/_internal/health", get(handlers::health))
        // Everything else is host-based site serving
        .fallback(handlers::serve_site)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
