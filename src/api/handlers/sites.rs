use axum::extract::{Host, State};
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::serve::{ServeBody, ServeOutcome};
use crate::AppState;

/// Serve a project's files by request hostname. Mounted as the router
/// fallback, so a path the pipeline declines terminates here as a plain 404.
pub async fn serve_site(
    State(state): State<Arc<AppState>>,
    Host(host): Host,
    uri: Uri,
) -> Response {
    match state.pipeline.serve(&host, uri.path()).await {
        ServeOutcome::Unhandled => (StatusCode::NOT_FOUND, "Not Found").into_response(),
        ServeOutcome::Response(resp) => {
            let mut response = match resp.body {
                ServeBody::Buffered(bytes) => (resp.status, bytes).into_response(),
                ServeBody::Stream(stream) => {
                    (resp.status, axum::body::Body::from_stream(stream)).into_response()
                }
            };
            if let Some(content_type) = resp.content_type {
                if let Ok(value) = content_type.parse() {
                    response.headers_mut().insert(header::CONTENT_TYPE, value);
                }
            }
            response
        }
    }
}
