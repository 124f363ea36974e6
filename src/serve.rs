//! Per-request serving pipeline: hostname -> project -> storage -> response.
//!
//! Non-HTML files are streamed straight from the backend so a slow client
//! applies backpressure to the storage read instead of buffering server-side.
//! HTML files are buffered and run through layout composition.

use std::sync::Arc;

use axum::http::StatusCode;
use bytes::Bytes;

use crate::registry::{Project, ProjectResolver};
use crate::render;
use crate::site_store::{ByteStream, SiteStore, StoreError};

/// How a request left the pipeline.
pub enum ServeOutcome {
    /// The file does not exist; the surrounding router may claim the path.
    Unhandled,
    /// A terminal HTTP outcome.
    Response(ServeResponse),
}

pub struct ServeResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: ServeBody,
}

pub enum ServeBody {
    Buffered(Bytes),
    Stream(ByteStream),
}

impl ServeResponse {
    fn text(status: StatusCode, message: &'static str) -> Self {
        Self {
            status,
            content_type: Some("text/plain; charset=utf-8".to_string()),
            body: ServeBody::Buffered(Bytes::from_static(message.as_bytes())),
        }
    }
}

pub struct SitePipeline {
    resolver: Arc<dyn ProjectResolver>,
    store: Arc<dyn SiteStore>,
}

impl SitePipeline {
    pub fn new(resolver: Arc<dyn ProjectResolver>, store: Arc<dyn SiteStore>) -> Self {
        Self { resolver, store }
    }

    /// Serve one request. `hostname` may carry a port suffix; `request_path`
    /// is the raw URI path including its leading slash.
    pub async fn serve(&self, hostname: &str, request_path: &str) -> ServeOutcome {
        let host = hostname.split(':').next().unwrap_or(hostname);

        let project = match self.resolver.find_project_by_host(host) {
            Ok(Some(project)) => project,
            Ok(None) => {
                return ServeOutcome::Response(ServeResponse::text(
                    StatusCode::NOT_FOUND,
                    "Not Found",
                ))
            }
            Err(e) => {
                tracing::error!(host, error = %e, "Project lookup failed");
                return ServeOutcome::Response(ServeResponse::text(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error",
                ));
            }
        };

        let path = request_path.trim_start_matches('/');
        let path = if path.is_empty() { "index.html" } else { path };

        if has_html_extension(path) {
            self.render_html(&project, path).await
        } else {
            self.stream_file(&project, path).await
        }
    }

    async fn stream_file(&self, project: &Project, path: &str) -> ServeOutcome {
        match self.store.read_stream(project, path).await {
            Ok(stream) => ServeOutcome::Response(ServeResponse {
                status: StatusCode::OK,
                content_type: Some(mime_guess::from_path(path).first_or_octet_stream().to_string()),
                body: ServeBody::Stream(stream),
            }),
            Err(e) => self.error_outcome(project, path, e),
        }
    }

    async fn render_html(&self, project: &Project, path: &str) -> ServeOutcome {
        match self.store.read(project, path).await {
            Ok(bytes) => {
                let content = String::from_utf8_lossy(&bytes);
                let body = render::render_page(self.store.as_ref(), project, &content).await;
                ServeOutcome::Response(ServeResponse {
                    status: StatusCode::OK,
                    content_type: Some("text/html; charset=utf-8".to_string()),
                    body: ServeBody::Buffered(Bytes::from(body)),
                })
            }
            Err(e) => self.error_outcome(project, path, e),
        }
    }

    fn error_outcome(&self, project: &Project, path: &str, err: StoreError) -> ServeOutcome {
        match err {
            StoreError::NotFound(_) => ServeOutcome::Unhandled,
            StoreError::AccessDenied => {
                ServeOutcome::Response(ServeResponse::text(StatusCode::FORBIDDEN, "Forbidden"))
            }
            StoreError::NotAFile(_) => {
                ServeOutcome::Response(ServeResponse::text(StatusCode::BAD_REQUEST, "Bad Request"))
            }
            e => {
                tracing::error!(project_id = %project.id, path, error = %e, "Storage error while serving");
                ServeOutcome::Response(ServeResponse::text(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error",
                ))
            }
        }
    }
}

fn has_html_extension(path: &str) -> bool {
    std::path::Path::new(path)
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("html"))
        .unwrap_or(false)
}
