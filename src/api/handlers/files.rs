use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;

use super::{registry_error, store_error};
use crate::api::response::{ApiError, JSend};
use crate::registry::Project;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct FileWriteResponse {
    pub path: String,
}

fn load_project(state: &AppState, id: &str) -> Result<Project, ApiError> {
    state
        .registry
        .get_project(id)
        .map_err(registry_error)?
        .ok_or_else(|| ApiError::not_found("Project not found"))
}

/// List every file in a project's namespace.
/// Route: GET /projects/:id/files
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JSend<Vec<String>>>, ApiError> {
    let project = load_project(&state, &id)?;
    let mut files = state.store.list(&project).await.map_err(store_error)?;
    files.sort();
    Ok(JSend::success(files))
}

/// Fetch raw file content.
/// Route: GET /projects/:id/files/*path
pub async fn read_file(
    State(state): State<Arc<AppState>>,
    Path((id, path)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let project = load_project(&state, &id)?;
    let data = state
        .store
        .read(&project, &path)
        .await
        .map_err(store_error)?;

    let mut response = (StatusCode::OK, data).into_response();
    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        mime.to_string()
            .parse()
            .unwrap_or(header::HeaderValue::from_static("application/octet-stream")),
    );

    Ok(response)
}

/// Create or overwrite a file with the raw request body.
/// Route: PUT /projects/:id/files/*path
pub async fn write_file(
    State(state): State<Arc<AppState>>,
    Path((id, path)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<JSend<FileWriteResponse>>, ApiError> {
    let project = load_project(&state, &id)?;
    state
        .store
        .write_bytes(&project, &path, body)
        .await
        .map_err(store_error)?;

    tracing::debug!(project_id = %project.id, path = %path, "Wrote file");
    Ok(JSend::success(FileWriteResponse { path }))
}

/// Delete a file.
/// Route: DELETE /projects/:id/files/*path
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path((id, path)): Path<(String, String)>,
) -> Result<Json<JSend<()>>, ApiError> {
    let project = load_project(&state, &id)?;
    state
        .store
        .delete(&project, &path)
        .await
        .map_err(store_error)?;

    tracing::debug!(project_id = %project.id, path = %path, "Deleted file");
    Ok(JSend::success(()))
}
