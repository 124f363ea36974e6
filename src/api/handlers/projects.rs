use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::registry_error;
use crate::api::response::{ApiError, AppJson, JSend};
use crate::registry::Project;
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub color: String,
    pub created_at: String,
    pub folder: String,
    pub hosts: Vec<String>,
    pub id: String,
    pub name: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub hosts: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub hosts: Option<Vec<String>>,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn create_project(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CreateProjectRequest>,
) -> Result<Json<JSend<ProjectResponse>>, ApiError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("name must not be empty"));
    }

    let project = state
        .registry
        .create_project(name, req.color.as_deref().unwrap_or(""), &req.hosts)
        .map_err(registry_error)?;

    tracing::debug!(project_id = %project.id, folder = %project.folder, "Created project");

    Ok(JSend::success(project_to_response(&project)))
}

pub async fn get_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JSend<ProjectResponse>>, ApiError> {
    let project = state
        .registry
        .get_project(&id)
        .map_err(registry_error)?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    Ok(JSend::success(project_to_response(&project)))
}

pub async fn list_projects(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<Vec<ProjectResponse>>>, ApiError> {
    let projects = state.registry.list_projects().map_err(registry_error)?;
    let items = projects.iter().map(project_to_response).collect();
    Ok(JSend::success(items))
}

pub async fn update_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    AppJson(req): AppJson<UpdateProjectRequest>,
) -> Result<Json<JSend<ProjectResponse>>, ApiError> {
    if req.name.is_none() && req.color.is_none() && req.hosts.is_none() {
        return Err(ApiError::bad_request(
            "at least one field (name, color, hosts) must be provided",
        ));
    }

    if let Some(ref name) = req.name {
        if name.trim().is_empty() {
            return Err(ApiError::bad_request("name must not be empty"));
        }
    }

    let project = state
        .registry
        .update_project(
            &id,
            req.name.as_deref().map(str::trim),
            req.color.as_deref(),
            req.hosts.as_deref(),
        )
        .map_err(registry_error)?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    tracing::debug!(project_id = %project.id, "Updated project");
    Ok(JSend::success(project_to_response(&project)))
}

pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JSend<()>>, ApiError> {
    let deleted = state.registry.delete_project(&id).map_err(registry_error)?;
    if !deleted {
        return Err(ApiError::not_found("Project not found"));
    }

    tracing::debug!(project_id = %id, "Deleted project");
    Ok(JSend::success(()))
}

// ============================================================================
// Helpers
// ============================================================================

fn project_to_response(project: &Project) -> ProjectResponse {
    ProjectResponse {
        color: project.color.clone(),
        created_at: project.created_at.to_rfc3339(),
        folder: project.folder.clone(),
        hosts: project.hosts.clone(),
        id: project.id.clone(),
        name: project.name.clone(),
        updated_at: project.updated_at.to_rfc3339(),
    }
}
