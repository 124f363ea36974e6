mod admin;
mod files;
mod projects;
mod sites;

use crate::api::response::ApiError;
use crate::registry::RegistryError;
use crate::site_store::StoreError;

pub use admin::health;
pub use files::{delete_file, list_files, read_file, write_file};
pub use projects::{create_project, delete_project, get_project, list_projects, update_project};
pub use sites::serve_site;

/// Map a StoreError to an ApiError. Backend transport detail stays in the
/// server log; clients get the generic message.
fn store_error(e: StoreError) -> ApiError {
    match e {
        StoreError::AccessDenied => ApiError::forbidden("Access denied"),
        StoreError::NotFound(path) => ApiError::not_found(format!("File not found: {path}")),
        StoreError::NotAFile(path) => ApiError::bad_request(format!("Not a file: {path}")),
        e => {
            tracing::error!(error = %e, "Storage backend error");
            ApiError::internal("Storage backend error")
        }
    }
}

/// Map a RegistryError to an ApiError
fn registry_error(e: RegistryError) -> ApiError {
    match e {
        RegistryError::HostInUse(host) => {
            ApiError::conflict(format!("hostname '{host}' is already in use"))
        }
        e => {
            tracing::error!(error = %e, "Registry error");
            ApiError::internal("Registry error")
        }
    }
}
