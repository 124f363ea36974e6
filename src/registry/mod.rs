pub mod db;
pub mod models;
mod projects;
mod tables;

pub use db::{Registry, RegistryError};
pub use models::Project;

/// Hostname and id lookups, the only registry calls the serving core makes.
/// One lookup per inbound request, no caching or retries; a miss is a
/// legitimate "no project for this host", not an error.
pub trait ProjectResolver: Send + Sync {
    fn find_project_by_host(&self, host: &str) -> Result<Option<Project>, RegistryError>;
    fn find_project_by_id(&self, id: &str) -> Result<Option<Project>, RegistryError>;
}

impl ProjectResolver for Registry {
    fn find_project_by_host(&self, host: &str) -> Result<Option<Project>, RegistryError> {
        self.get_project_by_host(host)
    }

    fn find_project_by_id(&self, id: &str) -> Result<Option<Project>, RegistryError> {
        self.get_project(id)
    }
}
