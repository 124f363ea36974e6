use chrono::Utc;
use redb::ReadableTable;

use super::db::{Registry, RegistryError};
use super::models::{folder_slug, normalize_host, Project};
use super::tables::*;

impl Registry {
    // ========================================================================
    // Project operations
    // ========================================================================

    /// Create a project. The storage folder is derived from the name, with
    /// numeric suffixes resolving collisions; hostnames must not be claimed
    /// by another project.
    pub fn create_project(
        &self,
        name: &str,
        color: &str,
        hosts: &[String],
    ) -> Result<Project, RegistryError> {
        let hosts = dedupe_hosts(hosts);
        let now = Utc::now();

        let write_txn = self.begin_write()?;
        let project = {
            let mut projects = write_txn.open_table(PROJECTS)?;
            let mut host_index = write_txn.open_table(PROJECT_HOSTS)?;
            let mut folder_index = write_txn.open_table(PROJECT_FOLDERS)?;

            for host in &hosts {
                if host_index.get(host.as_str())?.is_some() {
                    return Err(RegistryError::HostInUse(host.clone()));
                }
            }

            // base, base-1, base-2, ... skipping anything already taken
            let base = folder_slug(name);
            let mut folder = base.clone();
            let mut suffix = 0u32;
            while folder_index.get(folder.as_str())?.is_some() {
                suffix += 1;
                folder = format!("{base}-{suffix}");
            }

            let project = Project {
                id: uuid::Uuid::new_v4().to_string(),
                name: name.to_string(),
                color: color.to_string(),
                folder,
                hosts,
                created_at: now,
                updated_at: now,
            };

            let data = rmp_serde::to_vec_named(&project)?;
            projects.insert(project.id.as_str(), data.as_slice())?;
            folder_index.insert(project.folder.as_str(), project.id.as_str())?;
            for host in &project.hosts {
                host_index.insert(host.as_str(), project.id.as_str())?;
            }

            project
        };
        write_txn.commit()?;
        Ok(project)
    }

    /// Get a project by its id
    pub fn get_project(&self, id: &str) -> Result<Option<Project>, RegistryError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(PROJECTS)?;

        match table.get(id)? {
            Some(data) => {
                let project: Project = rmp_serde::from_slice(data.value())?;
                Ok(Some(project))
            }
            None => Ok(None),
        }
    }

    /// Get a project by one of its hostnames (resolves host -> id -> project)
    pub fn get_project_by_host(&self, host: &str) -> Result<Option<Project>, RegistryError> {
        let host = normalize_host(host);
        let read_txn = self.begin_read()?;
        let host_index = read_txn.open_table(PROJECT_HOSTS)?;

        let id = match host_index.get(host.as_str())? {
            Some(data) => data.value().to_string(),
            None => return Ok(None),
        };

        let projects = read_txn.open_table(PROJECTS)?;
        match projects.get(id.as_str())? {
            Some(data) => {
                let project: Project = rmp_serde::from_slice(data.value())?;
                Ok(Some(project))
            }
            None => Ok(None),
        }
    }

    /// All projects, unordered
    pub fn list_projects(&self) -> Result<Vec<Project>, RegistryError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(PROJECTS)?;

        let mut projects = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let project: Project = rmp_serde::from_slice(value.value())?;
            projects.push(project);
        }

        Ok(projects)
    }

    /// Update a project's mutable fields. The folder is immutable; changing
    /// the host set rewrites the host index.
    pub fn update_project(
        &self,
        id: &str,
        name: Option<&str>,
        color: Option<&str>,
        hosts: Option<&[String]>,
    ) -> Result<Option<Project>, RegistryError> {
        let write_txn = self.begin_write()?;

        let existing = {
            let table = write_txn.open_table(PROJECTS)?;
            let result = match table.get(id)? {
                Some(data) => {
                    let project: Project = rmp_serde::from_slice(data.value())?;
                    Some(project)
                }
                None => None,
            };
            result
        };

        let updated = match existing {
            Some(mut project) => {
                if let Some(name) = name {
                    project.name = name.to_string();
                }
                if let Some(color) = color {
                    project.color = color.to_string();
                }
                if let Some(new_hosts) = hosts {
                    let new_hosts = dedupe_hosts(new_hosts);
                    let mut host_index = write_txn.open_table(PROJECT_HOSTS)?;

                    for host in &new_hosts {
                        let owner = host_index.get(host.as_str())?.map(|v| v.value().to_string());
                        if matches!(owner, Some(ref owner_id) if owner_id != id) {
                            return Err(RegistryError::HostInUse(host.clone()));
                        }
                    }

                    for host in &project.hosts {
                        host_index.remove(host.as_str())?;
                    }
                    for host in &new_hosts {
                        host_index.insert(host.as_str(), id)?;
                    }
                    project.hosts = new_hosts;
                }

                project.updated_at = Utc::now();

                let data = rmp_serde::to_vec_named(&project)?;
                let mut table = write_txn.open_table(PROJECTS)?;
                table.insert(id, data.as_slice())?;
                Some(project)
            }
            None => None,
        };

        write_txn.commit()?;
        Ok(updated)
    }

    /// Delete a project and clean up the host and folder indexes. The
    /// project's stored files are the storage backend's concern, not the
    /// registry's.
    pub fn delete_project(&self, id: &str) -> Result<bool, RegistryError> {
        let write_txn = self.begin_write()?;

        let existing = {
            let table = write_txn.open_table(PROJECTS)?;
            let result = match table.get(id)? {
                Some(data) => {
                    let project: Project = rmp_serde::from_slice(data.value())?;
                    Some(project)
                }
                None => None,
            };
            result
        };

        let deleted = match existing {
            Some(project) => {
                {
                    let mut table = write_txn.open_table(PROJECTS)?;
                    table.remove(id)?;
                }
                {
                    let mut host_index = write_txn.open_table(PROJECT_HOSTS)?;
                    for host in &project.hosts {
                        host_index.remove(host.as_str())?;
                    }
                }
                {
                    let mut folder_index = write_txn.open_table(PROJECT_FOLDERS)?;
                    folder_index.remove(project.folder.as_str())?;
                }
                true
            }
            None => false,
        };

        write_txn.commit()?;
        Ok(deleted)
    }
}

fn dedupe_hosts(hosts: &[String]) -> Vec<String> {
    let mut seen = Vec::new();
    for host in hosts {
        let host = normalize_host(host);
        if !host.is_empty() && !seen.contains(&host) {
            seen.push(host);
        }
    }
    seen
}
