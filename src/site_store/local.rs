use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use tokio_util::io::ReaderStream;

use super::{path as path_security, ByteStream, FileStat, SiteStore, StoreError};
use crate::registry::Project;

/// Filesystem storage backend. Each project's files live under
/// `<root>/<folder>`; the root is canonicalized once at construction so the
/// containment check in [`path_security::safe_join`] has a fixed boundary.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;
        let root = std::fs::canonicalize(root)?;
        Ok(Self { root })
    }

    fn namespace_dir(&self, project: &Project) -> PathBuf {
        debug_assert!(
            !project.folder.is_empty() && !project.folder.contains('/'),
            "project folder must be a single path segment"
        );
        self.root.join(&project.folder)
    }

    /// Resolve a file location, rejecting the namespace root and anything
    /// that escapes it.
    fn file_location(&self, project: &Project, path: &str) -> Result<PathBuf, StoreError> {
        let rel = path_security::normalize_file(path)?;
        path_security::safe_join(&self.namespace_dir(project), &rel)
    }

    async fn file_metadata(
        &self,
        project: &Project,
        path: &str,
    ) -> Result<(PathBuf, std::fs::Metadata), StoreError> {
        let location = self.file_location(project, path)?;
        let meta = tokio::fs::metadata(&location).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound(path.to_string())
            } else {
                StoreError::Io(e)
            }
        })?;
        if meta.is_dir() {
            return Err(StoreError::NotAFile(path.to_string()));
        }
        Ok((location, meta))
    }
}

#[async_trait]
impl SiteStore for LocalStore {
    async fn read(&self, project: &Project, path: &str) -> Result<Bytes, StoreError> {
        let (location, _) = self.file_metadata(project, path).await?;
        let data = tokio::fs::read(&location).await?;
        Ok(Bytes::from(data))
    }

    async fn write_bytes(
        &self,
        project: &Project,
        path: &str,
        content: Bytes,
    ) -> Result<(), StoreError> {
        let location = self.file_location(project, path)?;
        if let Some(parent) = location.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&location, &content).await?;
        Ok(())
    }

    async fn delete(&self, project: &Project, path: &str) -> Result<(), StoreError> {
        let (location, _) = self.file_metadata(project, path).await?;
        tokio::fs::remove_file(&location).await?;
        Ok(())
    }

    async fn exists(&self, project: &Project, path: &str) -> bool {
        // Directories are not retrievable leaves; they answer false just as
        // a bare prefix does on the object store.
        self.file_metadata(project, path).await.is_ok()
    }

    async fn stat(&self, project: &Project, path: &str) -> Result<FileStat, StoreError> {
        let (_, meta) = self.file_metadata(project, path).await?;
        let modified = meta.modified().ok().map(DateTime::<Utc>::from);
        Ok(FileStat {
            size: meta.len(),
            modified,
        })
    }

    async fn list(&self, project: &Project) -> Result<Vec<String>, StoreError> {
        let namespace = self.namespace_dir(project);
        if !tokio::fs::try_exists(&namespace).await.unwrap_or(false) {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let mut pending = vec![namespace.clone()];
        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let entry_path = entry.path();
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    pending.push(entry_path);
                } else {
                    let rel = entry_path
                        .strip_prefix(&namespace)
                        .map_err(|_| StoreError::AccessDenied)?;
                    files.push(rel.to_string_lossy().replace('\\', "/"));
                }
            }
        }
        Ok(files)
    }

    async fn read_stream(&self, project: &Project, path: &str) -> Result<ByteStream, StoreError> {
        let (location, _) = self.file_metadata(project, path).await?;
        let file = tokio::fs::File::open(&location).await?;
        let stream = ReaderStream::new(file).map(|chunk| chunk.map_err(StoreError::Io));
        Ok(Box::pin(stream))
    }

    async fn ensure_namespace(&self, project: &Project, path: &str) -> Result<(), StoreError> {
        let rel = path_security::normalize(path)?;
        let location = path_security::safe_join(&self.namespace_dir(project), &rel)?;
        tokio::fs::create_dir_all(&location).await?;
        Ok(())
    }
}
