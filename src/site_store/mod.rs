mod local;
pub mod path;
mod s3;

pub use local::LocalStore;
pub use s3::S3Store;

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures_util::Stream;
use thiserror::Error;

use crate::registry::Project;

/// Closed error set shared by both backends. Handlers match on the variant;
/// messages carry relative paths only, never resolved absolute locations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("access denied")]
    AccessDenied,
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("not a file: {0}")]
    NotAFile(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("backend error: {0}")]
    Backend(String),
}

/// Metadata for a stored file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// Chunked file content. Errors after the first chunk surface through the
/// stream items; everything detectable up front fails before the stream is
/// handed out.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StoreError>> + Send>>;

/// Abstraction over per-project file storage.
///
/// Every operation is keyed by (project, relative path). The relative path is
/// caller-supplied and untrusted; implementations run it through
/// [`path::normalize`] before touching the backend, so a validated location
/// always resolves inside the project's namespace. The two implementations
/// must be externally indistinguishable apart from namespace creation being a
/// no-op on flat-keyed backends.
#[async_trait]
pub trait SiteStore: Send + Sync {
    /// Read the full content of a file.
    async fn read(&self, project: &Project, path: &str) -> Result<Bytes, StoreError>;

    /// Write UTF-8 text, creating or overwriting the file.
    async fn write(&self, project: &Project, path: &str, content: &str) -> Result<(), StoreError> {
        self.write_bytes(project, path, Bytes::copy_from_slice(content.as_bytes()))
            .await
    }

    /// Write raw bytes, creating or overwriting the file. Missing intermediate
    /// namespace structure is created transparently.
    async fn write_bytes(
        &self,
        project: &Project,
        path: &str,
        content: Bytes,
    ) -> Result<(), StoreError>;

    /// Delete a file. Fails with the same rules as [`SiteStore::read`].
    async fn delete(&self, project: &Project, path: &str) -> Result<(), StoreError>;

    /// Whether a location exists. Never fails; any underlying error
    /// (including a security rejection) resolves to `false`.
    async fn exists(&self, project: &Project, path: &str) -> bool;

    /// Size and modification time of a file.
    async fn stat(&self, project: &Project, path: &str) -> Result<FileStat, StoreError>;

    /// Every file under the project's namespace as `/`-separated relative
    /// paths. A missing namespace yields an empty list.
    async fn list(&self, project: &Project) -> Result<Vec<String>, StoreError>;

    /// Open a file for chunked reading. Existence and type are checked before
    /// the stream is returned.
    async fn read_stream(&self, project: &Project, path: &str) -> Result<ByteStream, StoreError>;

    /// Create intermediate namespace structure for a path. Recursive directory
    /// creation on the filesystem; a validated no-op where the namespace is
    /// virtual.
    async fn ensure_namespace(&self, project: &Project, path: &str) -> Result<(), StoreError>;
}
