use redb::{Database as RedbDatabase, ReadTransaction, WriteTransaction};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use super::tables::*;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Commit error: {0}")]
    Commit(Box<redb::CommitError>),
    #[error("hostname already in use: {0}")]
    HostInUse(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Registry error: {0}")]
    Redb(Box<redb::Error>),
    #[error("Registry error: {0}")]
    RedbDatabase(Box<redb::DatabaseError>),
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] rmp_serde::decode::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] rmp_serde::encode::Error),
    #[error("Storage error: {0}")]
    Storage(Box<redb::StorageError>),
    #[error("Table error: {0}")]
    Table(Box<redb::TableError>),
    #[error("Transaction error: {0}")]
    Transaction(Box<redb::TransactionError>),
}

impl From<redb::CommitError> for RegistryError {
    fn from(e: redb::CommitError) -> Self {
        RegistryError::Commit(Box::new(e))
    }
}

impl From<redb::DatabaseError> for RegistryError {
    fn from(e: redb::DatabaseError) -> Self {
        RegistryError::RedbDatabase(Box::new(e))
    }
}

impl From<redb::Error> for RegistryError {
    fn from(e: redb::Error) -> Self {
        RegistryError::Redb(Box::new(e))
    }
}

impl From<redb::StorageError> for RegistryError {
    fn from(e: redb::StorageError) -> Self {
        RegistryError::Storage(Box::new(e))
    }
}

impl From<redb::TableError> for RegistryError {
    fn from(e: redb::TableError) -> Self {
        RegistryError::Table(Box::new(e))
    }
}

impl From<redb::TransactionError> for RegistryError {
    fn from(e: redb::TransactionError) -> Self {
        RegistryError::Transaction(Box::new(e))
    }
}

/// Embedded project registry. Cheap to clone; all clones share one redb
/// instance, which is safe for concurrent use by construction.
pub struct Registry {
    db: Arc<RedbDatabase>,
}

impl Clone for Registry {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
        }
    }
}

impl Registry {
    /// Open or create the registry database at the given path
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self, RegistryError> {
        std::fs::create_dir_all(data_dir.as_ref())?;
        let db_path = data_dir.as_ref().join("site-host.redb");
        let db = Arc::new(RedbDatabase::create(db_path)?);

        // Initialize application tables
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(PROJECTS)?;
            let _ = write_txn.open_table(PROJECT_HOSTS)?;
            let _ = write_txn.open_table(PROJECT_FOLDERS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Begin a read transaction
    pub fn begin_read(&self) -> Result<ReadTransaction, RegistryError> {
        Ok(self.db.begin_read()?)
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> Result<WriteTransaction, RegistryError> {
        Ok(self.db.begin_write()?)
    }
}
