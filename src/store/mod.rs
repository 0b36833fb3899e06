//! Persistent storage seam for ban records.
//!
//! The registry never assumes a specific engine; it talks to a [`BanStore`]
//! chosen once at startup from [`StorageConfig`]. Two backends exist:
//! SQLite ([`SqliteStore`]) for durable deployments and an in-memory store
//! ([`MemoryStore`]) for embedders and tests.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::ban::BanRecord;
use crate::config::{StorageBackend, StorageConfig};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Storage layer errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Row-level access to the ban table.
///
/// Each method maps to a single statement and is atomic on its own; the
/// store provides no cross-call transactions. `create` and `delete`
/// report rows affected so callers can distinguish a no-op (duplicate
/// insert, missing key) from success.
#[async_trait]
pub trait BanStore: Send + Sync {
    /// Append one record. Returns 0 if the network key already exists.
    async fn create(&self, record: &BanRecord) -> Result<u64, StoreError>;

    /// Delete the record with this exact network key. Returns rows removed.
    async fn delete(&self, network: &str) -> Result<u64, StoreError>;

    /// All records in stable insertion order, expired ones included.
    async fn list(&self) -> Result<Vec<BanRecord>, StoreError>;
}

/// Open the backend named by the configuration.
pub async fn open(config: &StorageConfig) -> Result<Arc<dyn BanStore>, StoreError> {
    match config.backend {
        StorageBackend::Sqlite => Ok(Arc::new(SqliteStore::open(&config.path).await?)),
        StorageBackend::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}
