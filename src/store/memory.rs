//! In-memory ban store.

use super::{BanStore, StoreError};
use crate::ban::BanRecord;
use async_trait::async_trait;
use parking_lot::Mutex;

/// Ban store backed by a plain Vec, preserving insertion order.
///
/// Useful for embedders that persist elsewhere and for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<BanRecord>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BanStore for MemoryStore {
    async fn create(&self, record: &BanRecord) -> Result<u64, StoreError> {
        let mut records = self.records.lock();
        if records.iter().any(|r| r.network == record.network) {
            return Ok(0);
        }
        records.push(record.clone());
        Ok(1)
    }

    async fn delete(&self, network: &str) -> Result<u64, StoreError> {
        let mut records = self.records.lock();
        let before = records.len();
        records.retain(|r| r.network != network);
        Ok((before - records.len()) as u64)
    }

    async fn list(&self) -> Result<Vec<BanRecord>, StoreError> {
        Ok(self.records.lock().clone())
    }
}
