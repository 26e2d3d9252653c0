use super::{DuplicateStore, DuplicateStoreError};
use async_trait::async_trait;
use std::collections::HashSet;
use tokio::sync::RwLock;

/// Process-local duplicate store.
#[derive(Debug, Default)]
pub struct MemoryDuplicateStore {
    hashes: RwLock<HashSet<String>>,
}

impl MemoryDuplicateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded hashes.
    pub async fn len(&self) -> usize {
        self.hashes.read().await.len()
    }

    /// Whether no hash has been recorded yet.
    pub async fn is_empty(&self) -> bool {
        self.hashes.read().await.is_empty()
    }
}

#[async_trait]
impl DuplicateStore for MemoryDuplicateStore {
    async fn contains(&self, content_hash: &str) -> Result<bool, DuplicateStoreError> {
        Ok(self.hashes.read().await.contains(content_hash))
    }

    async fn record(&self, content_hash: &str) -> Result<(), DuplicateStoreError> {
        self.hashes.write().await.insert(content_hash.to_string());
        Ok(())
    }
}
