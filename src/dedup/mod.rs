//! Duplicate detection: content fingerprints and the stores that remember them.

pub mod fingerprint;
mod memory;
mod qdrant_store;

pub use fingerprint::{compute_content_hash, normalize_content};
pub use memory::MemoryDuplicateStore;
pub use qdrant_store::QdrantDuplicateStore;

use crate::config::{DuplicateStoreKind, get_config};
use crate::qdrant::QdrantError;
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by duplicate-store backends.
#[derive(Debug, Error)]
pub enum DuplicateStoreError {
    /// The Qdrant backend rejected or failed a request.
    #[error("Duplicate store request failed: {0}")]
    Qdrant(#[from] QdrantError),
}

/// Membership set of content hashes that have already been classified.
///
/// Entries never expire.
#[async_trait]
pub trait DuplicateStore: Send + Sync {
    /// Report whether `content_hash` was recorded before.
    async fn contains(&self, content_hash: &str) -> Result<bool, DuplicateStoreError>;

    /// Remember `content_hash`. Recording an existing hash is a no-op.
    async fn record(&self, content_hash: &str) -> Result<(), DuplicateStoreError>;
}

/// Build the duplicate store selected by configuration, preparing backing resources.
pub async fn get_duplicate_store() -> Result<Box<dyn DuplicateStore>, DuplicateStoreError> {
    let config = get_config();
    match config.duplicate_store {
        DuplicateStoreKind::Memory => {
            tracing::warn!("Using in-memory duplicate store; hashes are lost on restart");
            Ok(Box::new(MemoryDuplicateStore::new()))
        }
        DuplicateStoreKind::Qdrant => {
            let store = QdrantDuplicateStore::from_config(config).await?;
            Ok(Box::new(store))
        }
    }
}
