use super::{DuplicateStore, DuplicateStoreError};
use crate::config::Config;
use crate::qdrant::{
    PointUpsert, QdrantService, point_id_for_hash,
    payload::{build_hash_payload, current_timestamp_rfc3339},
};
use async_trait::async_trait;

/// Hash points carry a constant one-dimensional vector; only ids and payloads matter.
const HASH_VECTOR_SIZE: u64 = 1;
const HASH_FIELD: &str = "content_hash";

/// Duplicate store backed by a Qdrant collection, one point per content hash.
pub struct QdrantDuplicateStore {
    qdrant: QdrantService,
    collection: String,
}

impl QdrantDuplicateStore {
    /// Wrap an existing client without touching the remote collection.
    pub fn new(qdrant: QdrantService, collection: impl Into<String>) -> Self {
        Self {
            qdrant,
            collection: collection.into(),
        }
    }

    /// Connect using configuration and make sure the hash collection exists.
    pub async fn from_config(config: &Config) -> Result<Self, DuplicateStoreError> {
        let qdrant = QdrantService::new(&config.qdrant_url, config.qdrant_api_key.clone())?;
        let store = Self::new(qdrant, config.qdrant_collection_name.clone());
        store.ensure_collection().await?;
        Ok(store)
    }

    /// Create the hash collection and its payload index when missing.
    pub async fn ensure_collection(&self) -> Result<(), DuplicateStoreError> {
        tracing::debug!(collection = %self.collection, "Ensuring hash collection");
        self.qdrant
            .create_collection_if_not_exists(&self.collection, HASH_VECTOR_SIZE)
            .await?;
        self.qdrant
            .ensure_keyword_index(&self.collection, HASH_FIELD)
            .await?;
        tracing::info!(collection = %self.collection, "Hash collection ready");
        Ok(())
    }
}

#[async_trait]
impl DuplicateStore for QdrantDuplicateStore {
    async fn contains(&self, content_hash: &str) -> Result<bool, DuplicateStoreError> {
        let point_id = point_id_for_hash(content_hash);
        Ok(self.qdrant.point_exists(&self.collection, &point_id).await?)
    }

    async fn record(&self, content_hash: &str) -> Result<(), DuplicateStoreError> {
        let point = PointUpsert {
            id: point_id_for_hash(content_hash),
            vector: vec![1.0],
            payload: build_hash_payload(content_hash, &current_timestamp_rfc3339()),
        };
        self.qdrant.upsert_point(&self.collection, point).await?;
        Ok(())
    }
}
