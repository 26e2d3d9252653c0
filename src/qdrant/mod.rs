//! Qdrant integration used as the duplicate-store backend.

pub mod client;
pub mod payload;
pub mod types;

pub use client::QdrantService;
pub use payload::point_id_for_hash;
pub use types::{PointUpsert, QdrantError};
