//! Shared types used by the Qdrant client and helpers.

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors returned while interacting with Qdrant.
#[derive(Debug, Error)]
pub enum QdrantError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid Qdrant URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Qdrant responded with an unexpected status code.
    #[error("Unexpected Qdrant response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned from Qdrant.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}

/// Point written by [`crate::qdrant::QdrantService::upsert_point`].
#[derive(Debug, Clone)]
pub struct PointUpsert {
    /// UUID identifying the point.
    pub id: String,
    /// Vector stored with the point.
    pub vector: Vec<f32>,
    /// Payload object stored with the point.
    pub payload: Map<String, Value>,
}

#[derive(Deserialize)]
pub(crate) struct GetPointResponse {
    #[serde(default)]
    pub(crate) result: Option<Value>,
}
