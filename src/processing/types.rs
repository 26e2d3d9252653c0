//! Core data types and error definitions for the classification pipeline.

use crate::classification::ClassificationResult;
use crate::classifier::ClassifierError;
use crate::dedup::DuplicateStoreError;
use crate::extraction::ExtractionError;
use serde::Serialize;
use thiserror::Error;

/// Errors emitted while classifying a single file.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// File type detection or text extraction failed.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    /// Duplicate store could not be queried or updated.
    #[error("Duplicate check failed: {0}")]
    DuplicateStore(#[from] DuplicateStoreError),
    /// Language-model classification failed.
    #[error("Classification failed: {0}")]
    Classifier(#[from] ClassifierError),
    /// Background task running the pipeline did not complete.
    #[error("Processing task failed: {0}")]
    Task(String),
}

impl ClassifyError {
    /// Whether the failure stems from the uploaded file rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Extraction(_))
    }
}

/// Raw file received from a client.
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// Client-supplied file name, used for type detection.
    pub file_name: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl FileUpload {
    /// Bundle a file name with its contents.
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Per-file outcome in a bulk response.
///
/// Serializes as the plain result array on success, or `{"error": "..."}` on failure.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum BulkItem {
    /// File classified (or flagged as a duplicate).
    Classified(Vec<ClassificationResult>),
    /// File failed; other files in the batch are unaffected.
    Failed {
        /// Human-readable failure description.
        error: String,
    },
}

impl From<Result<Vec<ClassificationResult>, ClassifyError>> for BulkItem {
    fn from(outcome: Result<Vec<ClassificationResult>, ClassifyError>) -> Self {
        match outcome {
            Ok(results) => Self::Classified(results),
            Err(error) => Self::Failed {
                error: error.to_string(),
            },
        }
    }
}
