//! Language-model classification of extracted text.
//!
//! The classifier turns the taxonomy into a prompt, sends a single completion request, and
//! decodes the answer leniently: unparsable output means "no requests found", while transport
//! failures and error statuses are surfaced to the caller.

mod openai;
pub mod prompt;
pub mod response;

pub use openai::{OpenAiClassifier, OpenAiSettings};
pub use prompt::build_prompt;
pub use response::parse_model_output;

use crate::classification::ClassificationResult;
use crate::config::get_config;
use crate::taxonomy::RequestTypes;
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by classification providers.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// Provider could not be reached or is misconfigured.
    #[error("Classification provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider returned an error response.
    #[error("Classification request failed: {0}")]
    RequestFailed(String),
    /// Provider response envelope could not be decoded.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Interface implemented by classification backends.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Identify every request in `text` using the supplied taxonomy.
    async fn classify(
        &self,
        text: &str,
        request_types: &RequestTypes,
    ) -> Result<Vec<ClassificationResult>, ClassifierError>;
}

/// Build the classifier described by the runtime configuration.
pub fn get_classifier() -> Result<Box<dyn Classifier>, ClassifierError> {
    let settings = OpenAiSettings::from_config(get_config());
    tracing::info!(model = %settings.model, base_url = %settings.base_url, "Initializing classifier");
    Ok(Box::new(OpenAiClassifier::new(settings)?))
}
