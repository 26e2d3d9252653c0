//! OpenAI-compatible completions client.

use super::{Classifier, ClassifierError, prompt::build_prompt, response::parse_model_output};
use crate::classification::ClassificationResult;
use crate::config::Config;
use crate::taxonomy::RequestTypes;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

/// Settings for [`OpenAiClassifier`].
#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    /// API root, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// Bearer token.
    pub api_key: String,
    /// Completion model identifier.
    pub model: String,
    /// Response token budget.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

impl OpenAiSettings {
    /// Extract classifier settings from the runtime configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.openai_base_url.clone(),
            api_key: config.openai_api_key.clone(),
            model: config.classifier_model.clone(),
            max_tokens: config.classifier_max_tokens,
            temperature: config.classifier_temperature,
        }
    }
}

/// Classifier that sends one completion request per document.
pub struct OpenAiClassifier {
    http: Client,
    settings: OpenAiSettings,
}

impl OpenAiClassifier {
    /// Build a classifier with its own HTTP client.
    pub fn new(settings: OpenAiSettings) -> Result<Self, ClassifierError> {
        let http = Client::builder()
            .user_agent("email-classifier/0.1")
            .build()
            .map_err(|error| {
                ClassifierError::ProviderUnavailable(format!("failed to build HTTP client: {error}"))
            })?;
        Ok(Self { http, settings })
    }

    fn endpoint(&self) -> String {
        format!("{}/completions", self.settings.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl Classifier for OpenAiClassifier {
    async fn classify(
        &self,
        text: &str,
        request_types: &RequestTypes,
    ) -> Result<Vec<ClassificationResult>, ClassifierError> {
        let payload = json!({
            "model": self.settings.model,
            "prompt": build_prompt(text, request_types),
            "max_tokens": self.settings.max_tokens,
            "temperature": self.settings.temperature,
        });

        tracing::debug!(
            model = %self.settings.model,
            chars = text.len(),
            request_types = request_types.len(),
            "Requesting classification"
        );

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.settings.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                ClassifierError::ProviderUnavailable(format!(
                    "failed to reach {}: {error}",
                    self.endpoint()
                ))
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ClassifierError::ProviderUnavailable(format!(
                "completion endpoint {} returned 404",
                self.endpoint()
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, "Classification request failed");
            return Err(ClassifierError::RequestFailed(format!(
                "completion API returned {status}: {body}"
            )));
        }

        let body: CompletionResponse = response.json().await.map_err(|error| {
            ClassifierError::InvalidResponse(format!("failed to decode completion response: {error}"))
        })?;

        let Some(choice) = body.choices.into_iter().next() else {
            tracing::warn!("Completion response contained no choices");
            return Ok(Vec::new());
        };

        let results = parse_model_output(&choice.text);
        tracing::debug!(classifications = results.len(), "Classification received");
        Ok(results)
    }
}
