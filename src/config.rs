use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_CLASSIFIER_MODEL: &str = "gpt-3.5-turbo-instruct";
const DEFAULT_CLASSIFIER_MAX_TOKENS: u32 = 500;
const DEFAULT_CLASSIFIER_TEMPERATURE: f32 = 0.3;
const DEFAULT_TAXONOMY_PATH: &str = "config.yml";
const DEFAULT_QDRANT_URL: &str = "http://127.0.0.1:6333";
const DEFAULT_QDRANT_COLLECTION: &str = "request_hashes";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the classifier server.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key sent as a bearer token to the completion endpoint.
    pub openai_api_key: String,
    /// Base URL of the OpenAI-compatible API (without the `/completions` suffix).
    pub openai_base_url: String,
    /// Completion model used for classification.
    pub classifier_model: String,
    /// Token budget for a single classification response.
    pub classifier_max_tokens: u32,
    /// Sampling temperature passed to the model.
    pub classifier_temperature: f32,
    /// Path of the YAML file holding the request-type taxonomy.
    pub taxonomy_path: PathBuf,
    /// Backend used to remember content hashes.
    pub duplicate_store: DuplicateStoreKind,
    /// Base URL of the Qdrant instance acting as the duplicate store.
    pub qdrant_url: String,
    /// Collection that stores content hashes.
    pub qdrant_collection_name: String,
    /// Optional API key required to access Qdrant.
    pub qdrant_api_key: Option<String>,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
    /// Maximum accepted request body size for uploads.
    pub max_upload_bytes: usize,
}

/// Supported duplicate-store backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DuplicateStoreKind {
    /// Hashes are kept in a Qdrant collection.
    Qdrant,
    /// Hashes are kept in process memory and lost on restart.
    Memory,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            openai_api_key: load_env("OPENAI_API_KEY")?,
            openai_base_url: load_env_optional("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            classifier_model: load_env_optional("CLASSIFIER_MODEL")
                .unwrap_or_else(|| DEFAULT_CLASSIFIER_MODEL.to_string()),
            classifier_max_tokens: parse_optional("CLASSIFIER_MAX_TOKENS")?
                .unwrap_or(DEFAULT_CLASSIFIER_MAX_TOKENS),
            classifier_temperature: parse_optional("CLASSIFIER_TEMPERATURE")?
                .unwrap_or(DEFAULT_CLASSIFIER_TEMPERATURE),
            taxonomy_path: load_env_optional("TAXONOMY_CONFIG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TAXONOMY_PATH)),
            duplicate_store: load_env_optional("DUPLICATE_STORE")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|()| ConfigError::InvalidValue("DUPLICATE_STORE".into()))
                })
                .transpose()?
                .unwrap_or(DuplicateStoreKind::Qdrant),
            qdrant_url: load_env_optional("QDRANT_URL")
                .unwrap_or_else(|| DEFAULT_QDRANT_URL.to_string()),
            qdrant_collection_name: load_env_optional("QDRANT_COLLECTION_NAME")
                .unwrap_or_else(|| DEFAULT_QDRANT_COLLECTION.to_string()),
            qdrant_api_key: load_env_optional("QDRANT_API_KEY"),
            server_port: parse_optional("SERVER_PORT")?,
            max_upload_bytes: parse_optional("MAX_UPLOAD_BYTES")?
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    load_env_optional(key).ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_optional<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

impl std::str::FromStr for DuplicateStoreKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "qdrant" => Ok(Self::Qdrant),
            "memory" => Ok(Self::Memory),
            _ => Err(()),
        }
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    init_config_with(|_| {});
}

/// Load configuration from the environment, apply command-line overrides, and install it.
pub fn init_config_with<F>(overrides: F)
where
    F: FnOnce(&mut Config),
{
    dotenvy::dotenv().ok();
    let mut config = Config::from_env().expect("Failed to load config from environment");
    overrides(&mut config);
    tracing::debug!(
        taxonomy_path = %config.taxonomy_path.display(),
        model = %config.classifier_model,
        duplicate_store = ?config.duplicate_store,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_store_kind_parses_case_insensitively() {
        assert_eq!(
            " Memory ".parse::<DuplicateStoreKind>(),
            Ok(DuplicateStoreKind::Memory)
        );
        assert_eq!(
            "QDRANT".parse::<DuplicateStoreKind>(),
            Ok(DuplicateStoreKind::Qdrant)
        );
        assert!("mongo".parse::<DuplicateStoreKind>().is_err());
    }
}
