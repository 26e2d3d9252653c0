//! Request-type taxonomy persisted as YAML.
//!
//! The file holds a required `request_types` mapping of category to sub-categories, an optional
//! `high_priority_request_types` list, and any other keys operators keep alongside them. Updates
//! replace the whole document, write it back to disk, and reload it.

use crate::classification::DEFAULT_HIGH_PRIORITY_REQUEST_TYPES;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

/// Mapping of request type to its sub request types.
pub type RequestTypes = BTreeMap<String, Vec<String>>;

/// Errors raised while loading or replacing the taxonomy.
#[derive(Debug, Error)]
pub enum TaxonomyError {
    /// Taxonomy file does not exist.
    #[error("Config file not found at: {0}")]
    NotFound(PathBuf),
    /// Reading or writing the taxonomy file failed.
    #[error("Failed to access config file {path}: {source}")]
    Io {
        /// File that could not be accessed.
        path: PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },
    /// File contents are not valid YAML for a taxonomy document.
    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    /// Document is structurally valid but unusable.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl TaxonomyError {
    /// Whether the error was caused by the submitted document rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Parse(_) | Self::Invalid(_))
    }
}

/// Taxonomy document as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Taxonomy {
    /// Categories and sub-categories offered to the classifier.
    #[serde(deserialize_with = "deserialize_request_types")]
    pub request_types: RequestTypes,
    /// Request types whose results are always `High` priority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_priority_request_types: Option<Vec<String>>,
    /// Unrecognized top-level keys, preserved across updates.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Taxonomy {
    /// Build a taxonomy with only request types and default priority rules.
    pub fn new(request_types: RequestTypes) -> Self {
        Self {
            request_types,
            high_priority_request_types: None,
            extra: BTreeMap::new(),
        }
    }

    /// Request types that force `High` priority.
    pub fn high_priority_types(&self) -> Vec<String> {
        match &self.high_priority_request_types {
            Some(types) => types.clone(),
            None => DEFAULT_HIGH_PRIORITY_REQUEST_TYPES
                .iter()
                .map(|value| value.to_string())
                .collect(),
        }
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml(source: &str) -> Result<Self, TaxonomyError> {
        let value: serde_yaml::Value = serde_yaml::from_str(source)?;
        Self::from_value(value)
    }

    /// Validate an arbitrary document (YAML or converted JSON) as a taxonomy.
    pub fn from_value(value: serde_yaml::Value) -> Result<Self, TaxonomyError> {
        let has_request_types = value
            .as_mapping()
            .is_some_and(|mapping| mapping.contains_key("request_types"));
        if !has_request_types {
            return Err(TaxonomyError::Invalid(
                "'request_types' key is required".into(),
            ));
        }
        let taxonomy: Taxonomy = serde_yaml::from_value(value)?;
        taxonomy.validate()?;
        Ok(taxonomy)
    }

    fn validate(&self) -> Result<(), TaxonomyError> {
        if self.request_types.is_empty() {
            return Err(TaxonomyError::Invalid(
                "'request_types' must contain at least one request type".into(),
            ));
        }
        if self
            .request_types
            .keys()
            .any(|request_type| request_type.trim().is_empty())
        {
            return Err(TaxonomyError::Invalid(
                "request type names must not be empty".into(),
            ));
        }
        Ok(())
    }
}

fn deserialize_request_types<'de, D>(deserializer: D) -> Result<RequestTypes, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: BTreeMap<String, Option<Vec<String>>> = BTreeMap::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(request_type, sub_types)| (request_type, sub_types.unwrap_or_default()))
        .collect())
}

/// Shared handle to the taxonomy file and its in-memory copy.
pub struct TaxonomyStore {
    path: PathBuf,
    current: RwLock<Arc<Taxonomy>>,
    // Serializes write + reload so overlapping updates never interleave on disk.
    update_lock: tokio::sync::Mutex<()>,
}

impl TaxonomyStore {
    /// Load the taxonomy stored at `path`.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, TaxonomyError> {
        let path = path.into();
        let taxonomy = read_taxonomy(&path)?;
        tracing::info!(
            path = %path.display(),
            request_types = taxonomy.request_types.len(),
            "Configuration loaded successfully"
        );
        Ok(Self {
            path,
            current: RwLock::new(Arc::new(taxonomy)),
            update_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Current taxonomy; cheap to clone and stable for the duration of one classification.
    pub fn snapshot(&self) -> Arc<Taxonomy> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&*guard),
            Err(poisoned) => Arc::clone(&*poisoned.into_inner()),
        }
    }

    /// Re-read the taxonomy from disk.
    pub async fn reload(&self) -> Result<Arc<Taxonomy>, TaxonomyError> {
        let source = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| read_error(&self.path, source))?;
        let taxonomy = Arc::new(Taxonomy::from_yaml(&source)?);
        self.replace(Arc::clone(&taxonomy));
        tracing::info!(
            path = %self.path.display(),
            request_types = taxonomy.request_types.len(),
            "Configuration reloaded successfully"
        );
        Ok(taxonomy)
    }

    /// Replace the taxonomy wholesale, persist it, and reload from disk.
    pub async fn update(&self, taxonomy: Taxonomy) -> Result<Arc<Taxonomy>, TaxonomyError> {
        taxonomy.validate()?;
        let yaml = serde_yaml::to_string(&taxonomy)?;
        let _guard = self.update_lock.lock().await;
        write_atomically(&self.path, yaml.as_bytes()).await?;
        self.reload().await
    }

    fn replace(&self, taxonomy: Arc<Taxonomy>) {
        match self.current.write() {
            Ok(mut guard) => *guard = taxonomy,
            Err(poisoned) => *poisoned.into_inner() = taxonomy,
        }
    }
}

fn read_taxonomy(path: &Path) -> Result<Taxonomy, TaxonomyError> {
    let source = std::fs::read_to_string(path).map_err(|source| read_error(path, source))?;
    Taxonomy::from_yaml(&source)
}

fn read_error(path: &Path, source: std::io::Error) -> TaxonomyError {
    if source.kind() == std::io::ErrorKind::NotFound {
        TaxonomyError::NotFound(path.to_path_buf())
    } else {
        TaxonomyError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

async fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), TaxonomyError> {
    let io_error = |source| TaxonomyError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(format!(".tmp.{}", uuid::Uuid::new_v4().simple()));
    let temp_path = PathBuf::from(temp_name);

    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)
        .await
        .map_err(io_error)?;
    let written: std::io::Result<()> = async {
        file.write_all(contents).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&temp_path, path).await
    }
    .await;
    if let Err(source) = written {
        tokio::fs::remove_file(&temp_path).await.ok();
        return Err(io_error(source));
    }
    tracing::debug!(path = %path.display(), bytes = contents.len(), "Taxonomy written");
    Ok(())
}
