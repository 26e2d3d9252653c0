//! Classification service coordinating extraction, duplicate detection, and the classifier.

use crate::{
    classification::{ClassificationResult, enforce_priority, merge_duplicate_requests},
    classifier::{Classifier, ClassifierError, get_classifier},
    config::get_config,
    dedup::{
        DuplicateStore, DuplicateStoreError, compute_content_hash, get_duplicate_store,
        normalize_content,
    },
    extraction::{detect_file_kind, extract_text},
    metrics::{ClassificationMetrics, MetricsSnapshot},
    processing::types::{BulkItem, ClassifyError, FileUpload},
    taxonomy::{Taxonomy, TaxonomyError, TaxonomyStore},
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while assembling the service at startup.
#[derive(Debug, Error)]
pub enum ServiceInitError {
    /// Taxonomy file could not be loaded.
    #[error("Failed to load taxonomy: {0}")]
    Taxonomy(#[from] TaxonomyError),
    /// Duplicate store could not be prepared.
    #[error("Failed to initialize duplicate store: {0}")]
    DuplicateStore(#[from] DuplicateStoreError),
    /// Classifier could not be constructed.
    #[error("Failed to initialize classifier: {0}")]
    Classifier(#[from] ClassifierError),
}

/// Runs the per-file pipeline: detect, extract, normalize, hash, dedupe, classify, reconcile.
///
/// The service is cheap to share; bulk requests clone the inner pipeline handle into one task
/// per file.
pub struct ClassificationService {
    pipeline: Arc<Pipeline>,
}

struct Pipeline {
    classifier: Box<dyn Classifier>,
    duplicates: Box<dyn DuplicateStore>,
    taxonomy: Arc<TaxonomyStore>,
    metrics: ClassificationMetrics,
}

/// Abstraction over the classification pipeline used by external surfaces (HTTP, CLI).
#[async_trait]
pub trait ClassificationApi: Send + Sync {
    /// Classify a single uploaded file.
    async fn classify_file(
        &self,
        upload: FileUpload,
    ) -> Result<Vec<ClassificationResult>, ClassifyError>;

    /// Classify many files concurrently, isolating failures per file.
    async fn bulk_classify(&self, uploads: Vec<FileUpload>) -> Vec<BulkItem>;

    /// Replace the request-type taxonomy.
    async fn update_taxonomy(&self, taxonomy: Taxonomy) -> Result<Arc<Taxonomy>, TaxonomyError>;

    /// Current request-type taxonomy.
    fn taxonomy(&self) -> Arc<Taxonomy>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl ClassificationService {
    /// Build the service from the global configuration.
    ///
    /// Loads the taxonomy file, prepares the duplicate store (creating the Qdrant collection
    /// when needed), and constructs the classifier client.
    pub async fn from_config() -> Result<Self, ServiceInitError> {
        let config = get_config();
        let taxonomy = Arc::new(TaxonomyStore::load(&config.taxonomy_path)?);
        tracing::info!("Initializing duplicate store");
        let duplicates = get_duplicate_store().await?;
        let classifier = get_classifier()?;
        tracing::info!("Classification service ready");
        Ok(Self::with_components(classifier, duplicates, taxonomy))
    }

    /// Assemble the service from explicit components.
    pub fn with_components(
        classifier: Box<dyn Classifier>,
        duplicates: Box<dyn DuplicateStore>,
        taxonomy: Arc<TaxonomyStore>,
    ) -> Self {
        Self {
            pipeline: Arc::new(Pipeline {
                classifier,
                duplicates,
                taxonomy,
                metrics: ClassificationMetrics::new(),
            }),
        }
    }

    /// Classify a single uploaded file.
    pub async fn classify_file(
        &self,
        upload: FileUpload,
    ) -> Result<Vec<ClassificationResult>, ClassifyError> {
        self.pipeline.process(upload).await
    }

    /// Classify many files with one task per file; results keep submission order.
    pub async fn bulk_classify(&self, uploads: Vec<FileUpload>) -> Vec<BulkItem> {
        tracing::info!(files = uploads.len(), "Bulk classification started");
        let handles: Vec<_> = uploads
            .into_iter()
            .map(|upload| {
                let pipeline = Arc::clone(&self.pipeline);
                tokio::spawn(async move { pipeline.process(upload).await })
            })
            .collect();

        let items: Vec<BulkItem> = futures_util::future::join_all(handles)
            .await
            .into_iter()
            .map(|joined| match joined {
                Ok(outcome) => BulkItem::from(outcome),
                Err(error) => {
                    self.pipeline.metrics.record_failure();
                    tracing::error!(error = %error, "Classification task aborted");
                    BulkItem::Failed {
                        error: ClassifyError::Task(error.to_string()).to_string(),
                    }
                }
            })
            .collect();

        let failed = items
            .iter()
            .filter(|item| matches!(item, BulkItem::Failed { .. }))
            .count();
        tracing::info!(files = items.len(), failed, "Bulk classification finished");
        items
    }

    /// Replace the taxonomy, persisting it to the configuration file.
    pub async fn update_taxonomy(
        &self,
        taxonomy: Taxonomy,
    ) -> Result<Arc<Taxonomy>, TaxonomyError> {
        self.pipeline.taxonomy.update(taxonomy).await
    }

    /// Current taxonomy snapshot.
    pub fn taxonomy(&self) -> Arc<Taxonomy> {
        self.pipeline.taxonomy.snapshot()
    }

    /// Return the current classification metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.pipeline.metrics.snapshot()
    }
}

impl Pipeline {
    async fn process(&self, upload: FileUpload) -> Result<Vec<ClassificationResult>, ClassifyError> {
        let file_name = upload.file_name.clone();
        match self.run(upload).await {
            Ok(results) => Ok(results),
            Err(error) => {
                self.metrics.record_failure();
                if error.is_client_error() {
                    tracing::warn!(file = %file_name, error = %error, "Rejected file");
                } else {
                    tracing::error!(file = %file_name, error = %error, "Error processing file");
                }
                Err(error)
            }
        }
    }

    async fn run(&self, upload: FileUpload) -> Result<Vec<ClassificationResult>, ClassifyError> {
        let FileUpload { file_name, bytes } = upload;
        let kind = detect_file_kind(&file_name)?;
        tracing::debug!(file = %file_name, kind = %kind, bytes = bytes.len(), "Processing file");

        let extracted = tokio::task::spawn_blocking(move || extract_text(kind, &bytes))
            .await
            .map_err(|error| ClassifyError::Task(format!("text extraction aborted: {error}")))?;
        let text = normalize_content(&extracted?);
        let content_hash = compute_content_hash(&text);
        let hash_prefix = &content_hash[..12];

        if self.duplicates.contains(&content_hash).await? {
            self.metrics.record_duplicate();
            tracing::info!(file = %file_name, hash = hash_prefix, "Duplicate content detected");
            return Ok(vec![ClassificationResult::duplicate()]);
        }
        self.duplicates.record(&content_hash).await?;

        let taxonomy = self.taxonomy.snapshot();
        let candidates = self
            .classifier
            .classify(&text, &taxonomy.request_types)
            .await?;
        let candidate_count = candidates.len();
        let results = merge_duplicate_requests(enforce_priority(
            candidates,
            &taxonomy.high_priority_types(),
        ));

        self.metrics.record_classified(results.len() as u64);
        tracing::info!(
            file = %file_name,
            kind = %kind,
            hash = hash_prefix,
            candidates = candidate_count,
            requests = results.len(),
            "File classified"
        );
        Ok(results)
    }
}

#[async_trait]
impl ClassificationApi for ClassificationService {
    async fn classify_file(
        &self,
        upload: FileUpload,
    ) -> Result<Vec<ClassificationResult>, ClassifyError> {
        ClassificationService::classify_file(self, upload).await
    }

    async fn bulk_classify(&self, uploads: Vec<FileUpload>) -> Vec<BulkItem> {
        ClassificationService::bulk_classify(self, uploads).await
    }

    async fn update_taxonomy(&self, taxonomy: Taxonomy) -> Result<Arc<Taxonomy>, TaxonomyError> {
        ClassificationService::update_taxonomy(self, taxonomy).await
    }

    fn taxonomy(&self) -> Arc<Taxonomy> {
        ClassificationService::taxonomy(self)
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        ClassificationService::metrics_snapshot(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::Priority;
    use crate::dedup::MemoryDuplicateStore;
    use crate::taxonomy::RequestTypes;
    use serde_json::Map;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedClassifier {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Classifier for ScriptedClassifier {
        async fn classify(
            &self,
            text: &str,
            _request_types: &RequestTypes,
        ) -> Result<Vec<ClassificationResult>, ClassifierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if text.contains("explode") {
                return Err(ClassifierError::RequestFailed("scripted failure".into()));
            }
            let entry = |request_type: &str, sub: &str, confidence: f64, words: &str| {
                ClassificationResult {
                    request_type: request_type.into(),
                    sub_request_type: sub.into(),
                    confidence_score: confidence,
                    decision_words: words.into(),
                    required_info: Map::new(),
                    duplicate_flag: false,
                    priority_flag: Priority::Low,
                }
            };
            Ok(vec![
                entry("Money Movement – Outbound", "Timebound", 0.7, "wire"),
                entry("Money Movement – Outbound", "Timebound", 0.9, "wire, today"),
                entry("Account Maintenance", "Update Details", 0.6, "address"),
            ])
        }
    }

    fn taxonomy_store() -> (Arc<TaxonomyStore>, PathBuf) {
        let path = std::env::temp_dir().join(format!(
            "email-classifier-service-{}.yml",
            uuid::Uuid::new_v4()
        ));
        std::fs::write(
            &path,
            "request_types:\n  \"Money Movement – Outbound\": [Timebound]\n  Account Maintenance: [Update Details]\n",
        )
        .expect("seed taxonomy");
        (Arc::new(TaxonomyStore::load(&path).expect("taxonomy")), path)
    }

    fn service() -> (ClassificationService, Arc<AtomicUsize>, PathBuf) {
        let calls = Arc::new(AtomicUsize::new(0));
        let (taxonomy, path) = taxonomy_store();
        let service = ClassificationService::with_components(
            Box::new(ScriptedClassifier {
                calls: Arc::clone(&calls),
            }),
            Box::new(MemoryDuplicateStore::new()),
            taxonomy,
        );
        (service, calls, path)
    }

    #[tokio::test]
    async fn classifies_enforces_priority_and_merges() {
        let (service, calls, path) = service();

        let results = service
            .classify_file(FileUpload::new("mail.txt", "Please wire funds today"))
            .await
            .expect("classification");

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].request_type, "Money Movement – Outbound");
        assert_eq!(results[0].priority_flag, Priority::High);
        assert_eq!(results[0].decision_words, "wire, today");
        assert!((results[0].confidence_score - 0.9).abs() < f64::EPSILON);
        assert_eq!(results[1].priority_flag, Priority::Low);
        assert_eq!(service.metrics_snapshot().files_classified, 1);

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn repeated_content_short_circuits_as_duplicate() {
        let (service, calls, path) = service();

        service
            .classify_file(FileUpload::new("first.txt", "Update my  address\nplease"))
            .await
            .expect("first pass");
        let second = service
            .classify_file(FileUpload::new("second.txt", "  Update my address please "))
            .await
            .expect("second pass");

        assert_eq!(second, vec![ClassificationResult::duplicate()]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(service.metrics_snapshot().duplicates_detected, 1);

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn unsupported_files_are_client_errors() {
        let (service, calls, path) = service();

        let error = service
            .classify_file(FileUpload::new("photo.png", vec![0_u8, 1, 2]))
            .await
            .expect_err("unsupported");

        assert!(error.is_client_error());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(service.metrics_snapshot().failures, 1);

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn malformed_pdf_is_a_client_error() {
        let (service, calls, path) = service();

        let error = service
            .classify_file(FileUpload::new("statement.pdf", b"not a pdf".to_vec()))
            .await
            .expect_err("malformed pdf");

        assert!(error.is_client_error());
        assert!(error.to_string().contains("invalid PDF"), "{error}");
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn bulk_isolates_failures_and_keeps_order() {
        let (service, _calls, path) = service();

        let items = service
            .bulk_classify(vec![
                FileUpload::new("a.txt", "wire the money"),
                FileUpload::new("b.zip", vec![1_u8]),
                FileUpload::new("c.txt", "please explode"),
                FileUpload::new("d.txt", "wire the   money"),
            ])
            .await;

        assert_eq!(items.len(), 4);
        assert!(matches!(&items[1], BulkItem::Failed { error } if error.contains("Unsupported")));
        assert!(
            matches!(&items[2], BulkItem::Failed { error } if error.contains("scripted failure"))
        );
        let classified: Vec<&Vec<ClassificationResult>> = [&items[0], &items[3]]
            .into_iter()
            .filter_map(|item| match item {
                BulkItem::Classified(results) => Some(results),
                BulkItem::Failed { .. } => None,
            })
            .collect();
        assert_eq!(classified.len(), 2);
        let duplicates = classified
            .iter()
            .filter(|results| results[0].duplicate_flag)
            .count();
        assert!(duplicates <= 1);

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn taxonomy_updates_flow_through_service() {
        let (service, _calls, path) = service();
        let mut request_types = RequestTypes::new();
        request_types.insert("Fee Payment".into(), vec!["Late Fee".into()]);

        service
            .update_taxonomy(Taxonomy::new(request_types))
            .await
            .expect("update");

        assert!(service.taxonomy().request_types.contains_key("Fee Payment"));
        std::fs::remove_file(path).ok();
    }
}
