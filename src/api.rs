//! HTTP surface for the email classifier.
//!
//! This module exposes a compact Axum router:
//!
//! - `GET /` – Static info page.
//! - `POST /classify` – Classify one multipart file field named `file`.
//! - `POST /bulk_classify` – Classify every multipart field named `files`; one entry per file,
//!   either the result array or `{"error": "..."}`.
//! - `POST /update_config` – Replace the request-type taxonomy (`{"request_types": {...}}`).
//! - `GET /config` – Current taxonomy.
//! - `GET /metrics` – Classification counters.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools.

use crate::classification::ClassificationResult;
use crate::metrics::MetricsSnapshot;
use crate::processing::{BulkItem, ClassificationApi, ClassifyError, FileUpload};
use crate::taxonomy::{Taxonomy, TaxonomyError};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;

const INDEX_PAGE: &str = r#"<h1>Email Classifier API</h1>
<p>Classify email content and attachments (PDF, DOCX, EML, plain text) into request types.</p>
<p>Visit <a href="/commands">/commands</a> for the list of endpoints.</p>
"#;

/// Build the HTTP router exposing the classification API surface.
pub fn create_router<S>(service: Arc<S>, max_upload_bytes: usize) -> Router
where
    S: ClassificationApi + 'static,
{
    Router::new()
        .route("/", get(index))
        .route("/classify", post(classify::<S>))
        .route("/bulk_classify", post(bulk_classify::<S>))
        .route("/update_config", post(update_config::<S>))
        .route("/config", get(get_taxonomy::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(service)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

/// Classify a single uploaded file.
async fn classify<S>(
    State(service): State<Arc<S>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Vec<ClassificationResult>>, ApiError>
where
    S: ClassificationApi,
{
    let mut uploads = read_uploads(multipart, "file").await?;
    if uploads.is_empty() {
        return Err(ApiError::bad_request("No file uploaded"));
    }
    let upload = uploads.swap_remove(0);
    let file_name = upload.file_name.clone();
    let results = service.classify_file(upload).await?;
    tracing::info!(
        file = %file_name,
        requests = results.len(),
        "Classify request completed"
    );
    Ok(Json(results))
}

/// Classify several uploaded files concurrently.
async fn bulk_classify<S>(
    State(service): State<Arc<S>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Vec<BulkItem>>, ApiError>
where
    S: ClassificationApi,
{
    let uploads = read_uploads(multipart, "files").await?;
    if uploads.is_empty() {
        return Err(ApiError::bad_request("No files uploaded"));
    }
    let items = service.bulk_classify(uploads).await;
    tracing::info!(files = items.len(), "Bulk classify request completed");
    Ok(Json(items))
}

/// Replace the taxonomy with the submitted document.
async fn update_config<S>(
    State(service): State<Arc<S>>,
    body: Bytes,
) -> Result<Json<Value>, ApiError>
where
    S: ClassificationApi,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::bad_request("No configuration provided"));
    }
    let document: Value = serde_json::from_slice(&body)
        .map_err(|error| ApiError::bad_request(format!("Invalid JSON body: {error}")))?;
    let is_empty = match &document {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    };
    if is_empty {
        return Err(ApiError::bad_request("No configuration provided"));
    }

    let document = serde_yaml::to_value(&document)
        .map_err(|error| ApiError::bad_request(format!("Invalid configuration: {error}")))?;
    let taxonomy = Taxonomy::from_value(document)?;
    let updated = service.update_taxonomy(taxonomy).await?;
    tracing::info!(
        request_types = updated.request_types.len(),
        "Configuration updated"
    );
    Ok(Json(json!({ "message": "Configuration updated successfully" })))
}

/// Return the taxonomy currently used for classification.
async fn get_taxonomy<S>(State(service): State<Arc<S>>) -> Json<Taxonomy>
where
    S: ClassificationApi,
{
    Json(service.taxonomy().as_ref().clone())
}

/// Return a concise metrics snapshot.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: ClassificationApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "classify",
                method: "POST",
                path: "/classify",
                description: "Classify a single file (PDF, DOCX, EML, or plain text) sent as multipart field `file`. Returns an array of classifications.",
                request_example: None,
            },
            CommandDescriptor {
                name: "bulk_classify",
                method: "POST",
                path: "/bulk_classify",
                description: "Classify multiple files sent as repeated multipart field `files`. Returns one entry per file: a classification array or { \"error\": string }.",
                request_example: None,
            },
            CommandDescriptor {
                name: "update_config",
                method: "POST",
                path: "/update_config",
                description: "Replace the request-type taxonomy. `request_types` is required.",
                request_example: Some(json!({
                    "request_types": {
                        "Money Movement – Outbound": ["Timebound", "Recurring"],
                        "Account Maintenance": ["Update Details", "Close Account"]
                    }
                })),
            },
            CommandDescriptor {
                name: "config",
                method: "GET",
                path: "/config",
                description: "Return the request-type taxonomy currently in use.",
                request_example: None,
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return classification counters useful for observability dashboards.",
                request_example: None,
            },
            CommandDescriptor {
                name: "index",
                method: "GET",
                path: "/",
                description: "HTML info page pointing at this catalog.",
                request_example: None,
            },
            CommandDescriptor {
                name: "commands",
                method: "GET",
                path: "/commands",
                description: "This catalog of supported endpoints.",
                request_example: None,
            },
        ],
    })
}

async fn read_uploads(
    multipart: Result<Multipart, MultipartRejection>,
    field_name: &str,
) -> Result<Vec<FileUpload>, ApiError> {
    let mut multipart = multipart.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected non-multipart upload");
        ApiError::bad_request("Expected a multipart/form-data upload")
    })?;

    let mut uploads = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(field_name) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        uploads.push(FileUpload::new(file_name, bytes.to_vec()));
    }
    Ok(uploads)
}

fn multipart_error(error: MultipartError) -> ApiError {
    ApiError::new(error.status(), format!("Invalid multipart upload: {}", error.body_text()))
}

/// JSON error response `{"error": "..."}` with an HTTP status.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<ClassifyError> for ApiError {
    fn from(error: ClassifyError) -> Self {
        if error.is_client_error() {
            Self::bad_request(error.to_string())
        } else {
            Self::internal()
        }
    }
}

impl From<TaxonomyError> for ApiError {
    fn from(error: TaxonomyError) -> Self {
        if error.is_client_error() {
            Self::bad_request(error.to_string())
        } else {
            tracing::error!(error = %error, "Failed to update configuration");
            Self::new(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{create_router, get_commands};
    use crate::classification::{ClassificationResult, Priority};
    use crate::extraction::ExtractionError;
    use crate::metrics::MetricsSnapshot;
    use crate::processing::{BulkItem, ClassificationApi, ClassifyError, FileUpload};
    use crate::taxonomy::{RequestTypes, Taxonomy, TaxonomyError};
    use async_trait::async_trait;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use serde_json::{Map, Value, json};
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    const BOUNDARY: &str = "test-boundary";

    #[derive(Default)]
    struct StubService {
        uploads: Mutex<Vec<FileUpload>>,
        taxonomy_updates: Mutex<Vec<Taxonomy>>,
    }

    fn sample_result() -> ClassificationResult {
        ClassificationResult {
            request_type: "Money Movement – Outbound".into(),
            sub_request_type: "Timebound".into(),
            confidence_score: 0.95,
            decision_words: "process payment".into(),
            required_info: Map::new(),
            duplicate_flag: false,
            priority_flag: Priority::High,
        }
    }

    #[async_trait]
    impl ClassificationApi for StubService {
        async fn classify_file(
            &self,
            upload: FileUpload,
        ) -> Result<Vec<ClassificationResult>, ClassifyError> {
            let file_name = upload.file_name.clone();
            self.uploads.lock().await.push(upload);
            if file_name.ends_with(".png") {
                return Err(ExtractionError::UnsupportedFileType("image/png".into()).into());
            }
            if file_name.ends_with(".boom") {
                return Err(ClassifyError::Task("boom".into()));
            }
            Ok(vec![sample_result()])
        }

        async fn bulk_classify(&self, uploads: Vec<FileUpload>) -> Vec<BulkItem> {
            let mut items = Vec::new();
            for upload in uploads {
                items.push(BulkItem::from(self.classify_file(upload).await));
            }
            items
        }

        async fn update_taxonomy(
            &self,
            taxonomy: Taxonomy,
        ) -> Result<Arc<Taxonomy>, TaxonomyError> {
            self.taxonomy_updates.lock().await.push(taxonomy.clone());
            Ok(Arc::new(taxonomy))
        }

        fn taxonomy(&self) -> Arc<Taxonomy> {
            let mut request_types = RequestTypes::new();
            request_types.insert("Adjustment".into(), Vec::new());
            Arc::new(Taxonomy::new(request_types))
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot {
                files_classified: 3,
                ..MetricsSnapshot::default()
            }
        }
    }

    fn app(service: Arc<StubService>) -> Router {
        create_router(service, 1024 * 1024)
    }

    fn multipart_body(fields: &[(&str, &str, &str)]) -> Body {
        let mut body = String::new();
        for (name, file_name, contents) in fields {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n{contents}\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        Body::from(body)
    }

    fn multipart_request(uri: &str, fields: &[(&str, &str, &str)]) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(multipart_body(fields))
            .expect("request")
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&body).expect("json body")
    }

    #[tokio::test]
    async fn commands_catalog_lists_every_route() {
        let commands = get_commands().await.0.commands;
        let classify = commands
            .iter()
            .find(|cmd| cmd.name == "classify")
            .expect("classify command present");
        assert_eq!(classify.method, "POST");
        assert_eq!(classify.path, "/classify");
        for path in ["/", "/bulk_classify", "/update_config", "/config", "/metrics", "/commands"] {
            assert!(
                commands.iter().any(|cmd| cmd.path == path),
                "catalog is missing {path}"
            );
        }
    }

    #[tokio::test]
    async fn classify_returns_results_for_uploaded_file() {
        let service = Arc::new(StubService::default());
        let response = app(service.clone())
            .oneshot(multipart_request(
                "/classify",
                &[("file", "request.txt", "Please process payment")],
            ))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json[0]["Request Type"], "Money Movement – Outbound");
        assert_eq!(json[0]["Priority Flag"], "High");
        assert_eq!(json[0]["Duplicate Flag"], false);

        let uploads = service.uploads.lock().await;
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].file_name, "request.txt");
        assert_eq!(uploads[0].bytes, b"Please process payment".to_vec());
    }

    #[tokio::test]
    async fn classify_without_file_field_is_bad_request() {
        let service = Arc::new(StubService::default());
        let response = app(service)
            .oneshot(multipart_request(
                "/classify",
                &[("attachment", "request.txt", "hello")],
            ))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await, json!({ "error": "No file uploaded" }));
    }

    #[tokio::test]
    async fn classify_rejects_non_multipart_body() {
        let response = app(Arc::new(StubService::default()))
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/classify")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn classify_maps_errors_to_status_codes() {
        let service = Arc::new(StubService::default());

        let unsupported = app(service.clone())
            .oneshot(multipart_request("/classify", &[("file", "photo.png", "x")]))
            .await
            .expect("router response");
        assert_eq!(unsupported.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(unsupported).await["error"],
            "Unsupported file type: image/png"
        );

        let internal = app(service)
            .oneshot(multipart_request("/classify", &[("file", "mail.boom", "x")]))
            .await
            .expect("router response");
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(internal).await,
            json!({ "error": "Internal server error" })
        );
    }

    #[tokio::test]
    async fn bulk_classify_returns_entry_per_file_in_order() {
        let service = Arc::new(StubService::default());
        let response = app(service.clone())
            .oneshot(multipart_request(
                "/bulk_classify",
                &[
                    ("files", "a.txt", "first"),
                    ("files", "b.png", "second"),
                    ("files", "c.txt", "third"),
                ],
            ))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        let items = json.as_array().expect("array");
        assert_eq!(items.len(), 3);
        assert_eq!(items[0][0]["Sub Request Type"], "Timebound");
        assert_eq!(items[1]["error"], "Unsupported file type: image/png");
        assert!(items[2].is_array());
    }

    #[tokio::test]
    async fn bulk_classify_without_files_is_bad_request() {
        let response = app(Arc::new(StubService::default()))
            .oneshot(multipart_request("/bulk_classify", &[]))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "No files uploaded");
    }

    #[tokio::test]
    async fn update_config_validates_and_forwards_taxonomy() {
        let service = Arc::new(StubService::default());
        let payload = json!({
            "request_types": {
                "Money Movement – Outbound": ["Timebound", "Recurring"],
                "General Inquiry": null
            }
        });

        let response = app(service.clone())
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/update_config")
                    .header("content-type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({ "message": "Configuration updated successfully" })
        );
        let updates = service.taxonomy_updates.lock().await;
        assert_eq!(updates.len(), 1);
        assert!(updates[0].request_types["General Inquiry"].is_empty());
        assert_eq!(updates[0].request_types["Money Movement – Outbound"].len(), 2);
    }

    #[tokio::test]
    async fn update_config_rejects_bad_documents() {
        for body in ["", "{}", "not json", r#"{"other": 1}"#, r#"{"request_types": {}}"#] {
            let service = Arc::new(StubService::default());
            let response = app(service.clone())
                .oneshot(
                    Request::builder()
                        .method(Method::POST)
                        .uri("/update_config")
                        .header("content-type", "application/json")
                        .body(Body::from(body))
                        .expect("request"),
                )
                .await
                .expect("router response");

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
            assert!(json_body(response).await["error"].is_string());
            assert!(service.taxonomy_updates.lock().await.is_empty());
        }
    }

    #[tokio::test]
    async fn read_only_endpoints_respond() {
        let service = Arc::new(StubService::default());

        let index = app(service.clone())
            .oneshot(Request::get("/").body(Body::empty()).expect("request"))
            .await
            .expect("router response");
        assert_eq!(index.status(), StatusCode::OK);
        let html = to_bytes(index.into_body(), usize::MAX).await.expect("body");
        assert!(String::from_utf8_lossy(&html).contains("Email Classifier API"));

        let config = app(service.clone())
            .oneshot(Request::get("/config").body(Body::empty()).expect("request"))
            .await
            .expect("router response");
        assert_eq!(
            json_body(config).await,
            json!({ "request_types": { "Adjustment": [] } })
        );

        let metrics = app(service)
            .oneshot(Request::get("/metrics").body(Body::empty()).expect("request"))
            .await
            .expect("router response");
        assert_eq!(json_body(metrics).await["files_classified"], 3);
    }
}
