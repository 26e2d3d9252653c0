//! Classification pipeline: extraction, fingerprinting, duplicate checks, and reconciliation.

mod service;
pub mod types;

pub use service::{ClassificationApi, ClassificationService, ServiceInitError};
pub use types::{BulkItem, ClassifyError, FileUpload};
