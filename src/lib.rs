#![deny(missing_docs)]

//! Core library for the email classifier service.

/// HTTP routing and REST handlers.
pub mod api;
/// Request classification data model and reconciliation rules.
pub mod classification;
/// Language-model classifier abstraction and adapters.
pub mod classifier;
/// Environment-driven configuration management.
pub mod config;
/// Content fingerprinting and duplicate stores.
pub mod dedup;
/// File type detection and text extraction.
pub mod extraction;
/// Structured logging and tracing setup.
pub mod logging;
/// Classification metrics helpers.
pub mod metrics;
/// File classification pipeline.
pub mod processing;
/// Qdrant integration backing the persistent duplicate store.
pub mod qdrant;
/// Request-type taxonomy loading and persistence.
pub mod taxonomy;
