//! Classification records plus priority enforcement and merge of repeated requests.

pub mod reconcile;
pub mod types;

pub use reconcile::{
    DEFAULT_HIGH_PRIORITY_REQUEST_TYPES, enforce_priority, merge_duplicate_requests,
};
pub use types::{ClassificationResult, Priority};
