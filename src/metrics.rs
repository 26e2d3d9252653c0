use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing classification activity.
#[derive(Default)]
pub struct ClassificationMetrics {
    files_classified: AtomicU64,
    duplicates_detected: AtomicU64,
    requests_identified: AtomicU64,
    failures: AtomicU64,
}

impl ClassificationMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a file that went through the classifier and the number of requests found in it.
    pub fn record_classified(&self, request_count: u64) {
        self.files_classified.fetch_add(1, Ordering::Relaxed);
        self.requests_identified
            .fetch_add(request_count, Ordering::Relaxed);
    }

    /// Record a file short-circuited as a duplicate.
    pub fn record_duplicate(&self) {
        self.duplicates_detected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a file whose processing failed.
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            files_classified: self.files_classified.load(Ordering::Relaxed),
            duplicates_detected: self.duplicates_detected.load(Ordering::Relaxed),
            requests_identified: self.requests_identified.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of classification counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Files sent to the classifier since startup.
    pub files_classified: u64,
    /// Files rejected as duplicates of earlier content.
    pub duplicates_detected: u64,
    /// Total requests returned across all classified files.
    pub requests_identified: u64,
    /// Files that failed extraction, storage, or classification.
    pub failures: u64,
}
