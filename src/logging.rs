//! Tracing setup shared by the HTTP server and the `classify-dir` binary.
//!
//! Pipeline events (file kind, hash prefix, request counts) go to stdout and are appended to a
//! log file: `EMAIL_CLASSIFIER_LOG_FILE` when set, `logs/email-classifier.log` otherwise.
//! `init_tracing` may be entered more than once (both binaries call it after config, and tests
//! may call it again); only the first call installs subscribers.
use std::{
    fs::OpenOptions,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_FILE_ENV: &str = "EMAIL_CLASSIFIER_LOG_FILE";
const DEFAULT_LOG_FILE: &str = "logs/email-classifier.log";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the stdout and file subscribers, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).compact());

    let file_layer = file_writer().map(|writer| {
        fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_ansi(false)
            .compact()
    });

    // `Option<Layer>` is itself a layer, so a missing file writer leaves stdout only.
    let _ = registry.with(file_layer).try_init();
}

fn log_file_path(configured: Option<String>) -> PathBuf {
    configured
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE))
}

fn file_writer() -> Option<NonBlocking> {
    if LOG_GUARD.get().is_some() {
        return None;
    }

    let path = log_file_path(std::env::var(LOG_FILE_ENV).ok());
    match open_append(&path) {
        Ok(file) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            let _ = LOG_GUARD.set(guard);
            Some(writer)
        }
        Err(err) => {
            eprintln!("Failed to open log file {}: {err}", path.display());
            None
        }
    }
}

fn open_append(path: &Path) -> std::io::Result<std::fs::File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
