use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use clap::Parser;
use email_classifier::{
    config::{self, DuplicateStoreKind},
    logging,
    processing::{BulkItem, ClassificationService, FileUpload},
};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(
    name = "classify-dir",
    about = "Classify every file under a directory and print the results as JSON"
)]
struct Cli {
    /// Directory to walk recursively.
    #[arg(long)]
    dir: PathBuf,
    /// Taxonomy YAML file (overrides TAXONOMY_CONFIG_PATH).
    #[arg(long)]
    taxonomy: Option<PathBuf>,
    /// Keep duplicate hashes in memory for this run only.
    #[arg(long)]
    memory_store: bool,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    if !cli.dir.is_dir() {
        bail!("{} is not a directory", cli.dir.display());
    }

    config::init_config_with(|config| {
        if let Some(taxonomy) = cli.taxonomy.clone() {
            config.taxonomy_path = taxonomy;
        }
        if cli.memory_store {
            config.duplicate_store = DuplicateStoreKind::Memory;
        }
    });
    logging::init_tracing();

    let (paths, uploads) = collect_uploads(&cli.dir)?;
    tracing::info!(files = uploads.len(), dir = %cli.dir.display(), "Classifying directory");

    let service = ClassificationService::from_config()
        .await
        .context("failed to initialize classification service")?;
    let items = service.bulk_classify(uploads).await;

    let report: BTreeMap<String, BulkItem> = paths
        .into_iter()
        .map(|path| path.display().to_string())
        .zip(items)
        .collect();
    let rendered = serde_json::to_string_pretty(&report).context("failed to render report")?;
    println!("{rendered}");
    Ok(())
}

fn collect_uploads(dir: &Path) -> Result<(Vec<PathBuf>, Vec<FileUpload>)> {
    let mut paths = Vec::new();
    let mut uploads = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        let bytes =
            fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        uploads.push(FileUpload::new(file_name, bytes));
        paths.push(path);
    }
    Ok((paths, uploads))
}
