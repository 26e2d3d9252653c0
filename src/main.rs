use anyhow::{Context, Result};
use clap::Parser;
use email_classifier::{api, config, logging, processing::ClassificationService};
use std::{path::PathBuf, sync::Arc};
use tokio::net::TcpListener;

const PORT_RANGE: std::ops::RangeInclusive<u16> = 7100..=7199;

#[derive(Parser)]
#[command(
    name = "email-classifier",
    about = "HTTP service classifying emails and attachments into request types"
)]
struct Args {
    /// Taxonomy YAML file (overrides TAXONOMY_CONFIG_PATH).
    #[arg(long)]
    taxonomy: Option<PathBuf>,
    /// Port to listen on (overrides SERVER_PORT).
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    config::init_config_with(|config| {
        if let Some(taxonomy) = args.taxonomy {
            config.taxonomy_path = taxonomy;
        }
        if args.port.is_some() {
            config.server_port = args.port;
        }
    });
    logging::init_tracing();

    let service = ClassificationService::from_config()
        .await
        .context("failed to initialize classification service")?;
    let app = api::create_router(Arc::new(service), config::get_config().max_upload_bytes);

    let (listener, port) = bind_listener().await.context("failed to bind listener")?;
    tracing::info!("Listening on http://0.0.0.0:{}", port);
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

async fn bind_listener() -> Result<(TcpListener, u16), std::io::Error> {
    use std::net::Ipv4Addr;

    let config = config::get_config();
    if let Some(port) = config.server_port {
        return TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
            .await
            .map(|listener| (listener, port));
    }

    for port in PORT_RANGE {
        match TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await {
            Ok(listener) => {
                tracing::debug!(port, "Bound server port");
                return Ok((listener, port));
            }
            Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
                tracing::debug!(port, "Port already in use; trying next");
                continue;
            }
            Err(err) => return Err(err),
        }
    }

    Err(std::io::Error::new(
        std::io::ErrorKind::AddrNotAvailable,
        format!(
            "No available port found in range {}-{}",
            PORT_RANGE.start(),
            PORT_RANGE.end()
        ),
    ))
}
