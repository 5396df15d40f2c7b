use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use authd_backend_lib::{config::Settings, metrics, router, store, AppState};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Credential and token service
#[derive(Debug, Parser)]
#[command(name = "authd", version)]
struct Args {
    /// Extra TOML config file layered over `authd.toml`
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured bind address
    #[arg(short, long)]
    bind: Option<SocketAddr>,
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.clone()));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if settings.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize configuration
    let mut config = match &args.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .context("loading configuration")?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }

    init_tracing(&config);

    // Metrics exporter on its own listener
    let metrics_task = if config.metrics.enabled {
        let handle = metrics::install_recorder();
        let metrics_addr = config.metrics.bind_addr;
        let listener = TcpListener::bind(&metrics_addr)
            .await
            .with_context(|| format!("binding metrics listener {metrics_addr}"))?;
        info!(%metrics_addr, "metrics listening");
        Some(tokio::spawn(metrics::serve_metrics(
            handle,
            listener,
            std::future::pending(),
        )))
    } else {
        None
    };

    // Create storage
    let store = store::open_store(&config.storage)
        .await
        .context("opening store")?;

    // Create application state
    let addr = config.bind_addr;
    let state = Arc::new(AppState::new(store, config).context("building auth service")?);

    let app = router::create_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(task) = metrics_task {
        task.abort();
    }

    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
