//! Server binary: settings, provider, engine, and HTTP surface wiring.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use foresight_llm::{OpenAiConfig, OpenAiProvider};
use foresight_runtime::Orchestrator;
use foresight_server::{AppState, metrics, routes};
use foresight_settings::load_settings_or_default;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "foresight-server", about = "Multi-agent foresight analysis engine")]
struct Args {
    /// Path to a JSON settings file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut settings = load_settings_or_default(args.config.as_deref());
    if let Some(host) = args.host {
        settings.server.host = host;
    }
    if let Some(port) = args.port {
        settings.server.port = port;
    }

    let metrics_handle = metrics::install_recorder();

    let provider = Arc::new(OpenAiProvider::new(OpenAiConfig {
        base_url: settings.provider.base_url.clone(),
        model: settings.provider.model.clone(),
        api_key: settings.provider.api_key.clone(),
    }));
    let orchestrator = Arc::new(Orchestrator::new(provider, &settings));

    let app = routes::router(AppState {
        orchestrator: Arc::clone(&orchestrator),
        metrics: metrics_handle,
    });

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, model = %settings.provider.model, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(orchestrator))
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

/// Resolve on Ctrl-C, cancelling in-flight workflows first.
async fn shutdown_signal(orchestrator: Arc<Orchestrator>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown signal received");
    orchestrator.shutdown();
}
