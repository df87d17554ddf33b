use std::sync::Arc;

use anyhow::{Context, Result};
use json_swap_http::{server, AppState, SwapConfig};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = SwapConfig::from_env().context("failed to load configuration")?;
    init_tracing(&config);

    info!(
        source_token = %config.source_token,
        target_token = %config.target_token,
        max_replacements = config.max_replacements,
        max_depth = config.max_depth,
        "json-swap-http starting"
    );

    let listen_addr = config.listen_addr();
    let state = Arc::new(AppState::new(config).context("failed to build service state")?);

    let listener = TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("failed to bind {listen_addr}"))?;

    server::run(listener, state, shutdown_signal()).await?;

    info!("json-swap-http shutdown complete");
    Ok(())
}

fn init_tracing(config: &SwapConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
