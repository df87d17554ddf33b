use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::serve;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::api::create_router;
use crate::AppState;

/// Serves the API on `listener` until `shutdown` resolves.
///
/// Once `shutdown` fires the service reports not-ready, stops accepting
/// connections and waits up to the configured grace period for in-flight
/// requests before returning.
pub async fn run<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let local_addr = listener
        .local_addr()
        .context("failed to read bound address")?;
    let grace = state.config.shutdown_grace();

    let pruning_task = state.limiter.start_pruning_task();
    let router = create_router(Arc::clone(&state));

    let drain_started = Arc::new(Notify::new());
    let drain_signal = Arc::clone(&drain_started);
    let shutdown_state = Arc::clone(&state);

    info!(%local_addr, "json-swap-http listening");

    let server = serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown.await;
        shutdown_state.begin_shutdown();
        info!("shutdown requested, draining in-flight requests");
        drain_signal.notify_one();
    })
    .into_future();

    let outcome = tokio::select! {
        result = server => result.context("server encountered an unrecoverable error"),
        _ = async {
            drain_started.notified().await;
            sleep(grace).await;
        } => {
            warn!(
                grace_secs = grace.as_secs(),
                "shutdown grace period elapsed, abandoning remaining connections"
            );
            Ok(())
        }
    };

    pruning_task.abort();
    outcome
}
