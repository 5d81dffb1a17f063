// Server module entry
// Accept loop, graceful shutdown and manifest reload

pub mod connection;
pub mod listener;
pub mod signal;

pub use listener::create_reusable_listener;
pub use signal::start_signal_handler;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::config::{AppState, Config};
use crate::error::ManifestError;
use crate::manifest;
use crate::router::AssetRouter;

const DRAIN_POLL: Duration = Duration::from_millis(50);

/// Build a router from the configured manifest and fallback policy
pub fn build_router(config: &Config) -> Result<AssetRouter, ManifestError> {
    let manifest = manifest::build(&config.assets)?;
    Ok(AssetRouter::new(manifest, config.fallback_policy()))
}

/// Rebuild the manifest off the runtime threads and swap it in.
///
/// On failure the previous router stays active.
pub async fn reload_router(state: &AppState) -> Result<(), ManifestError> {
    let config = state.config.clone();
    let router = tokio::task::spawn_blocking(move || build_router(&config)).await??;
    let description = router.manifest().describe();
    state.replace_router(router).await;
    info!("manifest reloaded: {description}");
    Ok(())
}

/// Accept connections until `shutdown` is notified, then drain.
///
/// Must run inside a `LocalSet`. After shutdown the listener is closed and
/// in-flight connections get up to `performance.shutdown_grace` seconds.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: Arc<Notify>,
) -> std::io::Result<()> {
    let active_connections = Arc::new(AtomicUsize::new(0));
    let local_addr = listener.local_addr()?;

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        connection::accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => error!(error = %e, "failed to accept connection"),
                }
            }

            () = shutdown.notified() => {
                info!(addr = %local_addr, "shutdown requested, closing listener");
                break;
            }
        }
    }

    drop(listener);
    let grace = Duration::from_secs(state.config.performance.shutdown_grace);
    drain(&active_connections, grace).await;
    Ok(())
}

/// Wait for in-flight connections to finish, up to `grace`
async fn drain(active_connections: &AtomicUsize, grace: Duration) {
    let deadline = Instant::now() + grace;
    loop {
        let remaining = active_connections.load(Ordering::SeqCst);
        if remaining == 0 {
            info!("all connections drained");
            return;
        }
        if Instant::now() >= deadline {
            warn!(
                remaining,
                grace_secs = grace.as_secs(),
                "shutdown grace period elapsed, abandoning connections"
            );
            return;
        }
        tokio::time::sleep(DRAIN_POLL).await;
    }
}
