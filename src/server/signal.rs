// Signal handling module
//
// - SIGTERM / SIGINT: graceful shutdown
// - SIGHUP:           rebuild the asset manifest from disk

use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{error, info};

use crate::config::AppState;

/// Start signal handlers (Unix)
///
/// Registration happens before the task is spawned so failures surface to
/// the caller. Must be called from inside a `LocalSet`.
#[cfg(unix)]
pub fn start_signal_handler(state: Arc<AppState>, shutdown: Arc<Notify>) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!(pid = std::process::id(), "signal handlers registered (HUP: reload assets, TERM/INT: shutdown)");

    tokio::task::spawn_local(async move {
        loop {
            tokio::select! {
                _ = sighup.recv() => {
                    info!("SIGHUP received, reloading asset manifest");
                    if let Err(e) = super::reload_router(&state).await {
                        error!(error = %e, "manifest reload failed, keeping previous assets");
                    }
                }
                _ = sigterm.recv() => {
                    info!("SIGTERM received, shutting down");
                    shutdown.notify_one();
                    break;
                }
                _ = sigint.recv() => {
                    info!("SIGINT received, shutting down");
                    shutdown.notify_one();
                    break;
                }
            }
        }
    });
    Ok(())
}

/// Non-Unix fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub fn start_signal_handler(_state: Arc<AppState>, shutdown: Arc<Notify>) -> std::io::Result<()> {
    tokio::task::spawn_local(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl+C received, shutting down");
            shutdown.notify_one();
        }
    });
    Ok(())
}
