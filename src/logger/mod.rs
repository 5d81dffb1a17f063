//! Logger module
//!
//! Diagnostics use `tracing` with an `EnvFilter` built from `logging.level`
//! (`RUST_LOG` overrides it). Access logging keeps its own formats and sink.

mod format;
pub mod writer;

pub use format::{AccessLogEntry, Served};

use crate::config::Config;
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize diagnostics and the access log sink
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init()
        .map_err(std::io::Error::other)?;

    writer::init(config.logging.access_log_file.as_deref())
}

pub fn log_server_start(addr: &SocketAddr, config: &Config, manifest: &str) {
    info!(
        %addr,
        workers = ?config.server.workers,
        max_connections = ?config.performance.max_connections,
        "server listening on http://{addr}"
    );
    info!(
        root = %config.assets.root,
        fallback = %config.assets.fallback_document,
        reserved = ?config.assets.reserved_prefixes,
        "serving {manifest}"
    );
    if let Some(ref path) = config.logging.access_log_file {
        info!(path = %path, "access log file");
    }
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    writer::write_access(&entry.format(format));
}
