// Connection handling module
// Accepts TCP connections under the configured limit and serves them over HTTP/1.1

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::config::AppState;
use crate::handler;

/// Accept and process a connection, enforcing `max_connections`.
///
/// Returns false when the connection was rejected.
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
) -> bool {
    // Increment counter first, then check limit (prevents race condition)
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            // Exceeded limit: rollback counter and reject
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            warn!(%peer_addr, active = prev_count, max_conn, "max connections reached, connection rejected");
            drop(stream);
            return false;
        }
    }

    debug!(%peer_addr, "connection accepted");
    if let Err(e) = stream.set_nodelay(true) {
        debug!(%peer_addr, error = %e, "failed to set TCP_NODELAY");
    }

    handle_connection(stream, peer_addr, Arc::clone(state), Arc::clone(conn_counter));
    true
}

/// Serve a single connection in a local task.
///
/// The whole connection is bounded by `max(read_timeout, write_timeout)`;
/// the counter is decremented when the task finishes.
fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    conn_counter: Arc<AtomicUsize>,
) {
    tokio::task::spawn_local(async move {
        let io = TokioIo::new(stream);

        let perf = &state.config.performance;
        let timeout_duration = Duration::from_secs(perf.read_timeout.max(perf.write_timeout));

        let mut builder = http1::Builder::new();
        builder
            .keep_alive(perf.keep_alive_timeout > 0)
            .timer(TokioTimer::new());
        if perf.read_timeout > 0 {
            builder.header_read_timeout(Duration::from_secs(perf.read_timeout));
        }

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                handler::handle_request(req, Arc::clone(&service_state), peer_addr)
            }),
        );

        match tokio::time::timeout(timeout_duration, conn).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => debug!(%peer_addr, error = %err, "connection closed with error"),
            Err(_) => {
                debug!(
                    %peer_addr,
                    secs = timeout_duration.as_secs(),
                    "connection timed out"
                );
            }
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}
