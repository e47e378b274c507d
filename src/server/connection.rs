// Connection handling module
// Accepts a single TCP connection and serves it on a local task

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::api;
use crate::config;
use crate::handler;
use crate::logger;

/// Which listener a connection arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerKind {
    /// Public site: bundle cascade plus host fallback
    Site,
    /// Bundle management API
    Admin,
}

impl fmt::Display for ListenerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Site => write!(f, "site"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

/// Accept and process a connection, checking limits and logging.
///
/// Only the site listener is subject to `max_connections`.
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<config::AppState>,
    conn_counter: &Arc<AtomicUsize>,
    kind: ListenerKind,
) {
    // Increment counter first, then check limit (prevents race condition)
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if kind == ListenerKind::Site {
        if let Some(max_conn) = state.config.performance.max_connections {
            if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
                // Exceeded limit: rollback counter and reject
                conn_counter.fetch_sub(1, Ordering::SeqCst);
                logger::log_warning(&format!(
                    "Max connections reached: {prev_count}/{max_conn}. Connection rejected."
                ));
                drop(stream);
                return;
            }
        }
    }

    if state.access_log_enabled() {
        logger::log_connection_accepted(&peer_addr);
    }

    handle_connection(
        stream,
        peer_addr,
        Arc::clone(state),
        Arc::clone(conn_counter),
        kind,
    );
}

/// Whole-connection time budget for a listener
///
/// Site connections get max(read_timeout, write_timeout); admin connections
/// carry archive uploads and get `admin.connection_timeout`.
pub fn connection_timeout(config: &config::Config, kind: ListenerKind) -> Duration {
    let secs = match kind {
        ListenerKind::Site => std::cmp::max(
            config.performance.read_timeout,
            config.performance.write_timeout,
        ),
        ListenerKind::Admin => config.admin.connection_timeout,
    };
    Duration::from_secs(secs)
}

/// Serve one connection in a spawned local task.
///
/// The connection is bounded by [`connection_timeout`]; the counter is
/// decremented when it ends.
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: Arc<config::AppState>,
    conn_counter: Arc<AtomicUsize>,
    kind: ListenerKind,
) {
    tokio::task::spawn_local(async move {
        let io = TokioIo::new(stream);

        let keep_alive = state.config.performance.keep_alive_timeout > 0;
        let timeout_duration = connection_timeout(&state.config, kind);

        let mut builder = http1::Builder::new();
        builder.keep_alive(keep_alive);

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let state = Arc::clone(&service_state);
                async move {
                    match kind {
                        ListenerKind::Site => handler::handle_request(req, state, peer_addr).await,
                        ListenerKind::Admin => api::handle_admin_request(req, state).await,
                    }
                }
            }),
        );

        match tokio::time::timeout(timeout_duration, conn).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => {
                logger::log_warning(&format!(
                    "Connection timeout after {} seconds on {kind} listener",
                    timeout_duration.as_secs(),
                ));
            }
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_connections_get_their_own_budget() {
        let mut cfg = config::Config::load_from("definitely/not/here").unwrap();
        cfg.performance.read_timeout = 30;
        cfg.performance.write_timeout = 45;
        cfg.admin.connection_timeout = 900;

        assert_eq!(connection_timeout(&cfg, ListenerKind::Site), Duration::from_secs(45));
        assert_eq!(connection_timeout(&cfg, ListenerKind::Admin), Duration::from_secs(900));
    }
}
