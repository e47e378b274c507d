// Server loop module
// Accepts connections until shutdown is requested

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

use super::connection::{accept_connection, ListenerKind};
use super::signal::SignalHandler;
use crate::config;
use crate::logger;

/// Accept loop shared by the site and admin listeners
///
/// Returns once the signal handler requests shutdown.
#[allow(clippy::ignored_unit_patterns)]
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<config::AppState>,
    active_connections: Arc<AtomicUsize>,
    kind: ListenerKind,
    signals: Arc<SignalHandler>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        if signals.shutdown_requested.load(Ordering::SeqCst) {
            break;
        }

        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections, kind);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection on {kind} listener: {e}"));
                    }
                }
            }

            _ = signals.shutdown.notified() => {
                break;
            }
        }
    }

    logger::log_info(&format!(
        "{kind} listener stopped with {} connection(s) in flight",
        active_connections.load(Ordering::SeqCst)
    ));
    Ok(())
}
