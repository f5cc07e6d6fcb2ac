//! WebSocket listener for the peer
//!
//! The peer dials in; every accepted socket becomes the active session of the
//! shared [`ConnectionManager`]. The server has an explicit lifecycle:
//! [`PeerServer::start`] binds and spawns, [`PeerServer::stop`] tears down.

use super::connection::ConnectionManager;
use crate::config::ServerConfig;
use crate::domain::{BridgeError, Result};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use warp::ws::{Message, WebSocket};
use warp::Filter;

const STOP_GRACE: Duration = Duration::from_secs(5);

/// Warp filter upgrading any request to a peer session
pub fn routes(
    manager: ConnectionManager,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::ws()
        .and(warp::any().map(move || manager.clone()))
        .map(|ws: warp::ws::Ws, manager: ConnectionManager| {
            ws.max_message_size(64 * 1024 * 1024)
                .on_upgrade(move |socket| handle_socket(socket, manager))
        })
}

/// Runs one peer session until the socket closes
pub async fn handle_socket(socket: WebSocket, manager: ConnectionManager) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (session, mut outbound) = manager.attach();

    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            if ws_tx.send(Message::text(frame)).await.is_err() {
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    while let Some(result) = ws_rx.next().await {
        match result {
            Ok(message) if message.is_close() => break,
            Ok(message) => match message.to_str() {
                Ok(text) => manager.handle_frame(text),
                Err(()) => {
                    if !message.is_ping() && !message.is_pong() {
                        tracing::warn!(
                            session = %session,
                            bytes = message.as_bytes().len(),
                            "Dropping non-text frame from peer"
                        );
                    }
                }
            },
            Err(e) => {
                tracing::warn!(session = %session, error = %e, "Peer socket error");
                break;
            }
        }
    }

    manager.detach(session);
    writer.abort();
}

/// A running peer listener
pub struct PeerServer {
    local_addr: SocketAddr,
    manager: ConnectionManager,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl PeerServer {
    /// Binds the listener and starts accepting peers
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub async fn start(config: &ServerConfig, manager: ConnectionManager) -> Result<Self> {
        let addr: SocketAddr = config.bind_address().parse().map_err(|e| {
            BridgeError::Configuration(format!(
                "Invalid listen address {}: {e}",
                config.bind_address()
            ))
        })?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (local_addr, server) = warp::serve(routes(manager.clone()))
            .try_bind_with_graceful_shutdown(addr, async move {
                let _ = shutdown_rx.await;
            })
            .map_err(|e| BridgeError::Io(format!("Failed to bind {addr}: {e}")))?;

        let task = tokio::spawn(server);
        tracing::info!(address = %local_addr, "Peer server listening");

        Ok(Self {
            local_addr,
            manager,
            shutdown: Some(shutdown_tx),
            task,
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Manager shared with the accepted sessions
    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    /// Stops listening, drops the session and fails every pending request
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        self.manager.shutdown();

        if tokio::time::timeout(STOP_GRACE, &mut self.task).await.is_err() {
            tracing::warn!("Peer server did not stop in time; aborting");
            self.task.abort();
        }
        tracing::info!(address = %self.local_addr, "Peer server stopped");
    }
}
