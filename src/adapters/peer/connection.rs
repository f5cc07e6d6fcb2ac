//! Connection manager
//!
//! Owns the single active peer session. A newly attached session supersedes
//! the previous one. Inbound frames are classified and routed to the
//! correlation registry or the progress channel.

use super::protocol::{parse_frame, AtomicProgress, Inbound, OutboundRequest, PeerReply};
use super::registry::{Completion, CorrelationRegistry, Deadline};
use crate::config::ServerConfig;
use crate::domain::{PeerError, RequestId, SessionId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

const PROGRESS_CAPACITY: usize = 64;

struct ActiveSession {
    id: SessionId,
    outbound: mpsc::UnboundedSender<String>,
}

struct ManagerInner {
    registry: CorrelationRegistry,
    active: Mutex<Option<ActiveSession>>,
    next_session: AtomicU64,
    connected: watch::Sender<bool>,
    progress: broadcast::Sender<AtomicProgress>,
    fail_pending_on_disconnect: bool,
}

/// Handle to the peer connection; cheap to clone
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<ManagerInner>,
}

impl ConnectionManager {
    /// Creates a manager with no attached peer
    ///
    /// # Arguments
    ///
    /// * `request_timeout` - Default registry window
    /// * `fail_pending_on_disconnect` - Fail a session's pending requests as
    ///   soon as it ends instead of letting them run into their timeouts
    pub fn new(request_timeout: Duration, fail_pending_on_disconnect: bool) -> Self {
        let (connected, _) = watch::channel(false);
        let (progress, _) = broadcast::channel(PROGRESS_CAPACITY);
        Self {
            inner: Arc::new(ManagerInner {
                registry: CorrelationRegistry::new(request_timeout),
                active: Mutex::new(None),
                next_session: AtomicU64::new(1),
                connected,
                progress,
                fail_pending_on_disconnect,
            }),
        }
    }

    /// Creates a manager from the `[server]` section
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            Duration::from_secs(config.request_timeout_secs),
            config.fail_pending_on_disconnect,
        )
    }

    fn active(&self) -> MutexGuard<'_, Option<ActiveSession>> {
        self.inner
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The registry backing this manager
    pub fn registry(&self) -> &CorrelationRegistry {
        &self.inner.registry
    }

    /// Attaches a new peer session
    ///
    /// Returns the session id and the queue of encoded frames the transport
    /// must write to the socket.
    pub fn attach(&self) -> (SessionId, mpsc::UnboundedReceiver<String>) {
        let id = SessionId::new(self.inner.next_session.fetch_add(1, Ordering::SeqCst));
        let (outbound, rx) = mpsc::unbounded_channel();

        let previous = self.active().replace(ActiveSession { id, outbound });
        self.inner.connected.send_replace(true);

        crate::log_session_event!(id, "attached");
        if let Some(previous) = previous {
            tracing::info!(session = %previous.id, superseded_by = %id, "Peer session superseded");
            self.end_session(previous.id, "superseded by a new connection");
        }

        (id, rx)
    }

    /// Detaches `session` after its socket closed
    ///
    /// A no-op for sessions that were already superseded.
    pub fn detach(&self, session: SessionId) {
        let removed = {
            let mut active = self.active();
            match active.as_ref() {
                Some(current) if current.id == session => active.take(),
                _ => None,
            }
        };

        if removed.is_some() {
            self.inner.connected.send_replace(false);
            crate::log_session_event!(session, "detached");
            self.end_session(session, "peer disconnected");
        }
    }

    fn end_session(&self, session: SessionId, reason: &str) {
        if !self.inner.fail_pending_on_disconnect {
            tracing::debug!(
                session = %session,
                pending = self.inner.registry.pending_count(),
                "Pending requests left to their timeouts"
            );
            return;
        }
        let failed = self.inner.registry.fail_session(session, reason);
        if failed > 0 {
            tracing::warn!(session = %session, failed, reason, "Failed pending requests of closed session");
        }
    }

    /// Drops the active session and fails everything still pending
    pub fn shutdown(&self) {
        let removed = self.active().take();
        self.inner.connected.send_replace(false);
        if let Some(session) = removed {
            tracing::info!(session = %session.id, "Peer session closed by shutdown");
        }
        self.inner.registry.fail_all("server stopped");
    }

    /// Whether a peer session is active
    pub fn is_connected(&self) -> bool {
        self.active().is_some()
    }

    /// Waits until a peer is attached, up to `timeout`
    pub async fn wait_for_peer(&self, timeout: Duration) -> bool {
        let mut connected = self.inner.connected.subscribe();
        tokio::time::timeout(timeout, connected.wait_for(|up| *up))
            .await
            .map(|r| r.is_ok())
            .unwrap_or(false)
    }

    /// Subscribes to atomic progress notifications
    pub fn subscribe_progress(&self) -> broadcast::Receiver<AtomicProgress> {
        self.inner.progress.subscribe()
    }

    /// Routes one inbound text frame
    ///
    /// Malformed frames are logged and dropped.
    pub fn handle_frame(&self, text: &str) {
        let inbound = match parse_frame(text) {
            Ok(inbound) => inbound,
            Err(e) => {
                tracing::warn!(error = %e, frame = text, "Dropping malformed frame");
                return;
            }
        };

        match inbound {
            Inbound::Reply { id, result } => {
                if !self.inner.registry.complete(id, result) {
                    tracing::debug!(request_id = %id, "Reply for a request no longer pending");
                }
            }
            Inbound::Progress(progress) => {
                tracing::info!(
                    request_id = progress.id,
                    step = %progress.step,
                    current = progress.current,
                    total = progress.total,
                    message = %progress.message,
                    "Atomic progress"
                );
                let _ = self.inner.progress.send(progress);
            }
            Inbound::Unhandled { tag } => {
                tracing::debug!(tag = tag.as_deref().unwrap_or("<none>"), "Unhandled frame");
            }
        }
    }

    /// Stamps and sends a request
    ///
    /// With a handler, the handler fires exactly once: with the reply, with a
    /// timeout, or immediately with [`PeerError::NotConnected`] when no peer
    /// is attached. Returns the id the request was sent under.
    pub fn dispatch(
        &self,
        request: &OutboundRequest,
        handler: Option<Completion>,
        deadline: Deadline,
    ) -> Option<RequestId> {
        let tag = request.tag();
        let active = self.active();
        let session = match active.as_ref() {
            Some(session) => session,
            None => {
                drop(active);
                tracing::warn!(tag, "Peer not connected; request not sent");
                if let Some(handler) = handler {
                    handler(Err(PeerError::NotConnected));
                }
                return None;
            }
        };

        let id = self.inner.registry.next_id();
        let frame = match request.encode(Some(id)) {
            Ok(frame) => frame,
            Err(e) => {
                drop(active);
                tracing::error!(tag, error = %e, "Failed to encode request");
                if let Some(handler) = handler {
                    handler(Err(e));
                }
                return None;
            }
        };

        let session_id = session.id;
        if let Some(handler) = handler {
            self.inner
                .registry
                .register(id, tag, Some(session_id), handler, deadline);
        }

        if session.outbound.send(frame).is_err() {
            drop(active);
            tracing::warn!(tag, request_id = %id, "Session writer closed before send");
            self.inner.registry.complete(
                id,
                Err(PeerError::ConnectionLost("session writer closed".to_string())),
            );
            return None;
        }

        tracing::debug!(tag, request_id = %id, session = %session_id, "Request sent");
        Some(id)
    }

    /// Sends a request and waits for its reply
    pub async fn request(
        &self,
        request: &OutboundRequest,
        deadline: Deadline,
    ) -> Result<PeerReply, PeerError> {
        let (tx, rx) = oneshot::channel();
        let handler: Completion = Box::new(move |result| {
            let _ = tx.send(result);
        });
        self.dispatch(request, Some(handler), deadline);
        rx.await
            .unwrap_or_else(|_| Err(PeerError::ConnectionLost("completion dropped".to_string())))
    }

    /// Sends a frame without an id or handler
    pub fn notify(&self, request: &OutboundRequest) -> Result<(), PeerError> {
        let frame = request.encode(None)?;
        let active = self.active();
        let session = active.as_ref().ok_or(PeerError::NotConnected)?;
        session
            .outbound
            .send(frame)
            .map_err(|_| PeerError::ConnectionLost("session writer closed".to_string()))
    }
}
