//! Correlation registry
//!
//! Holds the completion handler of every in-flight request, keyed by request
//! id, and races each one against its own timeout watcher. Whichever side
//! removes the entry first fires the handler; the other finds nothing and
//! does nothing.

use super::protocol::PeerReply;
use crate::domain::{PeerError, RequestId, SessionId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;

/// Completion handler; receives exactly one reply or error
pub type Completion = Box<dyn FnOnce(Result<PeerReply, PeerError>) + Send + 'static>;

/// Timeout window for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Deadline {
    /// The registry's configured default window
    #[default]
    Default,
    /// A request-specific window
    Custom(Duration),
    /// No watcher; the handler waits for a reply, a disconnect or shutdown
    None,
}

struct Pending {
    tag: &'static str,
    session: Option<SessionId>,
    created: Instant,
    handler: Completion,
    watcher: Option<JoinHandle<()>>,
}

#[derive(Default)]
struct RegistryState {
    pending: HashMap<RequestId, Pending>,
    last_id: u64,
}

/// Pending-request map with per-request timeouts
#[derive(Clone)]
pub struct CorrelationRegistry {
    state: Arc<Mutex<RegistryState>>,
    default_timeout: Duration,
}

impl CorrelationRegistry {
    /// Creates an empty registry with the given default window
    pub fn new(default_timeout: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(RegistryState::default())),
            default_timeout,
        }
    }

    /// Default timeout window
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Allocates a fresh request id
    ///
    /// Ids derive from wall-clock milliseconds but never repeat or go
    /// backwards, even for several requests in the same millisecond.
    pub fn next_id(&self) -> RequestId {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let mut state = self.lock();
        let id = now.max(state.last_id + 1);
        state.last_id = id;
        RequestId::new(id)
    }

    /// Registers a handler under `id` and starts its timeout watcher
    ///
    /// Must be called from within a tokio runtime when a watcher is needed.
    pub fn register(
        &self,
        id: RequestId,
        tag: &'static str,
        session: Option<SessionId>,
        handler: Completion,
        deadline: Deadline,
    ) {
        let window = match deadline {
            Deadline::Default => Some(self.default_timeout),
            Deadline::Custom(window) => Some(window),
            Deadline::None => None,
        };

        let mut state = self.lock();
        let watcher = window.map(|window| self.spawn_watcher(id, window));
        state.pending.insert(
            id,
            Pending {
                tag,
                session,
                created: Instant::now(),
                handler,
                watcher,
            },
        );
    }

    fn spawn_watcher(&self, id: RequestId, window: Duration) -> JoinHandle<()> {
        let state: Weak<Mutex<RegistryState>> = Arc::downgrade(&self.state);
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let Some(state) = state.upgrade() else {
                return;
            };
            let entry = state
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .pending
                .remove(&id);
            if let Some(entry) = entry {
                tracing::warn!(
                    request_id = %id,
                    tag = entry.tag,
                    waited_ms = entry.created.elapsed().as_millis() as u64,
                    "Request timed out"
                );
                (entry.handler)(Err(PeerError::Timeout(entry.tag.to_string())));
            }
        })
    }

    /// Settles `id` with a real response
    ///
    /// Returns `false` when nothing was pending under `id` (already timed out,
    /// already answered, or never registered).
    pub fn complete(&self, id: RequestId, result: Result<PeerReply, PeerError>) -> bool {
        let entry = self.lock().pending.remove(&id);
        match entry {
            Some(entry) => {
                if let Some(watcher) = entry.watcher {
                    watcher.abort();
                }
                tracing::debug!(
                    request_id = %id,
                    tag = entry.tag,
                    elapsed_ms = entry.created.elapsed().as_millis() as u64,
                    ok = result.is_ok(),
                    "Request settled"
                );
                (entry.handler)(result);
                true
            }
            None => false,
        }
    }

    /// Fails every request sent on `session`
    pub fn fail_session(&self, session: SessionId, reason: &str) -> usize {
        let drained: Vec<(RequestId, Pending)> = {
            let mut state = self.lock();
            let ids: Vec<RequestId> = state
                .pending
                .iter()
                .filter(|(_, p)| p.session == Some(session))
                .map(|(id, _)| *id)
                .collect();
            ids.into_iter()
                .filter_map(|id| state.pending.remove(&id).map(|p| (id, p)))
                .collect()
        };
        Self::fail_entries(drained, reason)
    }

    /// Fails every pending request
    pub fn fail_all(&self, reason: &str) -> usize {
        let drained: Vec<(RequestId, Pending)> = self.lock().pending.drain().collect();
        Self::fail_entries(drained, reason)
    }

    fn fail_entries(entries: Vec<(RequestId, Pending)>, reason: &str) -> usize {
        let count = entries.len();
        for (id, entry) in entries {
            if let Some(watcher) = entry.watcher {
                watcher.abort();
            }
            tracing::debug!(request_id = %id, tag = entry.tag, reason, "Failing pending request");
            (entry.handler)(Err(PeerError::ConnectionLost(reason.to_string())));
        }
        count
    }

    /// Number of requests still waiting
    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    /// Whether `id` is still waiting
    pub fn is_pending(&self, id: RequestId) -> bool {
        self.lock().pending.contains_key(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_handler(
        calls: Arc<AtomicUsize>,
        last: Arc<Mutex<Option<Result<PeerReply, PeerError>>>>,
    ) -> Completion {
        Box::new(move |result| {
            calls.fetch_add(1, Ordering::SeqCst);
            *last.lock().unwrap() = Some(result);
        })
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let registry = CorrelationRegistry::new(Duration::from_secs(10));
        let ids: Vec<RequestId> = (0..1000).map(|_| registry.next_id()).collect();
        for pair in ids.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[tokio::test]
    async fn test_complete_fires_once() {
        let registry = CorrelationRegistry::new(Duration::from_secs(10));
        let calls = Arc::new(AtomicUsize::new(0));
        let last = Arc::new(Mutex::new(None));
        let id = registry.next_id();

        registry.register(
            id,
            "get_layers",
            None,
            counting_handler(calls.clone(), last.clone()),
            Deadline::Default,
        );
        assert_eq!(registry.pending_count(), 1);

        assert!(registry.complete(id, Ok(PeerReply::Ack(json!({})))));
        assert!(!registry.complete(id, Ok(PeerReply::Ack(json!({})))));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(registry.pending_count(), 0);
        assert!(matches!(*last.lock().unwrap(), Some(Ok(PeerReply::Ack(_)))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fires_once_and_late_reply_is_ignored() {
        let registry = CorrelationRegistry::new(Duration::from_secs(10));
        let calls = Arc::new(AtomicUsize::new(0));
        let last = Arc::new(Mutex::new(None));
        let id = registry.next_id();

        registry.register(
            id,
            "get_layers",
            None,
            counting_handler(calls.clone(), last.clone()),
            Deadline::Default,
        );

        tokio::time::sleep(Duration::from_secs(11)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            *last.lock().unwrap(),
            Some(Err(PeerError::Timeout("get_layers".to_string())))
        );
        assert!(!registry.complete(id, Ok(PeerReply::Ack(json!({})))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_deadline_outlives_default() {
        let registry = CorrelationRegistry::new(Duration::from_secs(10));
        let calls = Arc::new(AtomicUsize::new(0));
        let last = Arc::new(Mutex::new(None));
        let id = registry.next_id();

        registry.register(
            id,
            "execute_atomic",
            None,
            counting_handler(calls.clone(), last.clone()),
            Deadline::Custom(Duration::from_secs(120)),
        );

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(registry.is_pending(id));
        assert!(registry.complete(id, Ok(PeerReply::Ack(json!({})))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_deadline_waits_indefinitely() {
        let registry = CorrelationRegistry::new(Duration::from_millis(10));
        let calls = Arc::new(AtomicUsize::new(0));
        let last = Arc::new(Mutex::new(None));
        let id = registry.next_id();

        registry.register(
            id,
            "read_strategy",
            None,
            counting_handler(calls.clone(), last.clone()),
            Deadline::None,
        );

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(registry.fail_all("shutdown"), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fail_session_only_touches_that_session() {
        let registry = CorrelationRegistry::new(Duration::from_secs(10));
        let calls = Arc::new(AtomicUsize::new(0));
        let last = Arc::new(Mutex::new(None));

        let old = SessionId::new(1);
        let new = SessionId::new(2);
        for session in [old, old, new] {
            let id = registry.next_id();
            registry.register(
                id,
                "get_layers",
                Some(session),
                counting_handler(calls.clone(), last.clone()),
                Deadline::Default,
            );
        }

        assert_eq!(registry.fail_session(old, "peer closed"), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(registry.pending_count(), 1);
        assert_eq!(
            *last.lock().unwrap(),
            Some(Err(PeerError::ConnectionLost("peer closed".to_string())))
        );
    }
}
