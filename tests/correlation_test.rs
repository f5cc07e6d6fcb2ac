//! Integration tests for request correlation over a peer session
//!
//! These tests verify that:
//! - Every completion handler fires exactly once
//! - Replies are matched by id, in any order
//! - Pending requests fail on disconnect, or linger until their timeout when
//!   that behavior is switched off

use layerbridge::adapters::peer::{
    Completion, ConnectionManager, Deadline, OutboundRequest, PeerReply,
};
use layerbridge::domain::{PeerError, RequestId};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

type Outcomes = Arc<Mutex<Vec<Result<PeerReply, PeerError>>>>;

fn recording_handler(calls: Arc<AtomicUsize>, outcomes: Outcomes) -> Completion {
    Box::new(move |result| {
        calls.fetch_add(1, Ordering::SeqCst);
        outcomes.lock().unwrap().push(result);
    })
}

async fn next_frame(outbound: &mut mpsc::UnboundedReceiver<String>) -> Value {
    serde_json::from_str(&outbound.recv().await.unwrap()).unwrap()
}

#[tokio::test]
async fn test_replies_are_matched_by_id_in_any_order() {
    let manager = ConnectionManager::new(Duration::from_secs(10), true);
    let (_session, mut outbound) = manager.attach();

    let first = {
        let manager = manager.clone();
        tokio::spawn(async move {
            manager
                .request(&OutboundRequest::ReadStrategy, Deadline::Default)
                .await
        })
    };
    let first_frame = next_frame(&mut outbound).await;

    let second = {
        let manager = manager.clone();
        tokio::spawn(async move {
            manager
                .request(&OutboundRequest::GetOpenDocs, Deadline::Default)
                .await
        })
    };
    let second_frame = next_frame(&mut outbound).await;
    assert_ne!(first_frame["id"], second_frame["id"]);

    manager.handle_frame(
        &json!({
            "type": "get_open_docs_response",
            "id": second_frame["id"],
            "data": [{"id": 3, "name": "a.psd", "path": "unsaved", "active": true}]
        })
        .to_string(),
    );
    manager.handle_frame(
        &json!({"type": "read_strategy_response", "id": first_frame["id"], "strategy": null})
            .to_string(),
    );

    match second.await.unwrap().unwrap() {
        PeerReply::Documents(docs) => assert_eq!(docs[0].name, "a.psd"),
        other => panic!("unexpected reply: {other:?}"),
    }
    assert!(matches!(
        first.await.unwrap().unwrap(),
        PeerReply::Strategy(None)
    ));
    assert_eq!(manager.registry().pending_count(), 0);
}

#[tokio::test]
async fn test_duplicate_reply_fires_handler_once() {
    let manager = ConnectionManager::new(Duration::from_secs(10), true);
    let (_session, mut outbound) = manager.attach();
    let calls = Arc::new(AtomicUsize::new(0));
    let outcomes: Outcomes = Arc::default();

    manager.dispatch(
        &OutboundRequest::CreateSnapshot,
        Some(recording_handler(calls.clone(), outcomes.clone())),
        Deadline::Default,
    );
    let frame = next_frame(&mut outbound).await;
    let reply = json!({"id": frame["id"], "status": "success"}).to_string();

    manager.handle_frame(&reply);
    manager.handle_frame(&reply);

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(matches!(outcomes.lock().unwrap()[0], Ok(PeerReply::Ack(_))));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_then_late_reply_fires_once() {
    let manager = ConnectionManager::new(Duration::from_secs(10), true);
    let (_session, mut outbound) = manager.attach();
    let calls = Arc::new(AtomicUsize::new(0));
    let outcomes: Outcomes = Arc::default();

    let id = manager
        .dispatch(
            &OutboundRequest::FixEnvironment,
            Some(recording_handler(calls.clone(), outcomes.clone())),
            Deadline::Default,
        )
        .unwrap();
    let _ = next_frame(&mut outbound).await;

    tokio::time::sleep(Duration::from_secs(11)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    manager.handle_frame(&json!({"id": id.value(), "status": "success"}).to_string());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        outcomes.lock().unwrap()[0],
        Err(PeerError::Timeout("fix_environment".to_string()))
    );
}

#[tokio::test]
async fn test_disconnect_fails_pending_requests_immediately() {
    let manager = ConnectionManager::new(Duration::from_secs(10), true);
    let (session, mut outbound) = manager.attach();

    let pending = {
        let manager = manager.clone();
        tokio::spawn(async move {
            manager
                .request(
                    &OutboundRequest::GetLayers {
                        include_smart_object_contents: true,
                    },
                    Deadline::Default,
                )
                .await
        })
    };
    let _ = next_frame(&mut outbound).await;

    manager.detach(session);

    let result = tokio::time::timeout(Duration::from_secs(1), pending)
        .await
        .expect("pending request should settle on disconnect")
        .unwrap();
    assert!(matches!(result, Err(PeerError::ConnectionLost(_))));
    assert_eq!(manager.registry().pending_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_legacy_disconnect_lets_requests_linger_until_timeout() {
    let manager = ConnectionManager::new(Duration::from_secs(10), false);
    let (session, mut outbound) = manager.attach();
    let calls = Arc::new(AtomicUsize::new(0));
    let outcomes: Outcomes = Arc::default();

    let id: RequestId = manager
        .dispatch(
            &OutboundRequest::CreateSnapshot,
            Some(recording_handler(calls.clone(), outcomes.clone())),
            Deadline::Default,
        )
        .unwrap();
    let _ = next_frame(&mut outbound).await;

    manager.detach(session);
    assert!(!manager.is_connected());

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(manager.registry().is_pending(id));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        outcomes.lock().unwrap()[0],
        Err(PeerError::Timeout("create_snapshot".to_string()))
    );
}

#[tokio::test]
async fn test_superseded_session_fails_its_requests_only() {
    let manager = ConnectionManager::new(Duration::from_secs(10), true);
    let (_old, mut old_outbound) = manager.attach();
    let calls = Arc::new(AtomicUsize::new(0));
    let outcomes: Outcomes = Arc::default();

    manager.dispatch(
        &OutboundRequest::ReadStrategy,
        Some(recording_handler(calls.clone(), outcomes.clone())),
        Deadline::Default,
    );
    let _ = next_frame(&mut old_outbound).await;

    let (_new, mut new_outbound) = manager.attach();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(matches!(
        outcomes.lock().unwrap()[0],
        Err(PeerError::ConnectionLost(_))
    ));

    manager.dispatch(
        &OutboundRequest::ReadStrategy,
        Some(recording_handler(calls.clone(), outcomes.clone())),
        Deadline::Default,
    );
    let frame = next_frame(&mut new_outbound).await;
    assert_eq!(manager.registry().pending_count(), 1);

    manager.handle_frame(
        &json!({"type": "read_strategy_response", "id": frame["id"], "strategy": null})
            .to_string(),
    );
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_request_without_peer_is_never_sent() {
    let manager = ConnectionManager::new(Duration::from_secs(10), true);
    let calls = Arc::new(AtomicUsize::new(0));
    let outcomes: Outcomes = Arc::default();

    let id = manager.dispatch(
        &OutboundRequest::CreateSnapshot,
        Some(recording_handler(calls.clone(), outcomes.clone())),
        Deadline::Default,
    );

    assert!(id.is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(outcomes.lock().unwrap()[0], Err(PeerError::NotConnected));
    assert_eq!(manager.registry().pending_count(), 0);
}

#[tokio::test]
async fn test_progress_frames_do_not_settle_requests() {
    let manager = ConnectionManager::new(Duration::from_secs(10), true);
    let (_session, mut outbound) = manager.attach();
    let mut progress = manager.subscribe_progress();
    let calls = Arc::new(AtomicUsize::new(0));

    let id = manager
        .dispatch(
            &OutboundRequest::FixEnvironment,
            Some(recording_handler(calls.clone(), Outcomes::default())),
            Deadline::Default,
        )
        .unwrap();
    let _ = next_frame(&mut outbound).await;

    manager.handle_frame(
        &json!({"type": "atomic_progress", "id": id.value(), "step": "render", "current": 1, "total": 2, "message": "out_1"})
            .to_string(),
    );

    assert_eq!(progress.recv().await.unwrap().step, "render");
    assert!(manager.registry().is_pending(id));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
