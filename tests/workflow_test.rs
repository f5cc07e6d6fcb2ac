//! Integration tests for the multi-document workflow
//!
//! These tests verify that:
//! - Each document is opened, processed and closed without saving
//! - A document that fails to open does not stop the next one
//! - A stop signal skips documents that have not started

mod common;

use common::{HostCall, ScriptedHost};
use layerbridge::core::batch::ProgressEvent;
use layerbridge::core::workflow::{
    DocumentStatus, WorkflowOptions, WorkflowOrchestrator, WorkflowTask,
};
use layerbridge::domain::{BatchRow, LayerNode, StrategyDocument};
use std::sync::Arc;
use tokio::sync::watch;

fn task(path: &str, values: &[&str]) -> WorkflowTask {
    WorkflowTask {
        document_path: path.to_string(),
        strategy: StrategyDocument::from_json(
            r#"{
                "operations": [
                    {"target_path": "Root > Headline", "group": 1, "type": "update_text_layer"}
                ],
                "renders": [{"filename": "{doc}_{index}", "output_path": "/out", "format": "png"}]
            }"#,
        )
        .unwrap(),
        rows: values
            .iter()
            .map(|v| BatchRow::new().with_value("1", *v))
            .collect(),
    }
}

fn host() -> ScriptedHost {
    ScriptedHost::new(vec![LayerNode::text(7, "Headline", "old")])
}

#[tokio::test]
async fn test_documents_are_opened_processed_and_closed_without_saving() {
    let host = Arc::new(host());
    let orchestrator = WorkflowOrchestrator::new(host.clone(), WorkflowOptions::default());

    let summary = orchestrator
        .run(
            &[task("/docs/a.psd", &["x", "y"]), task("/docs/b.psd", &["z"])],
            &|_: &ProgressEvent| {},
        )
        .await;

    assert_eq!(summary.documents.len(), 2);
    assert_eq!(summary.completed(), 2);
    assert!(summary.is_successful());

    let calls = host.calls();
    assert_eq!(calls[0], HostCall::Open("/docs/a.psd".to_string()));
    assert_eq!(calls[1], HostCall::FetchTree);
    assert!(matches!(calls[2], HostCall::Execute(_)));
    assert!(matches!(calls[3], HostCall::Execute(_)));
    assert_eq!(
        calls[4],
        HostCall::Close {
            name: Some("a.psd".to_string()),
            save: false
        }
    );
    assert_eq!(calls[5], HostCall::Open("/docs/b.psd".to_string()));
    assert_eq!(
        calls.last(),
        Some(&HostCall::Close {
            name: Some("b.psd".to_string()),
            save: false
        })
    );

    let executed = host.executed();
    assert_eq!(executed[0].renders[0].file_name, "a_1");
    assert_eq!(executed[0].target_document.as_deref(), Some("a.psd"));
    assert_eq!(executed[2].renders[0].file_name, "b_1");
}

#[tokio::test]
async fn test_open_failure_is_recorded_and_next_document_runs() {
    let mut host = host();
    host.failing_opens.insert("C:\\docs\\broken.psd".to_string());
    let host = Arc::new(host);
    let orchestrator = WorkflowOrchestrator::new(host.clone(), WorkflowOptions::default());

    let summary = orchestrator
        .run(
            &[task("C:\\docs\\broken.psd", &["x"]), task("C:\\docs\\ok.psd", &["y"])],
            &|_: &ProgressEvent| {},
        )
        .await;

    assert_eq!(summary.documents[0].status, DocumentStatus::Failed);
    assert!(summary.documents[0]
        .error
        .as_deref()
        .unwrap()
        .contains("cannot open"));
    assert_eq!(summary.documents[1].status, DocumentStatus::Completed);
    assert_eq!(summary.failed(), 1);
    assert!(!summary.is_successful());

    let calls = host.calls();
    assert_eq!(
        calls[1],
        HostCall::Close {
            name: Some("broken.psd".to_string()),
            save: false
        },
        "a failed open is followed by a best-effort close by file name"
    );
    assert_eq!(host.executed().len(), 1);
}

#[tokio::test]
async fn test_stop_signal_skips_remaining_documents() {
    let (stop_tx, stop_rx) = watch::channel(false);
    let mut host = host();
    host.stop_after = Some((1, stop_tx));
    let host = Arc::new(host);

    let orchestrator = WorkflowOrchestrator::new(host.clone(), WorkflowOptions::default())
        .with_stop_signal(stop_rx);
    let summary = orchestrator
        .run(
            &[task("/docs/a.psd", &["x", "y"]), task("/docs/b.psd", &["z"])],
            &|_: &ProgressEvent| {},
        )
        .await;

    assert!(summary.cancelled);
    assert_eq!(summary.documents[0].status, DocumentStatus::Completed);
    let first = summary.documents[0].summary.as_ref().unwrap();
    assert_eq!(first.results.len(), 1);
    assert!(first.cancelled);
    assert_eq!(summary.documents[1].status, DocumentStatus::Skipped);

    assert!(!host
        .calls()
        .contains(&HostCall::Open("/docs/b.psd".to_string())));
    assert!(host.calls().contains(&HostCall::Close {
        name: Some("a.psd".to_string()),
        save: false
    }));
}

#[tokio::test]
async fn test_disconnected_host_fails_every_document() {
    let host = Arc::new(ScriptedHost::disconnected());
    let orchestrator = WorkflowOrchestrator::new(host.clone(), WorkflowOptions::default());

    let summary = orchestrator
        .run(&[task("/docs/a.psd", &["x"])], &|_: &ProgressEvent| {})
        .await;

    assert_eq!(summary.documents[0].status, DocumentStatus::Failed);
    assert!(summary.documents[0]
        .error
        .as_deref()
        .unwrap()
        .contains("not connected"));
}
