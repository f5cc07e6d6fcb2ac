//! Scripted document host shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use layerbridge::adapters::host::DocumentHost;
use layerbridge::adapters::peer::OpenedDocument;
use layerbridge::domain::{AtomicRequest, AtomicResponse, ExportResult, LayerNode, PeerError};
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;

/// One host interaction, in call order
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    FetchTree,
    Execute(AtomicRequest),
    Open(String),
    Close { name: Option<String>, save: bool },
}

/// In-memory host answering from scripts
pub struct ScriptedHost {
    pub connected: bool,
    pub tree: Vec<LayerNode>,
    pub tree_delay: Option<Duration>,
    /// Answers for successive atomic calls; success once exhausted
    pub atomic_answers: Mutex<VecDeque<Result<AtomicResponse, PeerError>>>,
    /// Paths whose `open_doc` fails
    pub failing_opens: HashSet<String>,
    /// Raised after the given number of atomic calls
    pub stop_after: Option<(usize, watch::Sender<bool>)>,
    calls: Mutex<Vec<HostCall>>,
}

impl ScriptedHost {
    pub fn new(tree: Vec<LayerNode>) -> Self {
        Self {
            connected: true,
            tree,
            tree_delay: None,
            atomic_answers: Mutex::new(VecDeque::new()),
            failing_opens: HashSet::new(),
            stop_after: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn disconnected() -> Self {
        Self {
            connected: false,
            ..Self::new(Vec::new())
        }
    }

    pub fn answer(self, answer: Result<AtomicResponse, PeerError>) -> Self {
        self.atomic_answers.lock().unwrap().push_back(answer);
        self
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn executed(&self) -> Vec<AtomicRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HostCall::Execute(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: HostCall) {
        self.calls.lock().unwrap().push(call);
    }
}

/// A successful answer with one exported file per render
pub fn success_for(request: &AtomicRequest) -> AtomicResponse {
    AtomicResponse {
        status: "success".to_string(),
        rendered_files: request
            .renders
            .iter()
            .map(|render| ExportResult {
                name: render.file_name.clone(),
                path: Some(format!(
                    "{}/{}.{}",
                    render.folder, render.file_name, render.format
                )),
                status: "ok".to_string(),
                error: None,
            })
            .collect(),
        error: None,
    }
}

#[async_trait]
impl DocumentHost for ScriptedHost {
    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn fetch_tree(&self) -> Result<Vec<LayerNode>, PeerError> {
        self.record(HostCall::FetchTree);
        if let Some(delay) = self.tree_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.tree.clone())
    }

    async fn execute_atomic(&self, request: AtomicRequest) -> Result<AtomicResponse, PeerError> {
        self.record(HostCall::Execute(request.clone()));
        let executed = self.executed().len();
        if let Some((after, stop)) = &self.stop_after {
            if executed == *after {
                let _ = stop.send(true);
            }
        }
        let scripted = self.atomic_answers.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(success_for(&request)))
    }

    async fn open_document(&self, path: &str) -> Result<OpenedDocument, PeerError> {
        self.record(HostCall::Open(path.to_string()));
        if self.failing_opens.contains(path) {
            return Err(PeerError::Remote(format!("cannot open {path}")));
        }
        let name = path.rsplit(['/', '\\']).next().unwrap_or(path).to_string();
        Ok(OpenedDocument {
            doc_id: Some(self.calls().len() as i64),
            name: Some(name),
        })
    }

    async fn close_document(
        &self,
        document: &OpenedDocument,
        save: bool,
    ) -> Result<(), PeerError> {
        self.record(HostCall::Close {
            name: document.name.clone(),
            save,
        });
        Ok(())
    }
}
