//! Multi-document workflow
//!
//! Opens each document, drives a batch over it and closes it again without
//! saving. One document failing never stops the next one.

use crate::adapters::host::DocumentHost;
use crate::adapters::peer::OpenedDocument;
use crate::config::{BatchConfig, WorkflowConfig};
use crate::core::batch::{BatchEngine, BatchOptions, BatchSummary, ProgressSink};
use crate::domain::{BatchRow, BridgeError, PeerError, Result, StrategyDocument};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// One document plus the batch to run against it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowTask {
    /// Path of the document on the host's file system
    pub document_path: String,
    /// Strategy to replay
    pub strategy: StrategyDocument,
    /// Data table
    #[serde(default)]
    pub rows: Vec<BatchRow>,
}

impl WorkflowTask {
    /// Reads a JSON array of tasks
    pub fn list_from_json(json: &str) -> Result<Vec<Self>> {
        serde_json::from_str(json)
            .map_err(|e| BridgeError::Validation(format!("Invalid workflow task file: {e}")))
    }
}

/// Final state of one document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// The batch ran; rows may still have failed individually
    Completed,
    /// Opening, fetching or the batch itself failed
    Failed,
    /// Not started because of a stop signal
    Skipped,
}

/// Outcome of one document task
#[derive(Debug, Clone, Serialize)]
pub struct DocumentResult {
    pub document: String,
    pub status: DocumentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<BatchSummary>,
}

/// Outcome of a workflow run
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkflowSummary {
    pub documents: Vec<DocumentResult>,
    pub cancelled: bool,
    #[serde(skip)]
    pub duration: Duration,
}

impl WorkflowSummary {
    /// Documents whose batch ran to completion
    pub fn completed(&self) -> usize {
        self.count(DocumentStatus::Completed)
    }

    /// Documents that failed outright
    pub fn failed(&self) -> usize {
        self.count(DocumentStatus::Failed)
    }

    fn count(&self, status: DocumentStatus) -> usize {
        self.documents.iter().filter(|d| d.status == status).count()
    }

    /// Every document completed and every row succeeded
    pub fn is_successful(&self) -> bool {
        self.documents.iter().all(|d| {
            d.status == DocumentStatus::Completed
                && d.summary.as_ref().map(BatchSummary::is_successful).unwrap_or(false)
        })
    }

    pub fn log_summary(&self) {
        tracing::info!(
            documents = self.documents.len(),
            completed = self.completed(),
            failed = self.failed(),
            cancelled = self.cancelled,
            duration_ms = self.duration.as_millis() as u64,
            "Workflow completed"
        );
    }
}

/// Timeouts and batch settings for a workflow
#[derive(Debug, Clone)]
pub struct WorkflowOptions {
    pub open_timeout: Duration,
    pub document_timeout: Duration,
    pub batch: BatchOptions,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            open_timeout: Duration::from_secs(30),
            document_timeout: Duration::from_secs(600),
            batch: BatchOptions::default(),
        }
    }
}

impl WorkflowOptions {
    pub fn from_config(workflow: &WorkflowConfig, batch: &BatchConfig) -> Self {
        Self {
            open_timeout: Duration::from_secs(workflow.open_timeout_secs),
            document_timeout: Duration::from_secs(workflow.document_timeout_secs),
            batch: BatchOptions::from_config(batch),
        }
    }
}

/// Sequences batches across documents
pub struct WorkflowOrchestrator {
    host: Arc<dyn DocumentHost>,
    options: WorkflowOptions,
    stop: Option<watch::Receiver<bool>>,
}

impl WorkflowOrchestrator {
    pub fn new(host: Arc<dyn DocumentHost>, options: WorkflowOptions) -> Self {
        Self {
            host,
            options,
            stop: None,
        }
    }

    /// Attach a stop signal, checked between documents and between rows
    pub fn with_stop_signal(mut self, stop: watch::Receiver<bool>) -> Self {
        self.stop = Some(stop);
        self
    }

    fn stop_requested(&self) -> bool {
        self.stop.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }

    /// Runs every task in order
    pub async fn run(&self, tasks: &[WorkflowTask], progress: &dyn ProgressSink) -> WorkflowSummary {
        let start_time = Instant::now();
        let mut summary = WorkflowSummary::default();

        tracing::info!(documents = tasks.len(), "Starting workflow");

        for (position, task) in tasks.iter().enumerate() {
            if self.stop_requested() {
                summary.cancelled = true;
                tracing::warn!(
                    document = %task.document_path,
                    "Stop requested; document not started"
                );
                summary.documents.push(DocumentResult {
                    document: task.document_path.clone(),
                    status: DocumentStatus::Skipped,
                    error: None,
                    summary: None,
                });
                continue;
            }

            tracing::info!(
                document = %task.document_path,
                position = position + 1,
                total = tasks.len(),
                rows = task.rows.len(),
                "Processing document"
            );

            let result = self.run_document(task, progress).await;
            if let Some(batch) = &result.summary {
                summary.cancelled |= batch.cancelled;
            }
            summary.documents.push(result);
        }

        summary.duration = start_time.elapsed();
        summary.log_summary();
        summary
    }

    async fn run_document(&self, task: &WorkflowTask, progress: &dyn ProgressSink) -> DocumentResult {
        let opened = match self.open(&task.document_path).await {
            Ok(opened) => opened,
            Err(e) => {
                tracing::error!(document = %task.document_path, error = %e, "Failed to open document");
                // The host may have opened it before the window closed.
                self.close_quietly(&fallback_handle(&task.document_path)).await;
                return DocumentResult {
                    document: task.document_path.clone(),
                    status: DocumentStatus::Failed,
                    error: Some(e.to_string()),
                    summary: None,
                };
            }
        };

        let document_name = opened
            .name
            .clone()
            .or_else(|| fallback_handle(&task.document_path).name)
            .unwrap_or_default();
        let options = self
            .options
            .batch
            .clone()
            .with_document_name(document_name.clone())
            .with_target_document(document_name);

        let mut engine = BatchEngine::new(self.host.clone(), options);
        if let Some(stop) = &self.stop {
            engine = engine.with_stop_signal(stop.clone());
        }

        let outcome = match tokio::time::timeout(
            self.options.document_timeout,
            engine.run(&task.strategy, &task.rows, progress),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(PeerError::Timeout(format!("batch for {}", task.document_path)).into()),
        };

        self.close_quietly(&opened).await;

        match outcome {
            Ok(batch) => DocumentResult {
                document: task.document_path.clone(),
                status: DocumentStatus::Completed,
                error: None,
                summary: Some(batch),
            },
            Err(e) => {
                tracing::error!(document = %task.document_path, error = %e, "Document batch failed");
                DocumentResult {
                    document: task.document_path.clone(),
                    status: DocumentStatus::Failed,
                    error: Some(e.to_string()),
                    summary: None,
                }
            }
        }
    }

    async fn open(&self, path: &str) -> Result<OpenedDocument> {
        let opened = tokio::time::timeout(self.options.open_timeout, self.host.open_document(path))
            .await
            .map_err(|_| PeerError::Timeout(format!("open_doc {path}")))??;
        tracing::debug!(
            document = %path,
            doc_id = ?opened.doc_id,
            name = ?opened.name,
            "Document opened"
        );
        Ok(opened)
    }

    async fn close_quietly(&self, document: &OpenedDocument) {
        if let Err(e) = self.host.close_document(document, false).await {
            tracing::warn!(
                doc_id = ?document.doc_id,
                name = ?document.name,
                error = %e,
                "Failed to close document"
            );
        }
    }
}

/// Close handle addressing a document by its file name
fn fallback_handle(path: &str) -> OpenedDocument {
    let name = Path::new(&path.replace('\\', "/"))
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    OpenedDocument {
        doc_id: None,
        name: Some(name),
    }
}
