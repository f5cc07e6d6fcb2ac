//! Document host abstraction
//!
//! This module defines the trait the batch engine and the workflow
//! orchestrator drive. [`PeerClient`] is the production implementation;
//! tests substitute scripted hosts.

use super::peer::{OpenedDocument, PeerClient};
use crate::domain::{AtomicRequest, AtomicResponse, LayerNode, PeerError};
use async_trait::async_trait;

/// Operations the core needs from the remote document host
#[async_trait]
pub trait DocumentHost: Send + Sync {
    /// Whether a peer is currently attached
    fn is_connected(&self) -> bool;

    /// Fetch a fresh layer tree of the active document
    ///
    /// # Errors
    ///
    /// Returns [`PeerError::NotConnected`], a timeout, or the peer's error.
    async fn fetch_tree(&self) -> Result<Vec<LayerNode>, PeerError>;

    /// Apply edits and exports to an isolated working copy
    ///
    /// Returns the raw answer; the caller decides whether it counts as
    /// success.
    async fn execute_atomic(&self, request: AtomicRequest) -> Result<AtomicResponse, PeerError>;

    /// Open a document from disk and make it active
    async fn open_document(&self, path: &str) -> Result<OpenedDocument, PeerError>;

    /// Close a previously opened document
    async fn close_document(&self, document: &OpenedDocument, save: bool)
        -> Result<(), PeerError>;
}

#[async_trait]
impl DocumentHost for PeerClient {
    fn is_connected(&self) -> bool {
        self.connection().is_connected()
    }

    async fn fetch_tree(&self) -> Result<Vec<LayerNode>, PeerError> {
        self.get_layers().await
    }

    async fn execute_atomic(&self, request: AtomicRequest) -> Result<AtomicResponse, PeerError> {
        PeerClient::execute_atomic(self, request).await
    }

    async fn open_document(&self, path: &str) -> Result<OpenedDocument, PeerError> {
        self.open_doc(path).await
    }

    async fn close_document(
        &self,
        document: &OpenedDocument,
        save: bool,
    ) -> Result<(), PeerError> {
        self.close_doc(document.doc_id, document.name.clone(), save)
            .await
    }
}
