//! Typed peer client
//!
//! One async method per outbound request. Each method sends through the
//! [`ConnectionManager`] and unwraps the reply it expects, turning any other
//! reply into [`PeerError::UnexpectedReply`].

use super::connection::ConnectionManager;
use super::protocol::{OutboundRequest, PeerReply, TextUpdate, UpdateResult};
use super::registry::Deadline;
use crate::domain::{
    AtomicRequest, AtomicResponse, FilterSpec, LayerId, LayerNode, OpenDocument, PeerError,
    RenderSpec, StrategyDocument,
};
use serde_json::Value;
use std::time::Duration;

/// Default window for `execute_atomic`
pub const DEFAULT_ATOMIC_TIMEOUT: Duration = Duration::from_secs(120);

/// Default window for `open_doc`
pub const DEFAULT_OPEN_TIMEOUT: Duration = Duration::from_secs(30);

/// Document opened by [`PeerClient::open_document`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedDocument {
    /// Host document id, when reported
    pub doc_id: Option<i64>,
    /// Host document name, when reported
    pub name: Option<String>,
}

/// Typed request API over a [`ConnectionManager`]
#[derive(Clone)]
pub struct PeerClient {
    connection: ConnectionManager,
    atomic_timeout: Duration,
    open_timeout: Duration,
}

macro_rules! expect_reply {
    ($reply:expr, $variant:ident, $what:literal) => {
        match $reply {
            PeerReply::$variant(value) => Ok(value),
            other => Err(PeerError::UnexpectedReply(format!(
                "expected {} reply, got {}",
                $what,
                other.kind()
            ))),
        }
    };
}

impl PeerClient {
    /// Creates a client with the default atomic and open windows
    pub fn new(connection: ConnectionManager) -> Self {
        Self {
            connection,
            atomic_timeout: DEFAULT_ATOMIC_TIMEOUT,
            open_timeout: DEFAULT_OPEN_TIMEOUT,
        }
    }

    /// Overrides the registry window used for `execute_atomic`
    pub fn with_atomic_timeout(mut self, timeout: Duration) -> Self {
        self.atomic_timeout = timeout;
        self
    }

    /// Overrides the registry window used for `open_doc`
    pub fn with_open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout = timeout;
        self
    }

    /// Underlying connection
    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    async fn ack(&self, request: OutboundRequest, deadline: Deadline) -> Result<Value, PeerError> {
        let reply = self.connection.request(&request, deadline).await?;
        expect_reply!(reply, Ack, "status")
    }

    /// Fetches the full layer tree, nested container contents included
    pub async fn get_layers(&self) -> Result<Vec<LayerNode>, PeerError> {
        let reply = self
            .connection
            .request(
                &OutboundRequest::GetLayers {
                    include_smart_object_contents: true,
                },
                Deadline::Default,
            )
            .await?;
        expect_reply!(reply, LayerTree, "layer tree")
    }

    /// Sets the text of one layer
    pub async fn update_text_layer(
        &self,
        layer_id: LayerId,
        text: impl Into<String>,
        parent_chain: Vec<LayerId>,
    ) -> Result<Vec<UpdateResult>, PeerError> {
        let reply = self
            .connection
            .request(
                &OutboundRequest::UpdateTextLayer {
                    layer_id,
                    text: text.into(),
                    parent_chain,
                },
                Deadline::Default,
            )
            .await?;
        expect_reply!(reply, Updates, "update")
    }

    /// Sets the text of several layers in one round trip
    pub async fn update_text_layers(
        &self,
        updates: Vec<TextUpdate>,
    ) -> Result<Vec<UpdateResult>, PeerError> {
        let reply = self
            .connection
            .request(&OutboundRequest::UpdateTextLayers { updates }, Deadline::Default)
            .await?;
        expect_reply!(reply, Updates, "update")
    }

    /// Runs native descriptors, inside the given container chain
    pub async fn batch_play(
        &self,
        descriptors: Vec<Value>,
        parent_chain: Vec<LayerId>,
    ) -> Result<(), PeerError> {
        self.ack(
            OutboundRequest::BatchPlay {
                descriptors,
                parent_chain,
            },
            Deadline::Default,
        )
        .await
        .map(|_| ())
    }

    /// Replaces the contents of an image layer
    pub async fn replace_image(
        &self,
        layer_id: LayerId,
        path: &str,
        parent_chain: Vec<LayerId>,
    ) -> Result<(), PeerError> {
        self.ack(
            OutboundRequest::ReplaceImage {
                layer_id,
                path: normalize_path(path),
                parent_chain,
            },
            Deadline::Default,
        )
        .await
        .map(|_| ())
    }

    /// Exports the active document directly, outside any atomic unit
    ///
    /// The format is lowercased and `jpeg` becomes `jpg`; the folder is
    /// normalized to forward slashes.
    pub async fn render_output(&self, mut spec: RenderSpec) -> Result<Option<String>, PeerError> {
        spec.folder = normalize_path(&spec.folder);
        spec.format = normalize_format(&spec.format);
        let reply = self
            .connection
            .request(&OutboundRequest::RenderOutput(spec), Deadline::Default)
            .await?;
        expect_reply!(reply, Rendered, "render")
    }

    /// Applies a local filter to a nested container
    pub async fn apply_filter(
        &self,
        layer_id: LayerId,
        filter: FilterSpec,
        parent_chain: Vec<LayerId>,
    ) -> Result<(), PeerError> {
        self.ack(
            OutboundRequest::ApplyFilter {
                layer_id,
                filter_type: filter.filter_type,
                params: filter.params,
                parent_chain,
            },
            Deadline::Default,
        )
        .await
        .map(|_| ())
    }

    /// Records a history snapshot of the active document
    pub async fn create_snapshot(&self) -> Result<(), PeerError> {
        self.ack(OutboundRequest::CreateSnapshot, Deadline::Default)
            .await
            .map(|_| ())
    }

    /// Rolls the active document back to its snapshot
    pub async fn restore_snapshot(&self) -> Result<(), PeerError> {
        self.ack(OutboundRequest::RestoreSnapshot, Deadline::Default)
            .await
            .map(|_| ())
    }

    /// Lists open documents
    pub async fn get_open_docs(&self) -> Result<Vec<OpenDocument>, PeerError> {
        let reply = self
            .connection
            .request(&OutboundRequest::GetOpenDocs, Deadline::Default)
            .await?;
        expect_reply!(reply, Documents, "document list")
    }

    /// Opens a document from disk
    pub async fn open_doc(&self, path: &str) -> Result<OpenedDocument, PeerError> {
        let frame = self
            .ack(
                OutboundRequest::OpenDoc {
                    path: path.to_string(),
                },
                Deadline::Custom(self.open_timeout),
            )
            .await?;
        Ok(OpenedDocument {
            doc_id: frame.get("doc_id").and_then(Value::as_i64),
            name: frame.get("name").and_then(Value::as_str).map(str::to_string),
        })
    }

    /// Closes a document by id or name
    pub async fn close_doc(
        &self,
        doc_id: Option<i64>,
        name: Option<String>,
        save: bool,
    ) -> Result<(), PeerError> {
        self.ack(OutboundRequest::CloseDoc { doc_id, name, save }, Deadline::Default)
            .await
            .map(|_| ())
    }

    /// Makes a document active
    pub async fn activate_doc(
        &self,
        doc_id: Option<i64>,
        name: Option<String>,
    ) -> Result<(), PeerError> {
        self.ack(OutboundRequest::ActivateDoc { doc_id, name }, Deadline::Default)
            .await
            .map(|_| ())
    }

    /// Tunes host preferences for unattended automation
    pub async fn fix_environment(&self) -> Result<(), PeerError> {
        self.ack(OutboundRequest::FixEnvironment, Deadline::Default)
            .await
            .map(|_| ())
    }

    /// Sends an atomic unit and returns the raw peer answer
    ///
    /// Uses the atomic window rather than the registry default; interpreting
    /// the answer is up to the caller.
    pub async fn execute_atomic(&self, request: AtomicRequest) -> Result<AtomicResponse, PeerError> {
        let reply = self
            .connection
            .request(
                &OutboundRequest::ExecuteAtomic(request),
                Deadline::Custom(self.atomic_timeout),
            )
            .await?;
        expect_reply!(reply, Atomic, "atomic")
    }

    /// Reads the strategy stored in the active document
    pub async fn read_strategy(&self) -> Result<Option<StrategyDocument>, PeerError> {
        let reply = self
            .connection
            .request(&OutboundRequest::ReadStrategy, Deadline::Default)
            .await?;
        match expect_reply!(reply, Strategy, "strategy")? {
            None => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| PeerError::Protocol(format!("stored strategy is invalid: {e}"))),
        }
    }

    /// Stores a strategy in the active document, or clears it with `None`
    pub async fn write_strategy(&self, strategy: Option<StrategyDocument>) -> Result<(), PeerError> {
        self.ack(OutboundRequest::WriteStrategy { strategy }, Deadline::Default)
            .await
            .map(|_| ())
    }

    /// Shows a message box in the host; no reply is awaited
    pub fn show_dialog(&self, title: &str, message: &str, style: &str) -> Result<(), PeerError> {
        self.connection.notify(&OutboundRequest::ShowDialog {
            title: title.to_string(),
            message: message.to_string(),
            style: style.to_string(),
        })
    }
}

/// Converts backslashes to forward slashes
pub fn normalize_path(path: &str) -> String {
    path.trim().replace('\\', "/")
}

/// Lowercases a format name and maps `jpeg` to `jpg`
pub fn normalize_format(format: &str) -> String {
    let format = format.trim().to_lowercase();
    if format == "jpeg" {
        "jpg".to_string()
    } else {
        format
    }
}
