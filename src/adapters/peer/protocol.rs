//! Wire envelope for the peer channel
//!
//! Every frame is a JSON object with a string `type` tag. Requests carry an
//! integer `id` which the peer echoes on its response.

use crate::domain::{
    AtomicRequest, AtomicResponse, LayerId, LayerNode, OpenDocument, PeerError, RenderSpec,
    RequestId, StrategyDocument,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outbound request, one variant per wire tag
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundRequest {
    /// Fetch the full layer tree, nested containers included
    GetLayers { include_smart_object_contents: bool },
    /// Set one text layer
    UpdateTextLayer {
        layer_id: LayerId,
        text: String,
        parent_chain: Vec<LayerId>,
    },
    /// Set several text layers in one round trip
    UpdateTextLayers { updates: Vec<TextUpdate> },
    /// Run native descriptors
    #[serde(rename = "batchPlay")]
    BatchPlay {
        descriptors: Vec<Value>,
        parent_chain: Vec<LayerId>,
    },
    /// Replace placed image contents
    ReplaceImage {
        layer_id: LayerId,
        path: String,
        parent_chain: Vec<LayerId>,
    },
    /// Export the active document directly
    RenderOutput(RenderSpec),
    /// Local filter on a nested container
    ApplyFilter {
        layer_id: LayerId,
        filter_type: String,
        params: Value,
        parent_chain: Vec<LayerId>,
    },
    /// Record a history snapshot of the active document
    CreateSnapshot,
    /// Roll back to the recorded snapshot
    RestoreSnapshot,
    /// List open documents
    GetOpenDocs,
    /// Open a document from disk
    OpenDoc { path: String },
    /// Close a document by id or name
    CloseDoc {
        doc_id: Option<i64>,
        name: Option<String>,
        save: bool,
    },
    /// Make a document active
    ActivateDoc {
        doc_id: Option<i64>,
        name: Option<String>,
    },
    /// Tune host preferences for automation
    FixEnvironment,
    /// Apply edits and exports to an isolated working copy
    ExecuteAtomic(AtomicRequest),
    /// Read the strategy stored in the active document
    ReadStrategy,
    /// Store (or clear, with `None`) the strategy in the active document
    WriteStrategy { strategy: Option<StrategyDocument> },
    /// Show a message box; fire-and-forget
    ShowDialog {
        title: String,
        message: String,
        style: String,
    },
}

/// One entry of an `update_text_layers` request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextUpdate {
    pub layer_id: LayerId,
    pub text: String,
    #[serde(default)]
    pub parent_chain: Vec<LayerId>,
}

impl OutboundRequest {
    /// Wire tag of the request
    pub fn tag(&self) -> &'static str {
        match self {
            OutboundRequest::GetLayers { .. } => "get_layers",
            OutboundRequest::UpdateTextLayer { .. } => "update_text_layer",
            OutboundRequest::UpdateTextLayers { .. } => "update_text_layers",
            OutboundRequest::BatchPlay { .. } => "batchPlay",
            OutboundRequest::ReplaceImage { .. } => "replace_image",
            OutboundRequest::RenderOutput(_) => "render_output",
            OutboundRequest::ApplyFilter { .. } => "apply_filter",
            OutboundRequest::CreateSnapshot => "create_snapshot",
            OutboundRequest::RestoreSnapshot => "restore_snapshot",
            OutboundRequest::GetOpenDocs => "get_open_docs",
            OutboundRequest::OpenDoc { .. } => "open_doc",
            OutboundRequest::CloseDoc { .. } => "close_doc",
            OutboundRequest::ActivateDoc { .. } => "activate_doc",
            OutboundRequest::FixEnvironment => "fix_environment",
            OutboundRequest::ExecuteAtomic(_) => "execute_atomic",
            OutboundRequest::ReadStrategy => "read_strategy",
            OutboundRequest::WriteStrategy { .. } => "write_strategy",
            OutboundRequest::ShowDialog { .. } => "show_dialog",
        }
    }

    /// Serializes the request, stamping `id` when given
    pub fn encode(&self, id: Option<RequestId>) -> Result<String, PeerError> {
        let mut value = serde_json::to_value(self)
            .map_err(|e| PeerError::Protocol(format!("cannot encode {}: {e}", self.tag())))?;
        if let (Some(id), Value::Object(map)) = (id, &mut value) {
            map.insert("id".to_string(), Value::from(id.value()));
        }
        Ok(value.to_string())
    }
}

/// Progress notification sent while an atomic unit runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomicProgress {
    /// Id of the atomic request being reported on
    #[serde(default)]
    pub id: Option<u64>,
    /// Phase name
    #[serde(default)]
    pub step: String,
    #[serde(default)]
    pub current: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub message: String,
}

/// Per-layer outcome inside an `update_response`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateResult {
    #[serde(default)]
    pub id: Option<LayerId>,
    #[serde(default)]
    pub status: String,
    #[serde(default, alias = "msg")]
    pub error: Option<String>,
}

/// Payload delivered to a completion handler
#[derive(Debug, Clone, PartialEq)]
pub enum PeerReply {
    /// `layers_response`
    LayerTree(Vec<LayerNode>),
    /// `update_response`
    Updates(Vec<UpdateResult>),
    /// Any status-only success; carries the full frame for extra fields
    Ack(Value),
    /// `read_strategy_response`; `None` when the document holds no strategy
    Strategy(Option<Value>),
    /// `render_output_response`
    Rendered(Option<String>),
    /// `execute_atomic_response`, whatever its status
    Atomic(AtomicResponse),
    /// `get_open_docs_response`
    Documents(Vec<OpenDocument>),
}

impl PeerReply {
    /// Short name used in logs and mismatch errors
    pub fn kind(&self) -> &'static str {
        match self {
            PeerReply::LayerTree(_) => "layer_tree",
            PeerReply::Updates(_) => "updates",
            PeerReply::Ack(_) => "ack",
            PeerReply::Strategy(_) => "strategy",
            PeerReply::Rendered(_) => "rendered",
            PeerReply::Atomic(_) => "atomic",
            PeerReply::Documents(_) => "documents",
        }
    }
}

/// A classified inbound frame
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Settles the pending request with this id
    Reply {
        id: RequestId,
        result: Result<PeerReply, PeerError>,
    },
    /// Fire-and-forget progress; never settles a request
    Progress(AtomicProgress),
    /// Anything the dispatcher has no handler for
    Unhandled { tag: Option<String> },
}

/// Parses and classifies one inbound frame
///
/// Returns an error only when the frame is not a JSON object. A typed
/// response whose payload does not match its schema settles its request with
/// [`PeerError::Protocol`] instead.
pub fn parse_frame(text: &str) -> Result<Inbound, serde_json::Error> {
    let frame: serde_json::Map<String, Value> = serde_json::from_str(text)?;

    let tag = frame.get("type").and_then(Value::as_str).map(str::to_string);
    let id = frame.get("id").and_then(Value::as_u64).map(RequestId::new);

    if tag.as_deref() == Some("atomic_progress") {
        let progress = serde_json::from_value(Value::Object(frame))?;
        return Ok(Inbound::Progress(progress));
    }

    let Some(id) = id else {
        return Ok(Inbound::Unhandled { tag });
    };

    let result = match tag.as_deref() {
        Some("layers_response") => status_checked(&frame)
            .and_then(|_| decode::<Vec<LayerNode>>(&frame, "data"))
            .map(PeerReply::LayerTree),
        Some("update_response") => decode(&frame, "results").map(PeerReply::Updates),
        Some("batchPlay_response") | Some("write_strategy_response") => {
            status_checked(&frame).map(|_| PeerReply::Ack(Value::Object(frame.clone())))
        }
        Some("read_strategy_response") => match error_text(&frame) {
            Some(err) => Err(PeerError::Remote(err)),
            None => Ok(PeerReply::Strategy(
                frame.get("strategy").filter(|v| !v.is_null()).cloned(),
            )),
        },
        Some("render_output_response") => status_checked(&frame).map(|_| {
            PeerReply::Rendered(
                frame
                    .get("output_path")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            )
        }),
        Some("execute_atomic_response") => {
            serde_json::from_value::<AtomicResponse>(Value::Object(frame.clone()))
                .map(PeerReply::Atomic)
                .map_err(|e| PeerError::Protocol(format!("execute_atomic_response: {e}")))
        }
        Some("get_open_docs_response") => decode(&frame, "data").map(PeerReply::Documents),
        _ if frame.contains_key("status") => {
            status_checked(&frame).map(|_| PeerReply::Ack(Value::Object(frame.clone())))
        }
        _ => return Ok(Inbound::Unhandled { tag }),
    };

    Ok(Inbound::Reply { id, result })
}

fn error_text(frame: &serde_json::Map<String, Value>) -> Option<String> {
    match frame.get("error") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}

fn status_checked(frame: &serde_json::Map<String, Value>) -> Result<(), PeerError> {
    if frame.get("status").and_then(Value::as_str) == Some("success") {
        Ok(())
    } else {
        Err(PeerError::Remote(
            error_text(frame).unwrap_or_else(|| "Unknown error".to_string()),
        ))
    }
}

fn decode<T: serde::de::DeserializeOwned + Default>(
    frame: &serde_json::Map<String, Value>,
    field: &str,
) -> Result<T, PeerError> {
    match frame.get(field) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| PeerError::Protocol(format!("malformed `{field}`: {e}"))),
    }
}
