//! Resolved operations, render specs and the atomic unit exchanged with the peer
//!
//! These are the wire forms: every target is already a layer id plus the
//! chain of enclosing smart-object ids, outermost first.

use super::ids::LayerId;
use super::strategy::FilterSpec;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An edit operation with a resolved target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationSpec {
    /// Target layer id
    pub layer_id: LayerId,
    /// Enclosing smart objects, outermost first; empty for the main document
    #[serde(default)]
    pub parent_chain: Vec<LayerId>,
    /// 1-based group the operation was bound to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<u32>,
    /// Type tag and payload
    #[serde(flatten)]
    pub action: OperationAction,
}

/// Type-specific payload of a resolved operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OperationAction {
    /// Set text contents
    UpdateTextLayer {
        /// Final text
        text: String,
    },
    /// Replace placed image contents
    ReplaceImage {
        /// Normalized path with forward slashes
        image_path: String,
    },
    /// Local filter on a nested container
    ApplyFilter {
        /// Filter name
        filter_type: String,
        /// Filter parameters
        #[serde(default)]
        params: Value,
    },
    /// Native descriptors
    BatchPlay {
        /// Descriptor list
        #[serde(default)]
        descriptors: Vec<Value>,
    },
}

impl OperationAction {
    /// Wire tag of the action
    pub fn type_name(&self) -> &'static str {
        match self {
            OperationAction::UpdateTextLayer { .. } => "update_text_layer",
            OperationAction::ReplaceImage { .. } => "replace_image",
            OperationAction::ApplyFilter { .. } => "apply_filter",
            OperationAction::BatchPlay { .. } => "batch_play",
        }
    }
}

/// One export request inside an atomic unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSpec {
    /// Output folder, forward slashes
    pub folder: String,
    /// File name without extension
    pub file_name: String,
    /// Output format
    pub format: String,
    /// Root layers kept visible; empty renders everything
    #[serde(default)]
    pub root_ids: Vec<LayerId>,
    /// Whether tiling is applied
    #[serde(default)]
    pub tiling: bool,
    /// Tiling canvas width
    #[serde(default)]
    pub width: u32,
    /// Tiling canvas height
    #[serde(default)]
    pub height: u32,
    /// Tiling resolution (ppi)
    #[serde(default)]
    pub resolution: u32,
    /// Post-render filters
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
}

/// A bundle of edits and exports applied to an isolated working copy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomicRequest {
    /// Edits, applied in order
    pub operations: Vec<OperationSpec>,
    /// Exports, performed in order after every edit
    pub renders: Vec<RenderSpec>,
    /// Keep the working copy open for inspection
    #[serde(default)]
    pub debug: bool,
    /// Document to activate first
    #[serde(default)]
    pub target_document: Option<String>,
}

/// Peer answer to an atomic unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomicResponse {
    /// Overall status (`success` or `error`)
    #[serde(default)]
    pub status: String,
    /// Per-export outcomes
    #[serde(default)]
    pub rendered_files: Vec<ExportResult>,
    /// Overall error text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AtomicResponse {
    /// Whether the peer reported overall success
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// Exports that did not succeed
    pub fn failed_exports(&self) -> impl Iterator<Item = &ExportResult> {
        self.rendered_files.iter().filter(|r| !r.is_ok())
    }
}

/// Outcome of one export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportResult {
    /// File name the export was requested under
    #[serde(default)]
    pub name: String,
    /// Path written by the peer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// `ok` or `error`
    #[serde(default)]
    pub status: String,
    /// Error text for failed exports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExportResult {
    /// Whether this export succeeded
    pub fn is_ok(&self) -> bool {
        self.status == "ok" || self.status == "success"
    }
}

/// A document open in the host application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenDocument {
    /// Host document id
    pub id: i64,
    /// File name
    #[serde(default)]
    pub name: String,
    /// Path on disk, `unsaved` for new documents
    #[serde(default)]
    pub path: String,
    /// Whether it is the active document
    #[serde(default)]
    pub active: bool,
}
