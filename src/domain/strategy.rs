//! Strategy documents
//!
//! A strategy document describes which layers a batch edits (operations, by
//! hierarchical path) and how each row is exported (render presets). It is
//! authored by the UI layer and stored inside the document itself.

use super::errors::BridgeError;
use super::result::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Schema version this crate writes and expects
pub const STRATEGY_VERSION: &str = "1.1.0";

/// A complete strategy: edit operations plus export presets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyDocument {
    /// Schema version tag
    #[serde(default = "default_version")]
    pub version: String,

    /// Ordered edit operations
    #[serde(default)]
    pub operations: Vec<OperationTemplate>,

    /// Ordered export presets
    #[serde(default)]
    pub renders: Vec<RenderPreset>,
}

/// One edit operation addressed by hierarchical path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationTemplate {
    /// Path such as `Root > Card > Title`
    #[serde(default)]
    pub target_path: String,

    /// 1-based group binding this operation to a row value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<u32>,

    /// Type tag plus type-specific fields
    #[serde(flatten)]
    pub payload: OperationPayload,
}

/// Type-specific part of an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OperationPayload {
    /// Replace the contents of a text layer
    UpdateTextLayer {
        /// Fallback text when the row has no value for the group
        #[serde(default)]
        text: String,
        /// Ordered find/replace steps applied after substitution
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        regex_steps: Vec<RegexStep>,
    },
    /// Replace the contents of an image layer
    ReplaceImage {
        /// Fallback image path when the row has no value for the group
        #[serde(default)]
        image_path: String,
    },
    /// Apply a local filter to a nested container
    ApplyFilter {
        /// Filter name understood by the peer
        filter_type: String,
        /// Filter parameters
        #[serde(default)]
        params: Value,
    },
    /// Raw native descriptors executed by the peer
    BatchPlay {
        /// Descriptor list
        #[serde(default)]
        descriptors: Vec<Value>,
    },
}

impl OperationPayload {
    /// Wire tag of the operation
    pub fn type_name(&self) -> &'static str {
        match self {
            OperationPayload::UpdateTextLayer { .. } => "update_text_layer",
            OperationPayload::ReplaceImage { .. } => "replace_image",
            OperationPayload::ApplyFilter { .. } => "apply_filter",
            OperationPayload::BatchPlay { .. } => "batch_play",
        }
    }

    /// Variable kind used for group numbering, if the operation takes row data
    pub fn group_kind(&self) -> Option<GroupKind> {
        match self {
            OperationPayload::UpdateTextLayer { .. } => Some(GroupKind::Text),
            OperationPayload::ReplaceImage { .. } => Some(GroupKind::Image),
            _ => None,
        }
    }
}

/// One find/replace step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegexStep {
    /// Pattern to find
    #[serde(default)]
    pub find: String,
    /// Replacement; `$1` and `\1` style back-references are accepted
    #[serde(default)]
    pub replace: String,
}

/// Export preset applied to every row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderPreset {
    /// Preset display name
    #[serde(default)]
    pub name: Option<String>,

    /// Filename template (`{index}`, `{doc}`, `{timestamp}`, `{group N}`)
    #[serde(default = "default_filename")]
    pub filename: String,

    /// Output folder
    #[serde(default = "default_output_path")]
    pub output_path: String,

    /// Output format (`jpg`, `png`, `gif`, `psd`)
    #[serde(default = "default_format")]
    pub format: String,

    /// Encoder quality, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<u32>,

    /// Paths of the root layers to keep visible; empty renders everything
    #[serde(default)]
    pub root_layers: Vec<String>,

    /// Tiling block
    #[serde(default)]
    pub tiling: TilingPreset,

    /// Ordered post-render filters
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
}

/// Tiling settings of a render preset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TilingPreset {
    /// Whether tiling is applied
    #[serde(default)]
    pub enabled: bool,
    /// Canvas width in pixels
    #[serde(default)]
    pub width: u32,
    /// Canvas height in pixels
    #[serde(default)]
    pub height: u32,
    /// Resolution in pixels per inch
    #[serde(default = "default_ppi")]
    pub ppi: u32,
}

impl Default for TilingPreset {
    fn default() -> Self {
        Self {
            enabled: false,
            width: 0,
            height: 0,
            ppi: default_ppi(),
        }
    }
}

/// A post-render filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Filter name
    #[serde(rename = "type")]
    pub filter_type: String,
    /// Filter parameters
    #[serde(default)]
    pub params: Value,
}

/// Kind of row variable a group stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    /// Text value
    Text,
    /// Image file path
    Image,
}

/// What a data table must provide to drive a strategy
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DataRequirements {
    /// Group index to variable kind and target paths
    pub groups: BTreeMap<u32, GroupRequirement>,
    /// Export presets as seen by the data table author
    pub output_configs: Vec<OutputRequirement>,
}

/// Targets bound to a group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRequirement {
    /// Variable kind
    pub kind: GroupKind,
    /// Paths of every operation using the group
    pub targets: Vec<String>,
}

/// Summary of a render preset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRequirement {
    /// Preset name
    pub name: Option<String>,
    /// Filename template
    pub filename_template: String,
    /// Output folder
    pub output_path: String,
    /// Output format
    pub format: String,
}

impl StrategyDocument {
    /// Creates an empty strategy at the current schema version
    pub fn new() -> Self {
        Self {
            version: default_version(),
            operations: Vec::new(),
            renders: Vec::new(),
        }
    }

    /// Parses a strategy from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| BridgeError::Validation(format!("Invalid strategy document: {e}")))
    }

    /// Checks group numbering
    ///
    /// Groups are 1-based and share one sequence keyed by the row: text groups
    /// are dense from 1, and image groups continue densely after the highest
    /// text group. A group number used by both a text and an image operation
    /// is rejected. A version other than [`STRATEGY_VERSION`] is only logged.
    pub fn validate(&self) -> Result<()> {
        if self.version != STRATEGY_VERSION {
            tracing::warn!(
                version = %self.version,
                expected = STRATEGY_VERSION,
                "Strategy document version differs from the supported schema"
            );
        }

        let mut text_groups = BTreeSet::new();
        let mut image_groups = BTreeSet::new();
        for (index, op) in self.operations.iter().enumerate() {
            let (Some(group), Some(kind)) = (op.group, op.payload.group_kind()) else {
                continue;
            };
            if group == 0 {
                return Err(BridgeError::Validation(format!(
                    "operation {} ({}) uses group 0; groups are 1-based",
                    index + 1,
                    op.payload.type_name()
                )));
            }
            match kind {
                GroupKind::Text => text_groups.insert(group),
                GroupKind::Image => image_groups.insert(group),
            };
        }

        if let Some(shared) = text_groups.intersection(&image_groups).next() {
            return Err(BridgeError::Validation(format!(
                "group {shared} is used by both text and image operations"
            )));
        }

        let text_max = text_groups.last().copied().unwrap_or(0);
        check_dense("text", &text_groups, 1)?;
        check_dense("image", &image_groups, text_max + 1)
    }

    /// Lists the data a row table must supply
    pub fn data_requirements(&self) -> DataRequirements {
        let mut requirements = DataRequirements::default();

        for op in &self.operations {
            let (Some(group), Some(kind)) = (op.group, op.payload.group_kind()) else {
                continue;
            };
            if op.target_path.trim().is_empty() {
                continue;
            }
            let entry = requirements
                .groups
                .entry(group)
                .or_insert_with(|| GroupRequirement {
                    kind,
                    targets: Vec::new(),
                });
            if entry.kind != kind {
                tracing::warn!(
                    group,
                    path = %op.target_path,
                    "Group is bound to both text and image operations; target skipped"
                );
                continue;
            }
            entry.targets.push(op.target_path.clone());
        }

        requirements.output_configs = self
            .renders
            .iter()
            .map(|render| OutputRequirement {
                name: render.name.clone(),
                filename_template: render.filename.clone(),
                output_path: render.output_path.clone(),
                format: render.format.clone(),
            })
            .collect();

        requirements
    }
}

impl Default for StrategyDocument {
    fn default() -> Self {
        Self::new()
    }
}

/// Fails unless `groups` is exactly `start..=max`
fn check_dense(label: &str, groups: &BTreeSet<u32>, start: u32) -> Result<()> {
    let Some(&max) = groups.last() else {
        return Ok(());
    };
    let missing: Vec<String> = (start..=max)
        .filter(|g| !groups.contains(g))
        .map(|g| g.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(BridgeError::Validation(format!(
            "{label} groups must be dense from {start}; missing: {}",
            missing.join(", ")
        )));
    }
    Ok(())
}

fn default_version() -> String {
    STRATEGY_VERSION.to_string()
}

fn default_filename() -> String {
    "export_{index}".to_string()
}

fn default_output_path() -> String {
    ".".to_string()
}

fn default_format() -> String {
    "jpg".to_string()
}

fn default_ppi() -> u32 {
    300
}
