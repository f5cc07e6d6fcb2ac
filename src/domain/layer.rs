//! Layer tree model
//!
//! A [`LayerNode`] tree is fetched fresh from the peer before every batch and
//! is never cached across edits.

use super::ids::LayerId;
use serde::{Deserialize, Serialize};

/// Kind of a layer as reported by the peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LayerKind {
    /// Text layer
    Text,
    /// Nested container holding an embedded sub-document
    #[serde(rename = "SMARTOBJECT")]
    SmartObject,
    /// Plain group; transparent for addressing
    Group,
    /// Anything else
    #[serde(other)]
    Pixel,
}

impl LayerKind {
    /// Wire name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Text => "TEXT",
            LayerKind::SmartObject => "SMARTOBJECT",
            LayerKind::Group => "GROUP",
            LayerKind::Pixel => "PIXEL",
        }
    }
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text properties attached to editable text layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EditableText {
    /// Current text contents
    #[serde(default)]
    pub text: String,
    /// Font name
    #[serde(default)]
    pub font: Option<String>,
    /// Font size in points
    #[serde(default)]
    pub size: Option<f64>,
    /// Hex color
    #[serde(default)]
    pub color: Option<String>,
}

/// One node of the peer's layer tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerNode {
    /// Peer-assigned id
    pub id: LayerId,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Layer kind
    #[serde(default = "default_kind")]
    pub kind: LayerKind,
    /// Text properties, only present on editable text layers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editable: Option<EditableText>,
    /// Ordered children (groups and opened smart objects)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<LayerNode>,
}

fn default_kind() -> LayerKind {
    LayerKind::Pixel
}

impl LayerNode {
    /// Creates a childless node
    pub fn new(id: i64, name: impl Into<String>, kind: LayerKind) -> Self {
        Self {
            id: LayerId::new(id),
            name: name.into(),
            kind,
            editable: None,
            children: Vec::new(),
        }
    }

    /// Creates an editable text layer
    pub fn text(id: i64, name: impl Into<String>, contents: impl Into<String>) -> Self {
        let mut node = Self::new(id, name, LayerKind::Text);
        node.editable = Some(EditableText {
            text: contents.into(),
            ..EditableText::default()
        });
        node
    }

    /// Creates a group with children
    pub fn group(id: i64, name: impl Into<String>, children: Vec<LayerNode>) -> Self {
        Self::new(id, name, LayerKind::Group).with_children(children)
    }

    /// Creates a smart object with its embedded children
    pub fn smart_object(id: i64, name: impl Into<String>, children: Vec<LayerNode>) -> Self {
        Self::new(id, name, LayerKind::SmartObject).with_children(children)
    }

    /// Replaces the children
    pub fn with_children(mut self, children: Vec<LayerNode>) -> Self {
        self.children = children;
        self
    }
}
