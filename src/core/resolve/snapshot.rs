//! One fetched layer tree with memoized path lookups

use super::editable::{extract_editable_layers, EditableLayer};
use super::path::{resolve_path, Resolution};
use crate::domain::LayerNode;
use std::collections::HashMap;

/// A layer tree as fetched for one batch
///
/// Resolutions are cached by path string; the snapshot is discarded with the
/// batch, so cached ids never outlive the tree they came from.
#[derive(Debug, Clone)]
pub struct TreeSnapshot {
    tree: Vec<LayerNode>,
    root_token: String,
    max_depth: usize,
    memo: HashMap<String, Resolution>,
}

impl TreeSnapshot {
    pub fn new(tree: Vec<LayerNode>, root_token: impl Into<String>, max_depth: usize) -> Self {
        Self {
            tree,
            root_token: root_token.into(),
            max_depth,
            memo: HashMap::new(),
        }
    }

    /// The underlying tree
    pub fn tree(&self) -> &[LayerNode] {
        &self.tree
    }

    /// Resolves `path`, reusing an earlier answer for the same string
    pub fn resolve(&mut self, path: &str) -> Resolution {
        if let Some(hit) = self.memo.get(path) {
            return hit.clone();
        }
        let resolution = resolve_path(&self.tree, path, &self.root_token, self.max_depth);
        self.memo.insert(path.to_string(), resolution.clone());
        resolution
    }

    /// Number of distinct paths resolved so far
    pub fn cached_paths(&self) -> usize {
        self.memo.len()
    }

    /// Editable text layers of this tree
    pub fn editable_layers(&self) -> Vec<EditableLayer> {
        extract_editable_layers(&self.tree, self.max_depth)
    }
}
