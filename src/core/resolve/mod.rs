//! Layer path resolution
//!
//! Turns human-readable paths into layer ids plus the chain of enclosing
//! smart objects, against a tree fetched from the peer.

pub mod editable;
pub mod path;
pub mod snapshot;

pub use editable::{extract_editable_layers, EditableLayer};
pub use path::{
    join_path, path_resolves, resolve_path, split_path, Resolution, DEFAULT_MAX_DEPTH,
    PATH_DELIMITER,
};
pub use snapshot::TreeSnapshot;
