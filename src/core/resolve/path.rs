//! Hierarchical path resolution
//!
//! A path is a list of layer names joined by `>`, e.g.
//! `Root > Card > Title`. The first segment must equal the root token
//! exactly; later segments match layer names case-insensitively.

use crate::domain::{LayerId, LayerKind, LayerNode};

/// Delimiter written between path segments
pub const PATH_DELIMITER: &str = " > ";

/// Default depth bound for tree walks
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// Outcome of resolving one path
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Resolution {
    /// Leaf id; `None` when some segment did not match
    pub layer_id: Option<LayerId>,
    /// Enclosing smart objects, outermost first, accumulated so far
    pub parent_chain: Vec<LayerId>,
    /// Leaf kind when resolved
    pub kind: Option<LayerKind>,
}

impl Resolution {
    fn unresolved(parent_chain: Vec<LayerId>) -> Self {
        Self {
            layer_id: None,
            parent_chain,
            kind: None,
        }
    }

    /// Whether the path matched a layer
    pub fn is_resolved(&self) -> bool {
        self.layer_id.is_some()
    }
}

/// Splits a path into trimmed segments
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('>').map(str::trim).collect()
}

/// Joins segments into a path string
pub fn join_path<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(PATH_DELIMITER)
}

/// Resolves `path` against `tree`
///
/// Walking down, a matched SMARTOBJECT appends its id to the chain and its
/// children are searched next; a matched GROUP is descended without touching
/// the chain. A name match on any other kind before the last segment is
/// passed over and the search continues with its siblings. Paths deeper than
/// `max_depth` below the root do not resolve.
pub fn resolve_path(
    tree: &[LayerNode],
    path: &str,
    root_token: &str,
    max_depth: usize,
) -> Resolution {
    let segments = split_path(path);
    let Some((root, rest)) = segments.split_first() else {
        return Resolution::default();
    };
    if *root != root_token || rest.is_empty() || rest.len() > max_depth {
        return Resolution::default();
    }

    let mut nodes = tree;
    let mut chain = Vec::new();

    for (position, segment) in rest.iter().enumerate() {
        let is_last = position + 1 == rest.len();
        let target = segment.to_lowercase();

        let mut next = None;
        for node in nodes {
            if node.name.to_lowercase() != target {
                continue;
            }
            if is_last {
                return Resolution {
                    layer_id: Some(node.id),
                    parent_chain: chain,
                    kind: Some(node.kind),
                };
            }
            match node.kind {
                LayerKind::SmartObject => {
                    chain.push(node.id);
                    next = Some(node.children.as_slice());
                    break;
                }
                LayerKind::Group => {
                    next = Some(node.children.as_slice());
                    break;
                }
                _ => {}
            }
        }

        match next {
            Some(children) => nodes = children,
            None => return Resolution::unresolved(chain),
        }
    }

    Resolution::unresolved(chain)
}

/// Whether `path` still resolves against `tree`
pub fn path_resolves(tree: &[LayerNode], path: &str, root_token: &str, max_depth: usize) -> bool {
    resolve_path(tree, path, root_token, max_depth).is_resolved()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn sample_tree() -> Vec<LayerNode> {
        vec![
            LayerNode::text(1, "T1", "old"),
            LayerNode::group(
                2,
                "Header",
                vec![
                    LayerNode::new(20, "Logo", LayerKind::Pixel),
                    LayerNode::smart_object(
                        10,
                        "Card",
                        vec![
                            LayerNode::smart_object(9, "Inner", vec![LayerNode::text(44, "Title", "x")]),
                            LayerNode::text(45, "Subtitle", "y"),
                        ],
                    ),
                ],
            ),
            LayerNode::new(3, "Photo", LayerKind::Pixel),
            LayerNode::group(4, "Photo", vec![LayerNode::new(40, "Frame", LayerKind::Pixel)]),
        ]
    }

    #[test]
    fn test_resolve_top_level() {
        let r = resolve_path(&sample_tree(), "Root > T1", "Root", DEFAULT_MAX_DEPTH);
        assert_eq!(r.layer_id, Some(LayerId::new(1)));
        assert!(r.parent_chain.is_empty());
        assert_eq!(r.kind, Some(LayerKind::Text));
    }

    #[test]
    fn test_groups_are_transparent_and_smart_objects_extend_chain() {
        let r = resolve_path(
            &sample_tree(),
            "Root > Header > Card > Inner > Title",
            "Root",
            DEFAULT_MAX_DEPTH,
        );
        assert_eq!(r.layer_id, Some(LayerId::new(44)));
        assert_eq!(r.parent_chain, vec![LayerId::new(10), LayerId::new(9)]);
        assert_eq!(r.kind, Some(LayerKind::Text));
    }

    #[test_case("Root > header > CARD > subtitle")]
    #[test_case("Root>Header>Card>Subtitle")]
    #[test_case("  Root  >  HEADER >card >  SUBTITLE ")]
    fn test_case_and_spacing_insensitive_segments(path: &str) {
        let r = resolve_path(&sample_tree(), path, "Root", DEFAULT_MAX_DEPTH);
        assert_eq!(r.layer_id, Some(LayerId::new(45)));
        assert_eq!(r.parent_chain, vec![LayerId::new(10)]);
    }

    #[test_case("root > T1" ; "root token is case sensitive")]
    #[test_case("Main > T1" ; "wrong root token")]
    #[test_case("Root" ; "root only")]
    #[test_case("" ; "empty path")]
    fn test_root_token_rules(path: &str) {
        assert!(!path_resolves(&sample_tree(), path, "Root", DEFAULT_MAX_DEPTH));
    }

    #[test]
    fn test_failure_keeps_accumulated_chain() {
        let r = resolve_path(
            &sample_tree(),
            "Root > Header > Card > Missing",
            "Root",
            DEFAULT_MAX_DEPTH,
        );
        assert_eq!(r.layer_id, None);
        assert_eq!(r.parent_chain, vec![LayerId::new(10)]);
        assert_eq!(r.kind, None);
    }

    #[test]
    fn test_non_container_match_is_skipped_for_descent() {
        let r = resolve_path(&sample_tree(), "Root > Photo > Frame", "Root", DEFAULT_MAX_DEPTH);
        assert_eq!(r.layer_id, Some(LayerId::new(40)));
    }

    #[test]
    fn test_depth_bound() {
        let r = resolve_path(
            &sample_tree(),
            "Root > Header > Card > Inner > Title",
            "Root",
            3,
        );
        assert!(!r.is_resolved());
    }

    #[test]
    fn test_custom_root_token() {
        assert!(path_resolves(&sample_tree(), "主文档 > T1", "主文档", DEFAULT_MAX_DEPTH));
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path(&["Root", "Card", "Title"]), "Root > Card > Title");
    }
}
