//! Editable text layer discovery

use crate::domain::{EditableText, LayerId, LayerKind, LayerNode};
use serde::Serialize;

/// A text layer that can be targeted by `update_text_layer`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditableLayer {
    pub id: LayerId,
    pub name: String,
    pub info: EditableText,
    /// Enclosing smart objects, outermost first
    pub parent_chain: Vec<LayerId>,
}

impl EditableLayer {
    /// Innermost enclosing smart object, if any
    pub fn parent_smart_object(&self) -> Option<LayerId> {
        self.parent_chain.last().copied()
    }
}

/// Collects every TEXT layer carrying editable info, in tree order
///
/// Smart objects extend the chain of their descendants and are not
/// themselves reported. Nothing below `max_depth` levels is visited.
pub fn extract_editable_layers(tree: &[LayerNode], max_depth: usize) -> Vec<EditableLayer> {
    let mut found = Vec::new();
    walk(tree, &[], 0, max_depth, &mut found);
    found
}

fn walk(
    nodes: &[LayerNode],
    chain: &[LayerId],
    depth: usize,
    max_depth: usize,
    found: &mut Vec<EditableLayer>,
) {
    if depth >= max_depth {
        return;
    }
    for node in nodes {
        match node.kind {
            LayerKind::Text => {
                if let Some(info) = &node.editable {
                    found.push(EditableLayer {
                        id: node.id,
                        name: node.name.clone(),
                        info: info.clone(),
                        parent_chain: chain.to_vec(),
                    });
                }
            }
            LayerKind::SmartObject => {
                let mut inner = chain.to_vec();
                inner.push(node.id);
                walk(&node.children, &inner, depth + 1, max_depth, found);
            }
            LayerKind::Group => walk(&node.children, chain, depth + 1, max_depth, found),
            LayerKind::Pixel => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_with_chains() {
        let tree = vec![
            LayerNode::text(1, "Headline", "a"),
            LayerNode::new(2, "Plain", LayerKind::Text),
            LayerNode::group(
                3,
                "G",
                vec![LayerNode::smart_object(
                    10,
                    "SO",
                    vec![LayerNode::smart_object(9, "SO2", vec![LayerNode::text(44, "Deep", "b")])],
                )],
            ),
        ];

        let layers = extract_editable_layers(&tree, 16);
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].id, LayerId::new(1));
        assert!(layers[0].parent_chain.is_empty());
        assert_eq!(layers[0].parent_smart_object(), None);
        assert_eq!(layers[1].id, LayerId::new(44));
        assert_eq!(layers[1].parent_chain, vec![LayerId::new(10), LayerId::new(9)]);
        assert_eq!(layers[1].parent_smart_object(), Some(LayerId::new(9)));
        assert_eq!(layers[1].info.text, "b");
    }

    #[test]
    fn test_depth_limit_stops_descent() {
        let tree = vec![LayerNode::group(
            1,
            "A",
            vec![LayerNode::group(2, "B", vec![LayerNode::text(3, "C", "c")])],
        )];
        assert_eq!(extract_editable_layers(&tree, 3).len(), 1);
        assert!(extract_editable_layers(&tree, 2).is_empty());
    }
}
