//! Offset Locator: live selection to flattened text offsets.

use crate::tree::NodeTree;

/// A captured selection as flattened text positions. `start == end`
/// denotes a collapsed caret.
///
/// Snapshots are created on every input event before the model mutates
/// and consumed exactly once, immediately after the surface is
/// replaced; they are never retained across unrelated renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaretSnapshot {
    pub start: usize,
    pub end: usize,
}

impl CaretSnapshot {
    pub fn collapsed(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// Compute the flattened text offsets of the container's live
/// selection.
///
/// For each selection boundary this counts the characters that occur
/// strictly before it when text nodes are visited in depth-first
/// pre-order — the same order [`super::restore::resolve`] walks, which
/// is what makes locate/resolve a round trip. A boundary inside an
/// element resolves to the end of the nearest preceding text content.
///
/// Returns `None` when there is no selection or when either boundary
/// lies outside the container.
pub fn locate(tree: &NodeTree) -> Option<CaretSnapshot> {
    let selection = tree.selection()?;
    let anchor = tree.boundary_offset(&selection.anchor)?;
    let focus = tree.boundary_offset(&selection.focus)?;
    Some(CaretSnapshot {
        start: anchor.min(focus),
        end: anchor.max(focus),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{MarkdownRenderer, Renderer};
    use crate::tree::{Boundary, NodeId, Selection};
    use pretty_assertions::assert_eq;

    fn tree_for(source: &str) -> NodeTree {
        let fragment = MarkdownRenderer::source_faithful().render(source).unwrap();
        let mut tree = NodeTree::new();
        tree.commit(fragment);
        tree
    }

    fn first_text_node(tree: &NodeTree) -> NodeId {
        // Walk manually: root is NodeId(0); scan arena order, which is
        // safe here because commit preserves fragment allocation order.
        (0..)
            .map(NodeId)
            .find(|&id| matches!(tree.node(id), crate::tree::Node::Text(_)))
            .unwrap()
    }

    #[test]
    fn no_selection_locates_none() {
        let tree = tree_for("hello");
        assert_eq!(locate(&tree), None);
    }

    #[test]
    fn caret_at_end_of_single_text_node() {
        let mut tree = tree_for("hello");
        let text = first_text_node(&tree);
        tree.set_selection(Selection::collapsed(Boundary { node: text, offset: 5 }));
        assert_eq!(locate(&tree), Some(CaretSnapshot { start: 5, end: 5 }));
    }

    #[test]
    fn range_selection_is_ordered() {
        let mut tree = tree_for("hello");
        let text = first_text_node(&tree);
        // Focus before anchor: locate still reports start <= end.
        tree.set_selection(Selection {
            anchor: Boundary { node: text, offset: 4 },
            focus: Boundary { node: text, offset: 1 },
        });
        assert_eq!(locate(&tree), Some(CaretSnapshot { start: 1, end: 4 }));
    }

    #[test]
    fn boundary_in_element_counts_preceding_text() {
        let mut tree = tree_for("**bold** tail");
        // Boundary after the paragraph's first child (the strong span).
        let root = tree.root();
        let crate::tree::Node::Element { children, .. } = tree.node(root) else {
            unreachable!()
        };
        let paragraph = children[0];
        tree.set_selection(Selection::collapsed(Boundary { node: paragraph, offset: 1 }));
        let snap = locate(&tree).unwrap();
        assert_eq!(snap.start, "**bold**".len());
        assert!(snap.is_collapsed());
    }

    #[test]
    fn foreign_boundary_locates_none() {
        let mut tree = tree_for("hello");
        tree.set_selection(Selection::collapsed(Boundary { node: NodeId(999), offset: 0 }));
        assert_eq!(locate(&tree), None);
    }
}
