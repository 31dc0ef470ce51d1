//! Offset Resolver: flattened text offsets back to a live selection.

use crate::editing::CaretSnapshot;
use crate::tree::{Boundary, Node, NodeTree, Selection};

/// Re-establish the selection described by `snapshot` on `tree`,
/// replacing any existing selection.
///
/// Walks the container's descendants in depth-first pre-order with an
/// explicit work-list (arbitrarily deep trees must not exhaust call
/// depth), keeping a running character counter. A text node of length
/// `L` starting at `char_index` contains a position `p` when
/// `char_index <= p <= char_index + L`; start and end are found in one
/// continued scan and committed as a single range.
///
/// Positions beyond the total text length clamp to the end of the last
/// text node. A tree with no text nodes collapses the selection at the
/// root.
pub fn resolve(tree: &mut NodeTree, snapshot: &CaretSnapshot) {
    let mut start: Option<Boundary> = None;
    let mut end: Option<Boundary> = None;
    let mut last_text: Option<(crate::tree::NodeId, usize)> = None;

    let mut char_index = 0usize;
    let mut stack = vec![tree.root()];
    while let Some(id) = stack.pop() {
        match tree.node(id) {
            Node::Text(s) => {
                let len = s.chars().count();
                let next_char_index = char_index + len;
                if start.is_none() && snapshot.start <= next_char_index {
                    start = Some(Boundary { node: id, offset: snapshot.start - char_index });
                }
                if start.is_some() && end.is_none() && snapshot.end <= next_char_index {
                    end = Some(Boundary { node: id, offset: snapshot.end - char_index });
                    break;
                }
                char_index = next_char_index;
                last_text = Some((id, len));
            }
            Node::Element { children, .. } => {
                stack.extend(children.iter().rev());
            }
        }
    }

    // Clamp whatever was not reached to the last available position.
    let fallback = match last_text {
        Some((id, len)) => Boundary { node: id, offset: len },
        None => {
            tracing::trace!("resolving against a textless tree; collapsing at root");
            Boundary { node: tree.root(), offset: 0 }
        }
    };
    let start = start.unwrap_or(fallback);
    let end = end.unwrap_or(fallback);

    tree.set_selection(Selection { anchor: start, focus: end });
}
