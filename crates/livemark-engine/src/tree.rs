//! Rendered node tree and live selection.
//!
//! This module is the engine's stand-in for the host's mutable node tree
//! (a browser DOM, a widget tree). Nodes live in a flat arena indexed by
//! [`NodeId`], so traversals are explicit work-list walks over indices and
//! never recurse.
//!
//! Two text readings exist and are deliberately distinct:
//!
//! - [`NodeTree::text_content`] concatenates text nodes in depth-first
//!   pre-order. This is the coordinate system for caret offsets
//!   (`Flattened Text Position`).
//! - [`NodeTree::displayed_text`] is what the user "sees" as plain text:
//!   the same concatenation, with each [`ElementKind::BlockSeparator`]
//!   contributing a paragraph break. The reconcile loop derives the new
//!   source document from this reading.
//!
//! The separator element itself holds no text, so it never shifts caret
//! offsets.

use std::ops::Range;

/// Index of a node in a [`NodeTree`] or [`Fragment`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// Element classification for styling and text measurement.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    /// Container root; exactly one per tree.
    Root,
    Paragraph,
    Heading { level: u8 },
    BlockQuote,
    CodeBlock { lang: Option<String> },
    HtmlBlock,
    List { ordered: bool },
    ListItem,
    Emphasis,
    Strong,
    Strikethrough,
    CodeSpan,
    Link { href: String },
    Image { src: String },
    ThematicBreak,
    HardBreak,
    /// Visual gap between independently rendered blocks. Contributes a
    /// paragraph break to [`NodeTree::displayed_text`] and nothing to
    /// caret offsets.
    BlockSeparator,
}

impl ElementKind {
    /// Separator contribution to the displayed plain text.
    pub(crate) fn displayed_separator(&self) -> Option<&'static str> {
        match self {
            ElementKind::BlockSeparator => Some("\n\n"),
            _ => None,
        }
    }
}

/// A node: either a run of text or an element with ordered children.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Element { kind: ElementKind, children: Vec<NodeId> },
}

/// One end of a selection: a node plus an offset inside it.
///
/// For a text node the offset is a character index into its content
/// (`0..=len`). For an element it is a child index, addressing the gap
/// before that child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    pub node: NodeId,
    pub offset: usize,
}

/// The live selection: anchor and focus boundary points. A collapsed
/// caret has `anchor == focus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Boundary,
    pub focus: Boundary,
}

impl Selection {
    pub fn collapsed(at: Boundary) -> Self {
        Self { anchor: at, focus: at }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

/// Renderer output: a detached arena of nodes with an ordered list of
/// top-level roots, ready to be committed into a [`NodeTree`].
///
/// Ids handed out by a fragment are local to that fragment until
/// [`NodeTree::commit`] grafts them in.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Fragment {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
}

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a detached element node.
    pub fn element(&mut self, kind: ElementKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::Element { kind, children: Vec::new() });
        id
    }

    /// Allocate a detached text node.
    pub fn text(&mut self, content: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::Text(content.into()));
        id
    }

    /// Append `child` to `parent`'s child list.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        match &mut self.nodes[parent.0] {
            Node::Element { children, .. } => children.push(child),
            Node::Text(_) => panic!("text nodes cannot have children"),
        }
    }

    /// Append a node as a top-level root of the fragment.
    pub fn append_root(&mut self, id: NodeId) {
        self.roots.push(id);
    }

    /// Splice all of `other`'s nodes and roots onto the end of `self`.
    pub fn extend(&mut self, other: Fragment) {
        let base = self.nodes.len();
        for node in other.nodes {
            self.nodes.push(match node {
                Node::Text(s) => Node::Text(s),
                Node::Element { kind, children } => Node::Element {
                    kind,
                    children: children.into_iter().map(|c| NodeId(c.0 + base)).collect(),
                },
            });
        }
        self.roots.extend(other.roots.into_iter().map(|r| NodeId(r.0 + base)));
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Concatenated text-node content of the fragment, pre-order.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            match &self.nodes[id.0] {
                Node::Text(s) => out.push_str(s),
                Node::Element { children, .. } => {
                    stack.extend(children.iter().rev());
                }
            }
        }
        out
    }
}

/// The mutable rendered container owned by the reconcile loop.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeTree {
    nodes: Vec<Node>,
    root: NodeId,
    selection: Option<Selection>,
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::Element { kind: ElementKind::Root, children: Vec::new() }],
            root: NodeId(0),
            selection: None,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Replace the live selection wholesale.
    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = Some(selection);
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Replace the entire rendered surface with `fragment`'s content.
    ///
    /// All prior nodes are dropped and the selection is cleared; the
    /// caller restores it afterwards from a captured snapshot.
    pub fn commit(&mut self, fragment: Fragment) {
        let Fragment { nodes, roots } = fragment;
        let mut arena = Vec::with_capacity(nodes.len() + 1);
        arena.push(Node::Element {
            kind: ElementKind::Root,
            children: roots.iter().map(|r| NodeId(r.0 + 1)).collect(),
        });
        for node in nodes {
            arena.push(match node {
                Node::Text(s) => Node::Text(s),
                Node::Element { kind, children } => Node::Element {
                    kind,
                    children: children.into_iter().map(|c| NodeId(c.0 + 1)).collect(),
                },
            });
        }
        tracing::trace!(nodes = arena.len(), "committing rendered tree");
        self.nodes = arena;
        self.root = NodeId(0);
        self.selection = None;
    }

    /// Depth-first pre-order walk from the root, as an explicit work list.
    fn walk(&self) -> TreeWalk<'_> {
        TreeWalk { tree: self, stack: vec![self.root] }
    }

    /// Total character count of all text nodes.
    pub fn total_text_len(&self) -> usize {
        self.walk()
            .filter_map(|id| match self.node(id) {
                Node::Text(s) => Some(s.chars().count()),
                Node::Element { .. } => None,
            })
            .sum()
    }

    /// Character count of the subtree rooted at `id`.
    pub fn subtree_text_len(&self, id: NodeId) -> usize {
        let mut total = 0;
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            match self.node(id) {
                Node::Text(s) => total += s.chars().count(),
                Node::Element { children, .. } => stack.extend(children.iter().rev()),
            }
        }
        total
    }

    /// Concatenation of all text nodes in depth-first pre-order. The
    /// caret coordinate system measures into this string.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for id in self.walk() {
            if let Node::Text(s) = self.node(id) {
                out.push_str(s);
            }
        }
        out
    }

    /// The displayed plain text: text nodes plus a paragraph break for
    /// each block separator element.
    pub fn displayed_text(&self) -> String {
        let mut out = String::new();
        for id in self.walk() {
            match self.node(id) {
                Node::Text(s) => out.push_str(s),
                Node::Element { kind, .. } => {
                    if let Some(sep) = kind.displayed_separator() {
                        out.push_str(sep);
                    }
                }
            }
        }
        out
    }

    /// Flattened text offset of a boundary point, or `None` if the
    /// boundary's node is not in this tree.
    ///
    /// A boundary inside an element resolves to the end of the text that
    /// precedes its addressed child gap, which is the nearest preceding
    /// text position.
    pub fn boundary_offset(&self, boundary: &Boundary) -> Option<usize> {
        let mut acc = 0;
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if id == boundary.node {
                return match self.node(id) {
                    Node::Text(s) => Some(acc + boundary.offset.min(s.chars().count())),
                    Node::Element { children, .. } => {
                        let prefix: usize = children
                            .iter()
                            .take(boundary.offset)
                            .map(|&c| self.subtree_text_len(c))
                            .sum();
                        Some(acc + prefix)
                    }
                };
            }
            match self.node(id) {
                Node::Text(s) => acc += s.chars().count(),
                Node::Element { children, .. } => stack.extend(children.iter().rev()),
            }
        }
        None
    }

    /// Replace a range of the flattened text with `replacement`,
    /// splicing through as many text nodes as the range covers, and
    /// collapse the selection after the inserted text.
    ///
    /// This models the platform's default editing of the displayed
    /// content; the reconcile loop is notified separately.
    pub fn replace_text_range(&mut self, range: Range<usize>, replacement: &str) {
        debug_assert!(range.start <= range.end);
        let total = self.total_text_len();
        let start = range.start.min(total);
        let end = range.end.min(total).max(start);

        // Collect text nodes in document order first; splicing does not
        // change the tree shape.
        let text_nodes: Vec<NodeId> = self
            .walk()
            .filter(|&id| matches!(self.node(id), Node::Text(_)))
            .collect();

        if text_nodes.is_empty() {
            // Empty surface: materialize a text node under the root.
            let id = NodeId(self.nodes.len());
            self.nodes.push(Node::Text(replacement.to_string()));
            let root = self.root;
            if let Node::Element { children, .. } = &mut self.nodes[root.0] {
                children.push(id);
            }
            self.selection = Some(Selection::collapsed(Boundary {
                node: id,
                offset: replacement.chars().count(),
            }));
            return;
        }

        let mut caret: Option<Boundary> = None;
        let mut pos = 0;
        for id in text_nodes {
            let len = match self.node(id) {
                Node::Text(s) => s.chars().count(),
                Node::Element { .. } => unreachable!(),
            };
            let node_start = pos;
            let node_end = pos + len;
            pos = node_end;

            // The insertion point belongs to the first node whose span
            // can hold it; deletions trim every overlapping node.
            let inserts_here = caret.is_none() && start <= node_end;
            let overlap_start = start.max(node_start);
            let overlap_end = end.min(node_end);

            if !inserts_here && overlap_start >= overlap_end {
                continue;
            }

            let Node::Text(content) = &mut self.nodes[id.0] else {
                unreachable!()
            };
            let mut chars: Vec<char> = content.chars().collect();
            if overlap_start < overlap_end {
                chars.drain(overlap_start - node_start..overlap_end - node_start);
            }
            if inserts_here {
                let local = start - node_start;
                chars.splice(local..local, replacement.chars());
                caret = Some(Boundary {
                    node: id,
                    offset: local + replacement.chars().count(),
                });
            }
            *content = chars.into_iter().collect();
        }

        if let Some(caret) = caret {
            self.selection = Some(Selection::collapsed(caret));
        }
    }

    /// Insert text at the current selection, replacing its content if it
    /// is a range. No-op without a selection.
    pub fn insert_at_selection(&mut self, text: &str) {
        let Some((start, end)) = self.selection_offsets() else {
            return;
        };
        self.replace_text_range(start..end, text);
    }

    /// Delete one character before a collapsed caret, or the selected
    /// range. Returns whether anything changed.
    pub fn delete_backward(&mut self) -> bool {
        let Some((start, end)) = self.selection_offsets() else {
            return false;
        };
        if start < end {
            self.replace_text_range(start..end, "");
            true
        } else if start > 0 {
            self.replace_text_range(start - 1..start, "");
            true
        } else {
            false
        }
    }

    /// Current selection as ordered flattened offsets.
    pub fn selection_offsets(&self) -> Option<(usize, usize)> {
        let selection = self.selection.as_ref()?;
        let a = self.boundary_offset(&selection.anchor)?;
        let b = self.boundary_offset(&selection.focus)?;
        Some((a.min(b), a.max(b)))
    }
}

struct TreeWalk<'a> {
    tree: &'a NodeTree,
    stack: Vec<NodeId>,
}

impl Iterator for TreeWalk<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        if let Node::Element { children, .. } = self.tree.node(id) {
            self.stack.extend(children.iter().rev());
        }
        Some(id)
    }
}
