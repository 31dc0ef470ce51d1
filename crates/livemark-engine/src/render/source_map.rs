//! Source-offset mapping for marker-stripped renders.
//!
//! A [`RenderStyle::Clean`](super::RenderStyle::Clean) tree drops marker
//! characters, so a flattened text offset into it no longer equals the
//! offset into the markdown source. This module maps between the two
//! with an explicit per-element overhead table plus a recursive length
//! function and a cumulative-length search — nothing is inferred from
//! node content.
//!
//! The table is the single source of truth for marker costs. Overheads
//! are stated in characters of source text:
//!
//! | element        | prefix            | suffix            |
//! |----------------|-------------------|-------------------|
//! | heading (n)    | n + 1 (`#…# `)    | 0                 |
//! | emphasis       | 1 (`*`)           | 1 (`*`)           |
//! | strong         | 2 (`**`)          | 2 (`**`)          |
//! | strikethrough  | 2 (`~~`)          | 2 (`~~`)          |
//! | code span      | 1 (`` ` ``)       | 1 (`` ` ``)       |
//! | link (href)    | 1 (`[`)           | 3 + len (`](…)`)  |
//! | image (src)    | 2 (`![`)          | 3 + len (`](…)`)  |
//! | code block     | 4 + lang (```` ```lang\n ````) | 3 (```` ``` ````) |
//! | list item      | 2 (`- `)          | 0                 |
//! | block quote    | 2 (`> `)          | 0                 |
//! | thematic break | 3 (`---`)         | 0                 |
//! | hard break     | 2 (trailing `␠␠`) | 0                 |
//! | others         | 0                 | 0                 |
//!
//! Multi-line prefixes (every quoted line's `> `, nested list
//! indentation) are charged for the first line only; the mapping is
//! exact for single-line constructs and a documented approximation for
//! line-repeated ones.

use crate::tree::{ElementKind, Node, NodeId, NodeTree};

/// Source-character cost of an element's markers around its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerOverhead {
    pub prefix: usize,
    pub suffix: usize,
}

impl MarkerOverhead {
    const NONE: Self = Self { prefix: 0, suffix: 0 };

    fn symmetric(width: usize) -> Self {
        Self { prefix: width, suffix: width }
    }
}

/// The marker-overhead table.
pub fn overhead(kind: &ElementKind) -> MarkerOverhead {
    match kind {
        ElementKind::Heading { level } => MarkerOverhead {
            prefix: *level as usize + 1,
            suffix: 0,
        },
        ElementKind::Emphasis => MarkerOverhead::symmetric(1),
        ElementKind::Strong | ElementKind::Strikethrough => MarkerOverhead::symmetric(2),
        ElementKind::CodeSpan => MarkerOverhead::symmetric(1),
        ElementKind::Link { href } => MarkerOverhead {
            prefix: 1,
            suffix: 3 + href.chars().count(),
        },
        ElementKind::Image { src } => MarkerOverhead {
            prefix: 2,
            suffix: 3 + src.chars().count(),
        },
        ElementKind::CodeBlock { lang } => MarkerOverhead {
            prefix: 4 + lang.as_deref().map_or(0, |l| l.chars().count()),
            suffix: 3,
        },
        ElementKind::ListItem => MarkerOverhead { prefix: 2, suffix: 0 },
        ElementKind::BlockQuote => MarkerOverhead { prefix: 2, suffix: 0 },
        ElementKind::ThematicBreak => MarkerOverhead { prefix: 3, suffix: 0 },
        ElementKind::HardBreak => MarkerOverhead { prefix: 2, suffix: 0 },
        ElementKind::Root
        | ElementKind::Paragraph
        | ElementKind::HtmlBlock
        | ElementKind::List { .. }
        | ElementKind::BlockSeparator => MarkerOverhead::NONE,
    }
}

/// Source-character length of the subtree at `id`: rendered text plus
/// the marker overhead of every element in it.
pub fn source_len(tree: &NodeTree, id: NodeId) -> usize {
    match tree.node(id) {
        Node::Text(s) => s.chars().count(),
        Node::Element { kind, children } => {
            let oh = overhead(kind);
            oh.prefix
                + children.iter().map(|&c| source_len(tree, c)).sum::<usize>()
                + oh.suffix
        }
    }
}

/// Map a flattened text offset into the clean-rendered `tree` to the
/// equivalent character offset into the markdown source.
///
/// Offsets past the total text length clamp to the end. Offsets on a
/// boundary between nodes attach to the earlier node's end, matching
/// the resolver's convention.
pub fn source_offset(tree: &NodeTree, text_offset: usize) -> usize {
    let root = tree.root();
    let clamped = text_offset.min(tree.subtree_text_len(root));
    offset_within(tree, root, clamped)
}

fn offset_within(tree: &NodeTree, id: NodeId, offset: usize) -> usize {
    match tree.node(id) {
        // Text maps one-to-one.
        Node::Text(_) => offset,
        Node::Element { kind, children } => {
            let oh = overhead(kind);

            // Cumulative rendered-text lengths per child; the search
            // finds the first child whose span reaches the offset.
            let texts: Vec<usize> = children.iter().map(|&c| tree.subtree_text_len(c)).collect();
            let cumulative: Vec<usize> = texts
                .iter()
                .scan(0, |acc, t| {
                    *acc += t;
                    Some(*acc)
                })
                .collect();

            let idx = cumulative.partition_point(|&c| c < offset);
            let source_before = |n: usize| -> usize {
                oh.prefix
                    + children[..n]
                        .iter()
                        .map(|&c| source_len(tree, c))
                        .sum::<usize>()
            };

            if idx == children.len() {
                // Past all children: before this element's suffix.
                return source_before(children.len());
            }
            if texts[idx] == 0 {
                // A textless child (rule, separator) cannot contain a
                // position; the offset sits just before it.
                return source_before(idx);
            }

            let text_before = cumulative[idx] - texts[idx];
            source_before(idx) + offset_within(tree, children[idx], offset - text_before)
        }
    }
}
