//! Markdown renderer over pulldown-cmark.
//!
//! Two styles:
//!
//! - [`RenderStyle::SourceFaithful`] keeps every source character as
//!   literal text inside the styled nodes (live-preview style). The
//!   produced fragment's flattened text equals the input byte-for-byte,
//!   which is what lets the reconcile loop read the source back out of
//!   the rendered surface.
//! - [`RenderStyle::Clean`] drops marker characters the way an HTML
//!   renderer would; offsets into the result map back to the source via
//!   [`super::source_map`].

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag};

use super::{RenderError, Renderer};
use crate::tree::{ElementKind, Fragment, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderStyle {
    #[default]
    SourceFaithful,
    Clean,
}

#[derive(Debug, Clone, Default)]
pub struct MarkdownRenderer {
    style: RenderStyle,
}

impl MarkdownRenderer {
    pub fn new(style: RenderStyle) -> Self {
        Self { style }
    }

    pub fn source_faithful() -> Self {
        Self::new(RenderStyle::SourceFaithful)
    }

    pub fn clean() -> Self {
        Self::new(RenderStyle::Clean)
    }

    fn options() -> Options {
        Options::ENABLE_STRIKETHROUGH
    }
}

impl Renderer for MarkdownRenderer {
    fn render(&self, text: &str) -> Result<Fragment, RenderError> {
        Ok(match self.style {
            RenderStyle::SourceFaithful => render_source_faithful(text),
            RenderStyle::Clean => render_clean(text),
        })
    }
}

fn element_kind(tag: &Tag) -> ElementKind {
    match tag {
        Tag::Paragraph => ElementKind::Paragraph,
        Tag::Heading { level, .. } => ElementKind::Heading { level: *level as u8 },
        Tag::BlockQuote(_) => ElementKind::BlockQuote,
        Tag::CodeBlock(kind) => ElementKind::CodeBlock { lang: fence_language(kind) },
        Tag::HtmlBlock => ElementKind::HtmlBlock,
        Tag::List(start) => ElementKind::List { ordered: start.is_some() },
        Tag::Item => ElementKind::ListItem,
        Tag::Emphasis => ElementKind::Emphasis,
        Tag::Strong => ElementKind::Strong,
        Tag::Strikethrough => ElementKind::Strikethrough,
        Tag::Link { dest_url, .. } => ElementKind::Link { href: dest_url.to_string() },
        Tag::Image { dest_url, .. } => ElementKind::Image { src: dest_url.to_string() },
        // Constructs outside the enabled option set degrade to a plain
        // container; their text still flows through.
        _ => ElementKind::Paragraph,
    }
}

fn fence_language(kind: &CodeBlockKind) -> Option<String> {
    match kind {
        CodeBlockKind::Fenced(info) => {
            let lang = info.split_whitespace().next().unwrap_or("");
            (!lang.is_empty()).then(|| lang.to_string())
        }
        CodeBlockKind::Indented => None,
    }
}

/// Builds a fragment while tracking the open-element stack.
struct TreeBuilder {
    fragment: Fragment,
    open: Vec<NodeId>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self { fragment: Fragment::new(), open: Vec::new() }
    }

    fn push_element(&mut self, kind: ElementKind) {
        let id = self.fragment.element(kind);
        self.attach(id);
        self.open.push(id);
    }

    fn pop(&mut self) {
        self.open.pop();
    }

    fn add_text(&mut self, content: &str) {
        if content.is_empty() {
            return;
        }
        let id = self.fragment.text(content);
        self.attach(id);
    }

    fn attach(&mut self, id: NodeId) {
        match self.open.last() {
            Some(&parent) => self.fragment.append(parent, id),
            None => self.fragment.append_root(id),
        }
    }

    fn finish(self) -> Fragment {
        self.fragment
    }
}

/// Marker-preserving rendering. Walks the offset iterator and emits the
/// exact source slice for every event, filling the gaps pulldown leaves
/// around markers (`**`, heading hashes, fence lines, link brackets) so
/// that no source character is dropped.
fn render_source_faithful(text: &str) -> Fragment {
    let mut builder = TreeBuilder::new();
    let mut cursor = 0usize;

    let fill_gap = |builder: &mut TreeBuilder, cursor: &mut usize, to: usize| {
        if to > *cursor {
            builder.add_text(&text[*cursor..to]);
            *cursor = to;
        }
    };

    for (event, range) in Parser::new_ext(text, MarkdownRenderer::options()).into_offset_iter() {
        match event {
            Event::Start(tag) => {
                fill_gap(&mut builder, &mut cursor, range.start);
                builder.push_element(element_kind(&tag));
            }
            Event::End(_) => {
                fill_gap(&mut builder, &mut cursor, range.end);
                builder.pop();
            }
            Event::Code(_) => {
                fill_gap(&mut builder, &mut cursor, range.start);
                builder.push_element(ElementKind::CodeSpan);
                builder.add_text(&text[range.clone()]);
                builder.pop();
                cursor = range.end;
            }
            Event::Rule => {
                fill_gap(&mut builder, &mut cursor, range.start);
                builder.push_element(ElementKind::ThematicBreak);
                builder.add_text(&text[range.clone()]);
                builder.pop();
                cursor = range.end;
            }
            // Text, breaks, html, and anything else: the source slice is
            // the content.
            _ => {
                fill_gap(&mut builder, &mut cursor, range.start);
                builder.add_text(&text[range.clone()]);
                cursor = range.end;
            }
        }
    }
    let len = text.len();
    fill_gap(&mut builder, &mut cursor, len);

    builder.finish()
}

/// Marker-stripping rendering, shaped like HTML output.
fn render_clean(text: &str) -> Fragment {
    let mut builder = TreeBuilder::new();

    for event in Parser::new_ext(text, MarkdownRenderer::options()) {
        match event {
            Event::Start(tag) => builder.push_element(element_kind(&tag)),
            Event::End(_) => builder.pop(),
            Event::Text(t) => builder.add_text(&t),
            Event::Code(code) => {
                builder.push_element(ElementKind::CodeSpan);
                builder.add_text(&code);
                builder.pop();
            }
            Event::SoftBreak => builder.add_text("\n"),
            Event::HardBreak => {
                builder.push_element(ElementKind::HardBreak);
                builder.add_text("\n");
                builder.pop();
            }
            Event::Rule => {
                builder.push_element(ElementKind::ThematicBreak);
                builder.pop();
            }
            Event::Html(html) | Event::InlineHtml(html) => builder.add_text(&html),
            _ => {}
        }
    }

    builder.finish()
}
