pub mod editing;
pub mod render;
pub mod segment;
pub mod tree;

// Re-export key types for easier usage
pub use editing::{CaretSnapshot, Editor, Key, ReconcileError, RenderMode, locate, resolve};
pub use render::{MarkdownRenderer, RenderError, RenderStyle, Renderer};
pub use segment::{Block, join, segment};
pub use tree::{Boundary, ElementKind, Fragment, Node, NodeId, NodeTree, Selection};
