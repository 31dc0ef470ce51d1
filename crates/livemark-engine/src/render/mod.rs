//! Rendering contract and the shipped markdown renderer.
//!
//! The reconcile loop consumes rendering through the [`Renderer`] trait:
//! a pure, deterministic function from source text to a [`Fragment`] of
//! tree nodes. Implementations must not touch the container or its
//! selection; renderers are injected per editor and cheap to construct,
//! never shared singletons.

pub mod markdown;
pub mod source_map;

use thiserror::Error;

use crate::tree::Fragment;

pub use markdown::{MarkdownRenderer, RenderStyle};

/// Failure surfaced by a renderer. The loop propagates this to its
/// caller and leaves the previous tree, caret, and source untouched.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to render block: {0}")]
    Failed(String),
}

/// Source text to styled fragment. Pure and total: equal input yields
/// equal output, and no call may observe or mutate selection state.
pub trait Renderer: Send + Sync {
    fn render(&self, text: &str) -> Result<Fragment, RenderError>;
}
