//! The Render-and-Reconcile Loop.

use thiserror::Error;

use crate::editing::{CaretSnapshot, locate, resolve};
use crate::render::{RenderError, Renderer};
use crate::segment::segment;
use crate::tree::{ElementKind, Fragment, NodeTree};

/// How the loop prepares source text for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Split the source into blocks and render each independently,
    /// with a visible separator between rendered units.
    #[default]
    Segmented,
    /// Render the whole document as a single unit.
    WholeDocument,
}

/// Key-press notification from the input surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// The paragraph-break key. Intercepted by the loop.
    Enter,
    /// Any other key: the host applies its default editing behavior
    /// and raises an input notification itself.
    Other,
}

/// Error surfaced by a reconciliation pass.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("renderer failed during reconciliation: {0}")]
    Renderer(#[from] RenderError),
}

/// The reconcile loop: sole owner of the Source Document and the
/// rendered container.
///
/// The editor has two states, Idle and Reconciling. An input
/// notification moves it to Reconciling for exactly one pass (capture →
/// derive source → render → commit → restore) and back to Idle.
/// Notifications raised while a pass is in flight are coalesced and
/// served by a follow-up pass, so every snapshot is resolved against
/// the tree it was captured for; a version stamp guards restoration
/// against stale snapshots.
pub struct Editor<R: Renderer> {
    /// The authoritative plain-text model.
    source: String,
    /// The rendered surface the host displays and edits.
    tree: NodeTree,
    /// Injected pure rendering function.
    renderer: R,
    mode: RenderMode,
    /// State flag: a reconciliation pass is in progress.
    reconciling: bool,
    /// An input notification arrived mid-pass; run another pass.
    pending: bool,
    /// Incremented per committed pass; stale restores are dropped.
    version: u64,
}

impl<R: Renderer> Editor<R> {
    /// Build an editor and render `source` into its container.
    pub fn new(source: &str, renderer: R, mode: RenderMode) -> Result<Self, ReconcileError> {
        let mut editor = Self {
            source: String::new(),
            tree: NodeTree::new(),
            renderer,
            mode,
            reconciling: false,
            pending: false,
            version: 0,
        };
        let fragment = editor.render_units(source)?;
        editor.tree.commit(fragment);
        editor.source = source.to_string();
        Ok(editor)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Version of the committed view, for host change detection.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Current selection as flattened offsets, if any.
    pub fn caret(&self) -> Option<CaretSnapshot> {
        locate(&self.tree)
    }

    /// Collapse the caret at a flattened position (clamped to the end).
    pub fn set_caret(&mut self, position: usize) {
        resolve(&mut self.tree, &CaretSnapshot::collapsed(position));
    }

    /// Select a flattened range (clamped to the end).
    pub fn select(&mut self, start: usize, end: usize) {
        resolve(&mut self.tree, &CaretSnapshot { start: start.min(end), end: start.max(end) });
    }

    /// Host edit: insert text at the selection, then reconcile. This is
    /// the default editing path for ordinary keys.
    pub fn insert_text(&mut self, text: &str) -> Result<(), ReconcileError> {
        self.tree.insert_at_selection(text);
        self.notify_input()
    }

    /// Host edit: delete backward at the selection, then reconcile.
    /// Returns whether anything was deleted.
    pub fn delete_backward(&mut self) -> Result<bool, ReconcileError> {
        if !self.tree.delete_backward() {
            return Ok(false);
        }
        self.notify_input()?;
        Ok(true)
    }

    /// Key-press notification with interception. Returns whether the
    /// key was intercepted (its default action suppressed).
    ///
    /// The paragraph-break key inserts a blank-line separator at the
    /// caret, advances the caret past it, and then runs the normal
    /// input path synchronously.
    pub fn key_down(&mut self, key: Key) -> Result<bool, ReconcileError> {
        match key {
            Key::Enter => {
                self.tree.insert_at_selection("\n\n");
                self.notify_input()?;
                Ok(true)
            }
            Key::Other => Ok(false),
        }
    }

    /// Content-changed notification: run the reconcile pipeline.
    ///
    /// ## Pipeline
    ///
    /// 1. **Capture**: snapshot the caret against the *current* tree.
    /// 2. **Derive**: read the displayed plain text off the surface;
    ///    this becomes the new Source Document.
    /// 3. **Render**: segment (or not, per [`RenderMode`]) and render
    ///    every unit through the injected renderer. A failure aborts
    ///    here: the previous tree, caret, and source stay untouched.
    /// 4. **Commit**: replace the surface and the source together.
    /// 5. **Restore**: resolve the captured snapshot against the new
    ///    tree; with no snapshot the pass completes without restoring.
    ///
    /// Notifications during a pass are coalesced into one follow-up
    /// pass.
    pub fn notify_input(&mut self) -> Result<(), ReconcileError> {
        if self.reconciling {
            self.pending = true;
            return Ok(());
        }
        self.reconciling = true;
        let result = self.run_passes();
        self.reconciling = false;
        result
    }

    fn run_passes(&mut self) -> Result<(), ReconcileError> {
        loop {
            self.reconcile_once()?;
            if !self.pending {
                return Ok(());
            }
            self.pending = false;
        }
    }

    fn reconcile_once(&mut self) -> Result<(), ReconcileError> {
        let snapshot = locate(&self.tree);
        let captured_version = self.version;

        let new_source = self.tree.displayed_text();
        tracing::debug!(
            chars = new_source.chars().count(),
            caret = ?snapshot,
            "reconciling edit"
        );

        // Render everything before mutating anything: source and tree
        // commit together or not at all.
        let fragment = self.render_units(&new_source)?;

        self.tree.commit(fragment);
        self.source = new_source;
        self.version += 1;

        match snapshot {
            Some(snap) if captured_version + 1 == self.version => {
                resolve(&mut self.tree, &snap);
            }
            Some(snap) => {
                tracing::trace!(snapshot = ?snap, "dropping stale caret snapshot");
            }
            None => {
                tracing::trace!("no selection to restore");
            }
        }
        Ok(())
    }

    /// Render the source into one combined fragment, one unit per
    /// block in [`RenderMode::Segmented`], with block separators
    /// between consecutive units.
    fn render_units(&self, source: &str) -> Result<Fragment, ReconcileError> {
        match self.mode {
            RenderMode::Segmented => {
                let blocks = segment(source);
                let mut combined = Fragment::new();
                for (index, block) in blocks.iter().enumerate() {
                    if index > 0 {
                        let sep = combined.element(ElementKind::BlockSeparator);
                        combined.append_root(sep);
                    }
                    combined.extend(self.renderer.render(&block.raw)?);
                }
                Ok(combined)
            }
            RenderMode::WholeDocument => Ok(self.renderer.render(source)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::MarkdownRenderer;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn editor(source: &str) -> Editor<MarkdownRenderer> {
        Editor::new(source, MarkdownRenderer::source_faithful(), RenderMode::Segmented).unwrap()
    }

    /// Renderer that can be told to fail, for failure-policy tests.
    struct FlakyRenderer {
        failing: AtomicBool,
        inner: MarkdownRenderer,
    }

    impl FlakyRenderer {
        fn new() -> Self {
            Self {
                failing: AtomicBool::new(false),
                inner: MarkdownRenderer::source_faithful(),
            }
        }
    }

    impl Renderer for FlakyRenderer {
        fn render(&self, text: &str) -> Result<Fragment, RenderError> {
            if self.failing.load(Ordering::Relaxed) {
                return Err(RenderError::Failed("injected failure".into()));
            }
            self.inner.render(text)
        }
    }

    #[test]
    fn initial_render_populates_the_surface() {
        let editor = editor("# Hello\n\nWorld");
        assert_eq!(editor.tree().text_content(), "# HelloWorld");
        assert_eq!(editor.tree().displayed_text(), "# Hello\n\nWorld");
        assert_eq!(editor.source(), "# Hello\n\nWorld");
    }

    #[test]
    fn typing_preserves_the_caret() {
        let mut editor = editor("# Hello\n\nWorld");
        editor.set_caret(7);
        editor.insert_text("!").unwrap();

        assert_eq!(editor.source(), "# Hello!\n\nWorld");
        assert_eq!(editor.caret(), Some(CaretSnapshot::collapsed(8)));
    }

    #[test]
    fn typing_mid_block_keeps_later_blocks_intact() {
        let mut editor = editor("alpha\n\nbeta\n\ngamma");
        // Caret after "al" in the first block.
        editor.set_caret(2);
        editor.insert_text("-").unwrap();

        assert_eq!(editor.source(), "al-pha\n\nbeta\n\ngamma");
        assert_eq!(editor.caret(), Some(CaretSnapshot::collapsed(3)));
    }

    #[test]
    fn enter_is_intercepted_and_splits_the_block() {
        let mut editor = editor("helloworld");
        editor.set_caret(5);
        let intercepted = editor.key_down(Key::Enter).unwrap();

        assert!(intercepted);
        assert_eq!(editor.source(), "hello\n\nworld");
        assert_eq!(editor.tree().text_content(), "helloworld");
        // The captured offset counted the two separator characters the
        // break key typed, so restoration lands two characters into the
        // following block.
        assert_eq!(editor.caret(), Some(CaretSnapshot::collapsed(7)));
    }

    #[test]
    fn other_keys_are_not_intercepted() {
        let mut editor = editor("hello");
        let intercepted = editor.key_down(Key::Other).unwrap();
        assert!(!intercepted);
        assert_eq!(editor.version(), 0);
    }

    #[test]
    fn delete_backward_reconciles_and_restores() {
        let mut editor = editor("hello");
        editor.set_caret(5);
        assert!(editor.delete_backward().unwrap());

        assert_eq!(editor.source(), "hell");
        assert_eq!(editor.caret(), Some(CaretSnapshot::collapsed(4)));
    }

    #[test]
    fn delete_backward_at_start_changes_nothing() {
        let mut editor = editor("hello");
        editor.set_caret(0);
        assert!(!editor.delete_backward().unwrap());
        assert_eq!(editor.version(), 0);
    }

    #[test]
    fn reconcile_without_selection_skips_restore() {
        let mut editor = editor("hello");
        editor.notify_input().unwrap();
        assert_eq!(editor.caret(), None);
        assert_eq!(editor.version(), 1);
    }

    #[test]
    fn renderer_failure_leaves_source_and_view_committed_together() {
        let renderer = FlakyRenderer::new();
        let mut editor = Editor::new("hello", renderer, RenderMode::Segmented).unwrap();
        editor.set_caret(5);

        editor.renderer.failing.store(true, Ordering::Relaxed);
        let err = editor.insert_text("!").unwrap_err();
        assert!(matches!(err, ReconcileError::Renderer(_)));

        // The source was not updated and no partial render was
        // committed; the host's raw edit stays on the surface awaiting
        // the next successful pass.
        assert_eq!(editor.source(), "hello");
        assert_eq!(editor.tree().text_content(), "hello!");
        assert_eq!(editor.version(), 0);

        editor.renderer.failing.store(false, Ordering::Relaxed);
        editor.notify_input().unwrap();
        assert_eq!(editor.source(), "hello!");
        assert_eq!(editor.caret(), Some(CaretSnapshot::collapsed(6)));
    }

    #[test]
    fn whole_document_mode_renders_blank_lines_as_text() {
        let mut editor = Editor::new(
            "one\n\ntwo",
            MarkdownRenderer::source_faithful(),
            RenderMode::WholeDocument,
        )
        .unwrap();
        assert_eq!(editor.tree().text_content(), "one\n\ntwo");

        editor.set_caret(3);
        editor.insert_text("!").unwrap();
        assert_eq!(editor.source(), "one!\n\ntwo");
        assert_eq!(editor.caret(), Some(CaretSnapshot::collapsed(4)));
    }

    #[test]
    fn segmented_mode_collapses_extra_blank_lines() {
        let mut editor = editor("a\n\n\n\nb");
        assert_eq!(editor.source(), "a\n\n\n\nb");
        editor.notify_input().unwrap();
        // One reconciliation normalizes the separator runs.
        assert_eq!(editor.source(), "a\n\nb");
        editor.notify_input().unwrap();
        assert_eq!(editor.source(), "a\n\nb");
    }

    #[test]
    fn fenced_code_survives_editing_as_one_block() {
        let mut editor = editor("intro\n\n```js\nconsole.log(1);\n```\n\ncoda");
        // Flattened layout: "intro" is 0..5, the fence's own text
        // starts at 5 with its marker line; "console" ends at 18.
        editor.set_caret(18);
        editor.insert_text("X").unwrap();

        assert_eq!(
            editor.source(),
            "intro\n\n```js\nconsoleX.log(1);\n```\n\ncoda"
        );
        assert_eq!(editor.caret(), Some(CaretSnapshot::collapsed(19)));
    }
}
