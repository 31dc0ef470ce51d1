/*!
 * # Editing Core Module
 *
 * Caret-preserving reconciliation over a rendered markdown surface.
 *
 * ## Architecture Overview
 *
 * The editing system rests on one coordinate system and one loop:
 *
 * ### 1. Flattened Text Positions
 * - Every caret position is an integer offset into the depth-first
 *   concatenation of the container's text nodes
 * - [`caret::locate`] converts the live selection into such offsets;
 *   [`restore::resolve`] converts them back into node boundaries
 * - The two walks are defined against the same pre-order traversal, so
 *   a position located on one tree resolves to the semantically
 *   equivalent position on a freshly rendered replacement tree
 *
 * ### 2. The Render-and-Reconcile Loop
 * - The [`Editor`] owns the Source Document (a plain string) and the
 *   rendered container; nothing else mutates either
 * - On every input notification it runs one reconciliation: capture the
 *   caret, read the displayed text back out of the surface, re-segment,
 *   re-render every block through the injected [`Renderer`], replace
 *   the whole surface, restore the caret
 * - The loop commits the source and the tree together or not at all; a
 *   renderer failure surfaces as [`ReconcileError`] and leaves the
 *   previous view, caret, and source untouched
 *
 * ### 3. Caret Snapshots Are Short-Lived Values
 * - A [`CaretSnapshot`] is captured at the top of a reconciliation and
 *   consumed exactly once after the commit, then discarded
 * - It is threaded through the pipeline as a value, never stashed in
 *   ambient state, so a second edit cannot clobber a snapshot meant
 *   for the first
 *
 * ### 4. Serialized Edits
 * - Input notifications arriving while a reconciliation is in progress
 *   are coalesced and re-run after the current pass commits
 * - A generation counter guards caret restoration: a restore whose
 *   generation is stale is dropped rather than applied to a tree it
 *   was not captured against
 *
 * ## Usage Pattern
 *
 * ```rust
 * use livemark_engine::editing::{Editor, RenderMode};
 * use livemark_engine::render::MarkdownRenderer;
 *
 * let mut editor = Editor::new(
 *     "# Hello\n\nWorld",
 *     MarkdownRenderer::source_faithful(),
 *     RenderMode::Segmented,
 * )
 * .unwrap();
 *
 * // Host places the caret, types, and lets the loop reconcile.
 * editor.set_caret(7);
 * editor.insert_text("!").unwrap();
 * assert_eq!(editor.source(), "# Hello!\n\nWorld");
 * assert_eq!(editor.caret().unwrap().start, 8);
 * ```
 */

pub mod caret;
pub mod editor;
pub mod restore;

pub use caret::{CaretSnapshot, locate};
pub use editor::{Editor, Key, ReconcileError, RenderMode};
pub use restore::resolve;
