//! Block segmentation of markdown source.
//!
//! [`segment`] splits source text into independently renderable blocks on
//! blank lines, treating fenced code regions as atomic: a fence opened in
//! a block always closes in the same block, so no fence is ever split by
//! re-rendering. [`join`] re-assembles blocks with the canonical
//! blank-line separator.
//!
//! Joining is lossy on blank-line run lengths: any run of blank lines
//! between blocks collapses to exactly one separator. Segmentation is a
//! fixed point under that normalization (`segment(join(segment(x))) ==
//! segment(x)`), which is what the reconcile loop relies on.

/// A contiguous, independently renderable unit of source text.
///
/// Blocks are value objects: identity is the position in the sequence
/// returned by [`segment`], and the whole document is re-segmented on
/// every edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub raw: String,
}

impl Block {
    fn from_lines(lines: &[&str]) -> Self {
        Self { raw: lines.join("\n") }
    }
}

/// Fence marker handling for the segmenter.
pub struct Fence;

impl Fence {
    pub const MARKER: &'static str = "```";

    /// Whether a line opens or closes a fenced region.
    pub fn is_marker_line(line: &str) -> bool {
        line.trim().starts_with(Self::MARKER)
    }
}

/// Split `source` into blocks.
///
/// The scanner walks lines top to bottom with an inside-fence flag:
///
/// - A fence marker line toggles the flag. Toggling *into* a fence with
///   prose already buffered first flushes that prose as its own block,
///   so a fence never merges with the preceding paragraph.
/// - Inside a fence every line is kept verbatim, markers included; the
///   closing marker flushes the whole fenced region as one block.
/// - Outside a fence a blank line ends the current block; blank lines
///   themselves are not retained.
/// - A fence left open at end of input is flushed as a single trailing
///   block. Accepted, not an error.
pub fn segment(source: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut buffer: Vec<&str> = Vec::new();
    let mut in_fence = false;

    for line in source.split('\n') {
        if Fence::is_marker_line(line) {
            buffer.push(line);
            if in_fence {
                blocks.push(Block::from_lines(&buffer));
                buffer.clear();
                in_fence = false;
            } else {
                if buffer.len() > 1 {
                    blocks.push(Block::from_lines(&buffer[..buffer.len() - 1]));
                    buffer = vec![line];
                }
                in_fence = true;
            }
        } else if in_fence {
            buffer.push(line);
        } else if line.trim().is_empty() {
            if !buffer.is_empty() {
                blocks.push(Block::from_lines(&buffer));
                buffer.clear();
            }
        } else {
            buffer.push(line);
        }
    }

    if !buffer.is_empty() {
        blocks.push(Block::from_lines(&buffer));
    }

    blocks
}

/// Re-assemble blocks into a single source string with exactly one
/// blank-line separator between consecutive blocks.
pub fn join(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(|b| b.raw.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn raws(blocks: &[Block]) -> Vec<&str> {
        blocks.iter().map(|b| b.raw.as_str()).collect()
    }

    #[test]
    fn adjacent_nonblank_lines_stay_one_block() {
        let blocks = segment("# Heading\nBody text");
        assert_eq!(raws(&blocks), vec!["# Heading\nBody text"]);
    }

    #[test]
    fn blank_line_is_a_block_boundary() {
        let blocks = segment("a\n\nb");
        assert_eq!(raws(&blocks), vec!["a", "b"]);
    }

    #[test]
    fn blank_line_runs_collapse_on_join() {
        let blocks = segment("a\n\n\nb");
        assert_eq!(raws(&blocks), vec!["a", "b"]);
        assert_eq!(join(&blocks), "a\n\nb");
    }

    #[test]
    fn fence_separates_from_adjacent_prose() {
        let blocks = segment("a\n```\ncode\n```\nb");
        assert_eq!(raws(&blocks), vec!["a", "```\ncode\n```", "b"]);
    }

    #[test]
    fn blank_lines_inside_fence_are_kept() {
        let blocks = segment("```\nfirst\n\nsecond\n```");
        assert_eq!(raws(&blocks), vec!["```\nfirst\n\nsecond\n```"]);
    }

    #[test]
    fn fence_marker_with_language_and_indent_toggles() {
        let blocks = segment("x\n  ```rust\nlet a = 1;\n```");
        assert_eq!(raws(&blocks), vec!["x", "  ```rust\nlet a = 1;\n```"]);
    }

    #[test]
    fn unterminated_fence_becomes_trailing_block() {
        let blocks = segment("a\n\n```js\nconsole.log(1);");
        assert_eq!(raws(&blocks), vec!["a", "```js\nconsole.log(1);"]);
    }

    #[test]
    fn empty_input_yields_no_blocks() {
        assert_eq!(segment(""), vec![]);
        assert_eq!(segment("\n\n\n"), vec![]);
    }

    #[test]
    fn join_of_empty_is_empty() {
        assert_eq!(join(&[]), "");
    }

    #[rstest]
    #[case("# Heading 1\nParagraph text.\n```js\nconsole.log('code block');\n```\nAnother paragraph.")]
    #[case("one\n\ntwo\n\nthree")]
    #[case("```\nfenced only\n```")]
    fn join_segment_round_trips_single_separators(#[case] source: &str) {
        assert_eq!(join(&segment(source)), source);
    }

    #[rstest]
    #[case("a\n\n\n\nb\n\n\nc")]
    #[case("\n\na\n\n")]
    #[case("p\n```\n\n\n```\n\n\nq")]
    fn segmentation_is_fixed_point_under_lossy_join(#[case] source: &str) {
        let once = segment(source);
        let again = segment(&join(&once));
        assert_eq!(once, again);
    }

    #[test]
    fn fences_never_split_across_blocks() {
        let source = "intro\n```\na\n```\nmid\n\n```rust\nb\n```";
        for block in segment(source) {
            let markers = block
                .raw
                .lines()
                .filter(|l| Fence::is_marker_line(l))
                .count();
            assert_eq!(markers % 2, 0, "unbalanced fence in block {:?}", block.raw);
        }
    }
}
