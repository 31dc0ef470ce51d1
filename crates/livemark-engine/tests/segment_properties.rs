//! Property tests for the segmentation laws.

use livemark_engine::segment::{Fence, join, segment};
use proptest::prelude::*;

/// Sources assembled from well-formed blocks joined by single blank
/// lines: joining the segmentation reproduces the input exactly.
fn normalized_source() -> impl Strategy<Value = String> {
    let block = proptest::collection::vec("[a-z][a-z #*-]{0,12}", 1..4)
        .prop_map(|lines| lines.join("\n"));
    proptest::collection::vec(block, 0..6).prop_map(|blocks| blocks.join("\n\n"))
}

/// Arbitrary soup of prose, markers, and blank lines.
fn arbitrary_source() -> impl Strategy<Value = String> {
    "[a-z`#\\n -]{0,160}"
}

proptest! {
    #[test]
    fn join_segment_round_trips_normalized_sources(source in normalized_source()) {
        prop_assert_eq!(join(&segment(&source)), source);
    }

    #[test]
    fn segmentation_is_a_fixed_point(source in arbitrary_source()) {
        let once = segment(&source);
        let again = segment(&join(&once));
        prop_assert_eq!(once, again);
    }

    #[test]
    fn fences_stay_balanced_in_all_but_the_last_block(source in arbitrary_source()) {
        let blocks = segment(&source);
        for (index, block) in blocks.iter().enumerate() {
            let markers = block
                .raw
                .lines()
                .filter(|l| Fence::is_marker_line(l))
                .count();
            if index + 1 < blocks.len() {
                prop_assert_eq!(
                    markers % 2,
                    0,
                    "non-terminal block with open fence: {:?}",
                    block.raw
                );
            }
        }
    }

    #[test]
    fn blocks_never_contain_boundary_blank_lines(source in arbitrary_source()) {
        for block in segment(&source) {
            let has_fence = block.raw.lines().any(|l| Fence::is_marker_line(l));
            if !has_fence {
                prop_assert!(
                    !block.raw.lines().any(|l| l.trim().is_empty()),
                    "prose block holding a blank line: {:?}",
                    block.raw
                );
            }
        }
    }
}
