use lectern::layout::LineGrid;
use lectern::position::Position;
use lectern::test_utils::{document_from, long_document};

#[test]
fn anchors_stay_in_bounds_at_every_width() {
    let doc = long_document(12);
    for width in [20, 33, 47, 80, 120] {
        let grid = LineGrid::build(&doc, width);
        for paragraph in 0..doc.paragraph_count(0) {
            for sentence in 0..doc.sentence_count(0, paragraph) {
                let pos = Position::new(0, paragraph, sentence);
                let line = grid
                    .nearest_anchor_line(pos)
                    .expect("sentence resolves to a line");
                assert!(
                    line < grid.total_lines(),
                    "anchor out of bounds at width {width}: {pos:?} -> {line}"
                );
                // The coarse map must agree on the owning paragraph.
                if let Some(anchor) = grid.anchor_line(pos) {
                    let coarse = grid.position_at_line(anchor).unwrap();
                    assert_eq!(coarse.chapter, pos.chapter);
                    assert_eq!(coarse.paragraph, pos.paragraph);
                }
            }
        }
    }
}

#[test]
fn rebuild_at_same_width_is_deterministic() {
    let doc = long_document(8);
    let first = LineGrid::build(&doc, 42);
    let second = LineGrid::build(&doc, 42);
    assert_eq!(first.lines(), second.lines());
    assert_eq!(first.total_lines(), second.total_lines());
}

#[test]
fn paragraph_ranges_tile_the_grid_in_order() {
    let doc = long_document(6);
    let grid = LineGrid::build(&doc, 30);
    let mut previous_end = None;
    for paragraph in 0..doc.paragraph_count(0) {
        let (start, end) = grid.paragraph_range(0, paragraph).unwrap();
        assert!(start <= end);
        if let Some(prev) = previous_end {
            // One separator line between consecutive paragraphs.
            assert_eq!(start, prev + 2);
        }
        previous_end = Some(end);
    }
}

#[test]
fn narrow_wrap_never_splits_words() {
    let doc = document_from(&[&["Antidisestablishmentarianism appears unexpectedly here."]]);
    let grid = LineGrid::build(&doc, 20);
    for line in grid.lines() {
        for word in line.split_whitespace() {
            assert!(
                "Antidisestablishmentarianism appears unexpectedly here.".contains(word),
                "wrap split a word: {word}"
            );
        }
    }
}

#[test]
fn hit_testing_is_consistent_with_anchors() {
    let doc = long_document(5);
    let grid = LineGrid::build(&doc, 28);
    for paragraph in 0..doc.paragraph_count(0) {
        for sentence in 0..doc.sentence_count(0, paragraph) {
            let pos = Position::new(0, paragraph, sentence);
            let Some(line) = grid.anchor_line(pos) else {
                continue;
            };
            // A click at the very start of the anchor line must land in the
            // same paragraph, on a sentence no later than this one.
            let hit = grid.sentence_at(&doc, line, 0).unwrap();
            assert_eq!(hit.paragraph, pos.paragraph);
            assert!(hit.sentence <= pos.sentence);
        }
    }
}
