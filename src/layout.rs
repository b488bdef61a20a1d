use crate::document::Document;
use crate::position::Position;
use crate::sentence::split_sentences;
use std::collections::HashMap;
use unicode_width::UnicodeWidthChar;

/// The document rendered at one viewport width: wrapped lines plus the
/// position↔line maps everything else navigates by. Rebuilt wholesale on
/// every resize, never patched.
#[derive(Debug, Default)]
pub struct LineGrid {
    lines: Vec<String>,
    /// Exact anchor line per sentence.
    position_to_line: HashMap<Position, usize>,
    /// Coarse map for hit-testing: every line of a paragraph points at
    /// (chapter, paragraph, 0).
    line_to_position: HashMap<usize, Position>,
    paragraph_line_ranges: HashMap<(usize, usize), (usize, usize)>,
    width: usize,
}

/// Word-boundary wrap of one paragraph. Lines are joined by a single space
/// when mapping character offsets back to the unwrapped text.
pub fn wrap_paragraph(text: &str, width: usize) -> Vec<String> {
    textwrap::wrap(text, width.max(1))
        .into_iter()
        .map(|line| line.into_owned())
        .collect()
}

impl LineGrid {
    /// Lays the whole document out at `width` columns. One blank separator
    /// line between paragraphs, an extra one between chapters. Runs in
    /// O(total characters) so a resize can rebuild it synchronously.
    pub fn build(document: &Document, width: usize) -> Self {
        let mut grid = Self {
            width,
            ..Self::default()
        };

        for (chap_idx, chapter) in document.chapters().iter().enumerate() {
            if chap_idx > 0 {
                grid.lines.push(String::new());
                grid.lines.push(String::new());
            }

            for (para_idx, paragraph) in chapter.paragraphs.iter().enumerate() {
                let start_line = grid.lines.len();
                let wrapped = wrap_paragraph(paragraph, width);
                let end_line = start_line + wrapped.len() - 1;
                grid.paragraph_line_ranges
                    .insert((chap_idx, para_idx), (start_line, end_line));

                grid.anchor_sentences(chap_idx, para_idx, paragraph, &wrapped, start_line);

                for offset in 0..wrapped.len() {
                    grid.line_to_position
                        .insert(start_line + offset, Position::new(chap_idx, para_idx, 0));
                }

                grid.lines.extend(wrapped);
                if para_idx < chapter.paragraphs.len() - 1 {
                    grid.lines.push(String::new());
                }
            }
        }

        grid
    }

    /// Records the wrapped line containing each sentence's start offset. A
    /// sentence whose start falls in no line span (degenerate wrap) simply
    /// gets no anchor; lookups fall back to the nearest prior one. Sentence
    /// starts are monotonic, so one pass over the line spans suffices.
    fn anchor_sentences(
        &mut self,
        chap_idx: usize,
        para_idx: usize,
        paragraph: &str,
        wrapped: &[String],
        start_line: usize,
    ) {
        // Character span of each wrapped line within the paragraph; +1 for
        // the space the wrap consumed at each line break.
        let mut spans = Vec::with_capacity(wrapped.len());
        let mut acc = 0usize;
        for line in wrapped {
            let len = line.chars().count();
            spans.push((acc, acc + len));
            acc += len + 1;
        }

        let mut line_offset = 0usize;
        let mut sentence_start = 0usize;
        for (sent_idx, sentence) in split_sentences(paragraph).iter().enumerate() {
            while line_offset < spans.len() && spans[line_offset].1 <= sentence_start {
                line_offset += 1;
            }
            if let Some(&(line_start, line_end)) = spans.get(line_offset) {
                if line_start <= sentence_start && sentence_start < line_end {
                    self.position_to_line.insert(
                        Position::new(chap_idx, para_idx, sent_idx),
                        start_line + line_offset,
                    );
                }
            }
            sentence_start += sentence.chars().count() + 1;
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    pub fn total_lines(&self) -> usize {
        self.lines.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Exact anchor line of a sentence, if it has one.
    pub fn anchor_line(&self, position: Position) -> Option<usize> {
        self.position_to_line.get(&position).copied()
    }

    /// Anchor line of `position`, or of the nearest anchored sentence before
    /// it. Covers positions that lost their anchor in a reflow.
    pub fn nearest_anchor_line(&self, position: Position) -> Option<usize> {
        if let Some(line) = self.anchor_line(position) {
            return Some(line);
        }
        self.position_to_line
            .iter()
            .filter(|(pos, _)| **pos <= position)
            .max_by_key(|(pos, _)| **pos)
            .map(|(_, line)| *line)
    }

    /// Coarse paragraph-resolution lookup for a rendered line.
    pub fn position_at_line(&self, line: usize) -> Option<Position> {
        self.line_to_position.get(&line).copied()
    }

    pub fn paragraph_range(&self, chapter: usize, paragraph: usize) -> Option<(usize, usize)> {
        self.paragraph_line_ranges.get(&(chapter, paragraph)).copied()
    }

    /// The anchored sentence rendered closest to the top of the viewport, or
    /// the last one above it when no anchor is visible.
    pub fn topmost_anchor_in_view(&self, top_line: usize, height: usize) -> Option<Position> {
        let bottom = top_line + height.max(1);
        let visible = self
            .position_to_line
            .iter()
            .filter(|(_, line)| (top_line..bottom).contains(line))
            .min_by_key(|(_, line)| **line)
            .map(|(pos, _)| *pos);
        if visible.is_some() {
            return visible;
        }
        self.position_to_line
            .iter()
            .filter(|(_, line)| **line < top_line)
            .max_by_key(|(_, line)| **line)
            .map(|(pos, _)| *pos)
    }

    /// Resolves a rendered (line, display column) to the sentence whose
    /// character span contains it. Only the hit paragraph is re-wrapped.
    /// Falls back to sentence 0 of that paragraph on ambiguity.
    pub fn sentence_at(
        &self,
        document: &Document,
        line: usize,
        display_column: u16,
    ) -> Option<Position> {
        let coarse = self.position_at_line(line)?;
        let (para_start, _) = self.paragraph_range(coarse.chapter, coarse.paragraph)?;
        let paragraph = document.paragraph(coarse.chapter, coarse.paragraph)?;

        let wrapped = wrap_paragraph(paragraph, self.width);
        let line_offset = line.checked_sub(para_start)?;
        let line_text = wrapped.get(line_offset)?;

        let char_in_line = display_column_to_char_index(line_text, display_column);
        let chars_before: usize = wrapped[..line_offset]
            .iter()
            .map(|l| l.chars().count() + 1)
            .sum();
        let char_in_para = chars_before + char_in_line.min(line_text.chars().count());

        let mut sentence_start = 0usize;
        for (sent_idx, sentence) in split_sentences(paragraph).iter().enumerate() {
            let sentence_end = sentence_start + sentence.chars().count();
            if (sentence_start..=sentence_end).contains(&char_in_para) {
                return Some(Position::new(coarse.chapter, coarse.paragraph, sent_idx));
            }
            sentence_start = sentence_end + 1;
        }
        Some(Position::new(coarse.chapter, coarse.paragraph, 0))
    }

    /// Per-line character column ranges covered by one sentence, for
    /// highlight painting. Empty when the paragraph is missing.
    pub fn sentence_spans(&self, document: &Document, position: Position) -> Vec<LineSpan> {
        let Some(paragraph) = document.paragraph(position.chapter, position.paragraph) else {
            return Vec::new();
        };
        let Some((para_start, _)) = self.paragraph_range(position.chapter, position.paragraph)
        else {
            return Vec::new();
        };

        let sentences = split_sentences(paragraph);
        let Some(sentence) = sentences.get(position.sentence) else {
            return Vec::new();
        };
        let sentence_start: usize = sentences[..position.sentence]
            .iter()
            .map(|s| s.chars().count() + 1)
            .sum();
        let sentence_end = sentence_start + sentence.chars().count();

        let mut spans = Vec::new();
        let mut line_start = 0usize;
        for (line_offset, line) in wrap_paragraph(paragraph, self.width).iter().enumerate() {
            let line_len = line.chars().count();
            let line_end = line_start + line_len;
            let overlap_start = sentence_start.max(line_start);
            let overlap_end = sentence_end.min(line_end);
            if overlap_start < overlap_end {
                spans.push(LineSpan {
                    line: para_start + line_offset,
                    start_char: overlap_start - line_start,
                    end_char: overlap_end - line_start,
                });
            }
            line_start = line_end + 1;
        }
        spans
    }
}

/// A character-column range within one rendered line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    pub line: usize,
    pub start_char: usize,
    pub end_char: usize,
}

/// Char index within `line` of the glyph rendered at `display_column`.
pub fn display_column_to_char_index(line: &str, display_column: u16) -> usize {
    let mut width_so_far = 0usize;
    for (idx, ch) in line.chars().enumerate() {
        let w = ch.width().unwrap_or(0);
        if width_so_far + w > display_column as usize {
            return idx;
        }
        width_so_far += w;
    }
    line.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Chapter, Document};

    fn doc() -> Document {
        Document::new(
            "fixture",
            vec![
                Chapter::new(vec![
                    "First one here. Second sentence follows. Third closes it.".to_string(),
                    "Another paragraph.".to_string(),
                ]),
                Chapter::new(vec!["Final chapter text.".to_string()]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn every_anchor_is_inside_the_grid() {
        let doc = doc();
        let grid = LineGrid::build(&doc, 24);
        for chapter in 0..doc.chapter_count() {
            for paragraph in 0..doc.paragraph_count(chapter) {
                for sentence in 0..doc.sentence_count(chapter, paragraph) {
                    let pos = Position::new(chapter, paragraph, sentence);
                    let line = grid
                        .nearest_anchor_line(pos)
                        .expect("every sentence resolves to a line");
                    assert!(line < grid.total_lines());
                }
            }
        }
    }

    #[test]
    fn line_map_agrees_with_anchor_map_on_paragraph() {
        let doc = doc();
        let grid = LineGrid::build(&doc, 24);
        for chapter in 0..doc.chapter_count() {
            for paragraph in 0..doc.paragraph_count(chapter) {
                for sentence in 0..doc.sentence_count(chapter, paragraph) {
                    let pos = Position::new(chapter, paragraph, sentence);
                    if let Some(anchor) = grid.anchor_line(pos) {
                        let coarse = grid.position_at_line(anchor).unwrap();
                        assert_eq!((coarse.chapter, coarse.paragraph), (chapter, paragraph));
                        assert_eq!(coarse.sentence, 0);
                    }
                }
            }
        }
    }

    #[test]
    fn paragraphs_are_separated_by_one_blank_line_chapters_by_two() {
        let doc = doc();
        let grid = LineGrid::build(&doc, 80);
        // At width 80 each paragraph fits one line.
        assert_eq!(
            grid.lines(),
            &[
                "First one here. Second sentence follows. Third closes it.".to_string(),
                String::new(),
                "Another paragraph.".to_string(),
                String::new(),
                String::new(),
                "Final chapter text.".to_string(),
            ]
        );
    }

    #[test]
    fn sentence_anchors_land_on_their_wrapped_line() {
        let doc = doc();
        // Width 20 wraps the first paragraph across several lines.
        let grid = LineGrid::build(&doc, 20);
        let (start, end) = grid.paragraph_range(0, 0).unwrap();
        let a0 = grid.anchor_line(Position::new(0, 0, 0)).unwrap();
        let a1 = grid.anchor_line(Position::new(0, 0, 1)).unwrap();
        let a2 = grid.anchor_line(Position::new(0, 0, 2)).unwrap();
        assert_eq!(a0, start);
        assert!(a0 <= a1 && a1 <= a2);
        assert!(a2 <= end);
    }

    #[test]
    fn hit_test_resolves_sentences_by_column() {
        let doc = Document::new(
            "fixture",
            vec![Chapter::new(vec!["Tiny one. Second sentence.".to_string()])],
        )
        .unwrap();
        let grid = LineGrid::build(&doc, 80);
        assert_eq!(
            grid.sentence_at(&doc, 0, 2),
            Some(Position::new(0, 0, 0))
        );
        assert_eq!(
            grid.sentence_at(&doc, 0, 15),
            Some(Position::new(0, 0, 1))
        );
    }

    #[test]
    fn hit_test_on_separator_line_misses() {
        let doc = doc();
        let grid = LineGrid::build(&doc, 80);
        assert_eq!(grid.sentence_at(&doc, 1, 0), None);
    }

    #[test]
    fn highlight_spans_cover_the_sentence_text() {
        let doc = doc();
        let grid = LineGrid::build(&doc, 20);
        let spans = grid.sentence_spans(&doc, Position::new(0, 0, 1));
        assert!(!spans.is_empty());
        let text: String = spans
            .iter()
            .map(|span| {
                let line = grid.line(span.line).unwrap();
                line.chars()
                    .skip(span.start_char)
                    .take(span.end_char - span.start_char)
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(text, "Second sentence follows.");
    }

    #[test]
    fn topmost_anchor_prefers_visible_then_prior() {
        let doc = doc();
        let grid = LineGrid::build(&doc, 20);
        let top = grid.topmost_anchor_in_view(0, 3).unwrap();
        assert_eq!(top, Position::new(0, 0, 0));

        let (_, end) = grid.paragraph_range(1, 0).unwrap();
        // A viewport past the end of the text falls back to the last anchor
        // above it.
        let prior = grid.topmost_anchor_in_view(end + 1, 3);
        assert!(prior.is_some());
    }
}
