use crate::document::Document;
use serde::{Deserialize, Serialize};

/// Navigation granularity for advance/rewind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavMode {
    Sentence,
    Paragraph,
}

/// Identifies one sentence in the document.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Position {
    pub chapter: usize,
    pub paragraph: usize,
    pub sentence: usize,
}

impl Position {
    pub const START: Position = Position {
        chapter: 0,
        paragraph: 0,
        sentence: 0,
    };

    pub fn new(chapter: usize, paragraph: usize, sentence: usize) -> Self {
        Self {
            chapter,
            paragraph,
            sentence,
        }
    }

    /// Last sentence of the last paragraph of the last chapter.
    pub fn last_in(document: &Document) -> Self {
        let chapter = document.chapter_count() - 1;
        let paragraph = document.paragraph_count(chapter) - 1;
        let sentence = document.sentence_count(chapter, paragraph).max(1) - 1;
        Self::new(chapter, paragraph, sentence)
    }

    pub fn is_valid(&self, document: &Document) -> bool {
        self.chapter < document.chapter_count()
            && self.paragraph < document.paragraph_count(self.chapter)
            && self.sentence < document.sentence_count(self.chapter, self.paragraph).max(1)
    }

    /// Clamps a possibly stale position (e.g. loaded from a progress file
    /// written against different content) to the nearest valid triple.
    pub fn clamp_to(self, document: &Document) -> Self {
        if self.is_valid(document) {
            self
        } else {
            Self::START
        }
    }

    /// Moves forward one sentence or one paragraph.
    ///
    /// Sentence mode rolls into the next paragraph (sentence 0) on overflow
    /// and into the next chapter on paragraph overflow. Paragraph mode always
    /// lands on sentence 0. At document end: wraps to the start when `wrap`
    /// is set, otherwise returns `None` so playback can stop naturally.
    pub fn advance(self, document: &Document, mode: NavMode, wrap: bool) -> Option<Self> {
        let mut chapter = self.chapter;
        let mut paragraph = self.paragraph;
        let mut sentence = self.sentence;

        match mode {
            NavMode::Paragraph => {
                paragraph += 1;
                sentence = 0;
            }
            NavMode::Sentence => sentence += 1,
        }

        while chapter < document.chapter_count() {
            if paragraph < document.paragraph_count(chapter) {
                if sentence < document.sentence_count(chapter, paragraph).max(1) {
                    if mode == NavMode::Paragraph {
                        sentence = 0;
                    }
                    return Some(Self::new(chapter, paragraph, sentence));
                }
                paragraph += 1;
                sentence = 0;
            } else {
                chapter += 1;
                paragraph = 0;
                sentence = 0;
            }
        }

        wrap.then_some(Self::START)
    }

    /// Moves backward one sentence or one paragraph.
    ///
    /// Rewinding before the first sentence always wraps to the last sentence
    /// of the last chapter, regardless of mode. The asymmetry with `advance`
    /// is intentional: forward playback is allowed to stop at the end of the
    /// book, but rewinding from the very start has nowhere else to go.
    pub fn rewind(self, document: &Document, mode: NavMode) -> Self {
        let last_sentence =
            |c: usize, p: usize| document.sentence_count(c, p).max(1).saturating_sub(1);
        let last_paragraph = |c: usize| document.paragraph_count(c).saturating_sub(1);

        match mode {
            NavMode::Sentence => {
                if self.sentence > 0 {
                    Self::new(self.chapter, self.paragraph, self.sentence - 1)
                } else if self.paragraph > 0 {
                    let p = self.paragraph - 1;
                    Self::new(self.chapter, p, last_sentence(self.chapter, p))
                } else if self.chapter > 0 {
                    let c = self.chapter - 1;
                    let p = last_paragraph(c);
                    Self::new(c, p, last_sentence(c, p))
                } else {
                    Self::last_in(document)
                }
            }
            NavMode::Paragraph => {
                if self.paragraph > 0 {
                    Self::new(self.chapter, self.paragraph - 1, 0)
                } else if self.chapter > 0 {
                    let c = self.chapter - 1;
                    Self::new(c, last_paragraph(c), 0)
                } else {
                    Self::last_in(document)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Chapter, Document};

    // Chapter 0: one paragraph of 3 sentences; chapter 1: one paragraph of 1.
    fn two_chapter_doc() -> Document {
        Document::new(
            "fixture",
            vec![
                Chapter::new(vec!["First one. Second one. Third one.".to_string()]),
                Chapter::new(vec!["Only sentence here.".to_string()]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn advance_rolls_across_chapter_boundary() {
        let doc = two_chapter_doc();
        let pos = Position::new(0, 0, 2);
        assert_eq!(
            pos.advance(&doc, NavMode::Sentence, true),
            Some(Position::new(1, 0, 0))
        );
    }

    #[test]
    fn advance_wraps_to_start_when_asked() {
        let doc = two_chapter_doc();
        let pos = Position::new(1, 0, 0);
        assert_eq!(
            pos.advance(&doc, NavMode::Sentence, true),
            Some(Position::START)
        );
    }

    #[test]
    fn advance_without_wrap_stops_at_document_end() {
        let doc = two_chapter_doc();
        let pos = Position::new(1, 0, 0);
        assert_eq!(pos.advance(&doc, NavMode::Sentence, false), None);
    }

    #[test]
    fn rewind_from_start_always_wraps_to_last_sentence() {
        let doc = two_chapter_doc();
        assert_eq!(
            Position::START.rewind(&doc, NavMode::Sentence),
            Position::new(1, 0, 0)
        );
        // Paragraph-mode rewind from the start wraps to the same place.
        assert_eq!(
            Position::START.rewind(&doc, NavMode::Paragraph),
            Position::new(1, 0, 0)
        );
    }

    #[test]
    fn paragraph_mode_always_lands_on_sentence_zero() {
        let doc = Document::new(
            "fixture",
            vec![Chapter::new(vec![
                "A. B. C.".to_string(),
                "D. E.".to_string(),
            ])],
        )
        .unwrap();
        let pos = Position::new(0, 0, 2);
        assert_eq!(
            pos.advance(&doc, NavMode::Paragraph, true),
            Some(Position::new(0, 1, 0))
        );
        assert_eq!(
            Position::new(0, 1, 1).rewind(&doc, NavMode::Paragraph),
            Position::new(0, 0, 0)
        );
    }

    #[test]
    fn interior_positions_round_trip() {
        let doc = two_chapter_doc();
        for s in 0..2 {
            let pos = Position::new(0, 0, s);
            let advanced = pos.advance(&doc, NavMode::Sentence, true).unwrap();
            assert_eq!(advanced.rewind(&doc, NavMode::Sentence), pos);
        }
    }

    #[test]
    fn stale_position_clamps_to_start() {
        let doc = two_chapter_doc();
        assert_eq!(Position::new(7, 3, 1).clamp_to(&doc), Position::START);
        assert_eq!(
            Position::new(1, 0, 0).clamp_to(&doc),
            Position::new(1, 0, 0)
        );
    }
}
