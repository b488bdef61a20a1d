use crate::sentence::split_sentences;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("document has no chapters")]
    NoChapters,
    #[error("chapter {0} has no paragraphs")]
    EmptyChapter(usize),
}

#[derive(Debug, Clone)]
pub struct Chapter {
    pub title: Option<String>,
    pub paragraphs: Vec<String>,
}

impl Chapter {
    pub fn new(paragraphs: Vec<String>) -> Self {
        Self {
            title: None,
            paragraphs,
        }
    }
}

/// An ordered list of chapters of pre-cleaned paragraph text. Immutable
/// after load; sentences are computed on demand so the document carries no
/// derived state that could drift.
#[derive(Debug, Clone)]
pub struct Document {
    title: String,
    chapters: Vec<Chapter>,
}

impl Document {
    /// Validates the content contract: a non-empty chapter list where every
    /// chapter has at least one paragraph. Anything less refuses to start.
    pub fn new(title: impl Into<String>, chapters: Vec<Chapter>) -> Result<Self, ContentError> {
        if chapters.is_empty() {
            return Err(ContentError::NoChapters);
        }
        for (idx, chapter) in chapters.iter().enumerate() {
            if chapter.paragraphs.is_empty() {
                return Err(ContentError::EmptyChapter(idx));
            }
        }
        Ok(Self {
            title: title.into(),
            chapters,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    pub fn paragraph_count(&self, chapter: usize) -> usize {
        self.chapters.get(chapter).map_or(0, |c| c.paragraphs.len())
    }

    pub fn paragraph(&self, chapter: usize, paragraph: usize) -> Option<&str> {
        self.chapters
            .get(chapter)?
            .paragraphs
            .get(paragraph)
            .map(String::as_str)
    }

    pub fn sentences(&self, chapter: usize, paragraph: usize) -> Vec<String> {
        self.paragraph(chapter, paragraph)
            .map(split_sentences)
            .unwrap_or_default()
    }

    /// Sentence count of a paragraph. The splitter never returns an empty
    /// list, so a paragraph with no boundaries still counts as one sentence.
    pub fn sentence_count(&self, chapter: usize, paragraph: usize) -> usize {
        self.paragraph(chapter, paragraph)
            .map_or(0, |text| split_sentences(text).len())
    }

    pub fn total_sentences(&self) -> usize {
        self.chapters
            .iter()
            .flat_map(|c| c.paragraphs.iter())
            .map(|p| split_sentences(p).len())
            .sum()
    }
}
