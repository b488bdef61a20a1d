use regex::Regex;
use std::sync::LazyLock;

/// Abbreviations that may be followed by a period without ending a sentence.
pub const DEFAULT_ABBREVIATIONS: &[&str] = &[
    "Mr", "Mrs", "Ms", "Dr", "Prof", "Rev", "Hon", "Jr", "Sr", "Cpl", "Sgt", "Gen", "Col", "Capt",
    "Lt", "Pvt", "vs", "viz", "etc", "eg", "ie", "Co", "Inc", "Ltd", "Corp", "St", "Ave", "Blvd",
];

// Placeholder for protected periods. Private-use codepoint so it cannot
// collide with book text.
const PROTECTED_PERIOD: char = '\u{E000}';

static INITIAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z])\.( [A-Z])").expect("initial pattern is valid"));

static BOUNDARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("boundary pattern is valid"));

static DEFAULT_SPLITTER: LazyLock<SentenceSplitter> = LazyLock::new(SentenceSplitter::new);

/// Splits paragraph text into sentences.
///
/// Boundaries are `.`, `!` or `?` followed by whitespace. Periods inside a
/// closed abbreviation list and single-capital initials ("J. K. Rowling")
/// are protected before splitting and restored afterwards. Never returns an
/// empty list: a paragraph with no boundary comes back as one sentence.
pub struct SentenceSplitter {
    abbrev_re: Regex,
}

impl SentenceSplitter {
    pub fn new() -> Self {
        Self::with_abbreviations(DEFAULT_ABBREVIATIONS)
    }

    pub fn with_abbreviations(abbreviations: &[&str]) -> Self {
        let pattern = format!(r"(?i)\b({})\.", abbreviations.join("|"));
        Self {
            abbrev_re: Regex::new(&pattern).expect("abbreviation pattern is valid"),
        }
    }

    pub fn split(&self, paragraph: &str) -> Vec<String> {
        let placeholder = PROTECTED_PERIOD.to_string();

        let mut protected = self
            .abbrev_re
            .replace_all(paragraph, format!("${{1}}{placeholder}"))
            .into_owned();

        // The initial pattern consumes the following capital, so adjacent
        // initials ("J. K.") need repeated passes until none are left.
        while INITIAL_RE.is_match(&protected) {
            protected = INITIAL_RE
                .replace_all(&protected, format!("${{1}}{placeholder}${{2}}"))
                .into_owned();
        }

        let mut sentences = Vec::new();
        let mut start = 0;
        for boundary in BOUNDARY_RE.find_iter(&protected) {
            // Keep the punctuation with the sentence, drop the whitespace run.
            let punct_len = protected[boundary.start()..]
                .chars()
                .next()
                .map_or(1, char::len_utf8);
            let cut = boundary.start() + punct_len;
            let piece = &protected[start..cut];
            if !piece.is_empty() {
                sentences.push(piece.replace(PROTECTED_PERIOD, "."));
            }
            start = boundary.end();
        }
        let tail = &protected[start..];
        if !tail.is_empty() {
            sentences.push(tail.replace(PROTECTED_PERIOD, "."));
        }

        if sentences.is_empty() {
            sentences.push(paragraph.to_string());
        }
        sentences
    }
}

impl Default for SentenceSplitter {
    fn default() -> Self {
        Self::new()
    }
}

/// Split with the default abbreviation list.
pub fn split_sentences(paragraph: &str) -> Vec<String> {
    DEFAULT_SPLITTER.split(paragraph)
}
