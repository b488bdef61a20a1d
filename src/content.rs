use crate::document::{Chapter, Document};
use anyhow::{Context, Result};
use log::info;
use std::path::Path;

/// Boundary to whatever produces a `Document`. Format-specific extraction
/// (EPUB, PDF, ...) lives behind this trait, outside the core.
pub trait ContentSource {
    fn load(&self, path: &Path) -> Result<Document>;
}

/// Plain UTF-8 text: paragraphs split on blank lines, the whole file as one
/// chapter. Falls back to single-newline splitting when the file has no
/// blank lines at all.
pub struct PlainTextSource;

impl ContentSource for PlainTextSource {
    fn load(&self, path: &Path) -> Result<Document> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let content = String::from_utf8_lossy(&bytes).replace("\r\n", "\n");

        let mut paragraphs = split_paragraphs(&content, "\n\n");
        if paragraphs.len() <= 1 && content.contains('\n') {
            paragraphs = split_paragraphs(&content, "\n");
        }

        let title = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "untitled".to_string());

        info!(
            "loaded {}: {} paragraphs from plain text",
            title,
            paragraphs.len()
        );

        Document::new(title, vec![Chapter::new(paragraphs)])
            .with_context(|| format!("{} has no readable text", path.display()))
    }
}

fn split_paragraphs(content: &str, separator: &str) -> Vec<String> {
    content
        .split(separator)
        .map(|p| p.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|p| p.chars().count() > 3)
        .collect()
}
