//! Builders and doubles shared by unit and integration tests.

use crate::audio::{AudioEngine, AudioError, AudioEvent, ScriptedAudioEngine};
use crate::document::{Chapter, Document};
use crate::position::Position;
use std::sync::{Arc, Mutex};

pub fn document_from(chapters: &[&[&str]]) -> Document {
    let chapters = chapters
        .iter()
        .map(|paragraphs| Chapter::new(paragraphs.iter().map(|p| p.to_string()).collect()))
        .collect();
    Document::new("fixture", chapters).expect("test document is well-formed")
}

/// Chapter 0 has one paragraph of three sentences, chapter 1 has one
/// paragraph of a single sentence.
pub fn two_chapter_document() -> Document {
    document_from(&[
        &["First one. Second one. Third one."],
        &["Only sentence here."],
    ])
}

/// One chapter with `paragraphs` two-sentence paragraphs, for scroll tests
/// that need more lines than a viewport.
pub fn long_document(paragraphs: usize) -> Document {
    let texts: Vec<String> = (0..paragraphs)
        .map(|i| format!("Paragraph number {i} starts here. And then it ends."))
        .collect();
    Document::new(
        "long fixture",
        vec![Chapter::new(texts)],
    )
    .expect("test document is well-formed")
}

/// A `ScriptedAudioEngine` behind a shared handle, so a test can keep
/// inspecting calls after the session takes ownership of its clone.
#[derive(Clone, Default)]
pub struct SharedAudioEngine {
    inner: Arc<Mutex<ScriptedAudioEngine>>,
}

impl SharedAudioEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played_from(&self) -> Vec<Position> {
        self.inner.lock().unwrap().played_from.clone()
    }

    pub fn stops(&self) -> usize {
        self.inner.lock().unwrap().stops
    }

    pub fn push_event(&self, event: AudioEvent) {
        self.inner.lock().unwrap().push_event(event);
    }
}

impl AudioEngine for SharedAudioEngine {
    fn play_from(&mut self, position: Position) -> Result<(), AudioError> {
        self.inner.lock().unwrap().play_from(position)
    }

    fn stop_and_clear(&mut self) -> Result<(), AudioError> {
        self.inner.lock().unwrap().stop_and_clear()
    }

    fn poll_event(&mut self) -> Option<AudioEvent> {
        self.inner.lock().unwrap().poll_event()
    }
}
