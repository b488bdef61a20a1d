//! Audio engine seam. Synthesis and playback are external concerns; the
//! core only starts/stops playback and consumes position-advance events.

use crate::document::Document;
use crate::position::{NavMode, Position};
use log::{debug, warn};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("speech worker is gone")]
    WorkerGone,
    #[error("speech backend failed: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioEvent {
    /// Playback reached the start of this sentence.
    Advanced(Position),
    /// Playback ran off the end of the document.
    Finished,
}

/// What the orchestrator needs from audio playback. `poll_event` is drained
/// from the command loop; implementations never touch core state.
pub trait AudioEngine {
    fn play_from(&mut self, position: Position) -> Result<(), AudioError>;
    fn stop_and_clear(&mut self) -> Result<(), AudioError>;
    fn poll_event(&mut self) -> Option<AudioEvent>;
}

/// Engine for running without any audio at all. Never emits events.
pub struct NullAudioEngine;

impl AudioEngine for NullAudioEngine {
    fn play_from(&mut self, _position: Position) -> Result<(), AudioError> {
        Ok(())
    }

    fn stop_and_clear(&mut self) -> Result<(), AudioError> {
        Ok(())
    }

    fn poll_event(&mut self) -> Option<AudioEvent> {
        None
    }
}

/// One sentence of speech. `interrupt` is raised when the sentence should be
/// cut short; implementations poll it and return early.
pub trait SpeechBackend: Send + 'static {
    fn speak(&mut self, text: &str, interrupt: &AtomicBool) -> Result<(), AudioError>;
}

/// Backend that paces silently at a fixed words-per-minute rate. Keeps the
/// highlight and auto-scroll moving when no TTS pipeline is wired in.
pub struct PacedBackend {
    words_per_minute: f32,
}

impl PacedBackend {
    pub fn new(words_per_minute: f32) -> Self {
        Self { words_per_minute }
    }
}

impl Default for PacedBackend {
    fn default() -> Self {
        Self::new(160.0)
    }
}

impl SpeechBackend for PacedBackend {
    fn speak(&mut self, text: &str, interrupt: &AtomicBool) -> Result<(), AudioError> {
        let words = text.split_whitespace().count().max(1) as f32;
        let total = Duration::from_secs_f32(words * 60.0 / self.words_per_minute);
        let slice = Duration::from_millis(25);
        let mut elapsed = Duration::ZERO;
        while elapsed < total {
            if interrupt.load(Ordering::Relaxed) {
                return Ok(());
            }
            std::thread::sleep(slice.min(total - elapsed));
            elapsed += slice;
        }
        Ok(())
    }
}

enum WorkerCommand {
    Play { generation: u64, start: Position },
    Stop,
    Shutdown,
}

struct WorkerEvent {
    generation: u64,
    event: AudioEvent,
}

/// Playback on a worker thread behind flume channels. The session thread
/// sends play/stop; the worker walks sentences forward (without wrapping, so
/// playback stops naturally at the end of the book) and reports each
/// sentence start. Commands and events carry a generation so anything from a
/// superseded playback is discarded instead of moving the cursor to a stale
/// position.
pub struct SpeechService {
    command_tx: flume::Sender<WorkerCommand>,
    event_rx: flume::Receiver<WorkerEvent>,
    interrupt: Arc<AtomicBool>,
    generation: u64,
}

impl SpeechService {
    pub fn spawn(document: Arc<Document>, backend: Box<dyn SpeechBackend>) -> Self {
        let (command_tx, command_rx) = flume::unbounded();
        let (event_tx, event_rx) = flume::unbounded();
        let interrupt = Arc::new(AtomicBool::new(false));

        let worker_interrupt = interrupt.clone();
        std::thread::spawn(move || {
            speech_worker(&document, backend, &command_rx, &event_tx, &worker_interrupt);
        });

        Self {
            command_tx,
            event_rx,
            interrupt,
            generation: 0,
        }
    }
}

impl AudioEngine for SpeechService {
    fn play_from(&mut self, position: Position) -> Result<(), AudioError> {
        self.generation += 1;
        self.interrupt.store(true, Ordering::Relaxed);
        self.command_tx
            .send(WorkerCommand::Play {
                generation: self.generation,
                start: position,
            })
            .map_err(|_| AudioError::WorkerGone)
    }

    fn stop_and_clear(&mut self) -> Result<(), AudioError> {
        // Bumping the generation invalidates any events still queued from
        // the playback being stopped.
        self.generation += 1;
        self.interrupt.store(true, Ordering::Relaxed);
        self.command_tx
            .send(WorkerCommand::Stop)
            .map_err(|_| AudioError::WorkerGone)
    }

    fn poll_event(&mut self) -> Option<AudioEvent> {
        while let Ok(worker_event) = self.event_rx.try_recv() {
            if worker_event.generation == self.generation {
                return Some(worker_event.event);
            }
            debug!("discarding stale audio event {:?}", worker_event.event);
        }
        None
    }
}

impl Drop for SpeechService {
    fn drop(&mut self) {
        self.interrupt.store(true, Ordering::Relaxed);
        let _ = self.command_tx.send(WorkerCommand::Shutdown);
    }
}

fn speech_worker(
    document: &Document,
    mut backend: Box<dyn SpeechBackend>,
    command_rx: &flume::Receiver<WorkerCommand>,
    event_tx: &flume::Sender<WorkerEvent>,
    interrupt: &AtomicBool,
) {
    while let Ok(command) = command_rx.recv() {
        let (generation, start) = match command {
            WorkerCommand::Shutdown => return,
            WorkerCommand::Stop => continue,
            WorkerCommand::Play { generation, start } => (generation, start),
        };

        interrupt.store(false, Ordering::Relaxed);
        let mut position = Some(start);
        while let Some(pos) = position {
            // A queued command supersedes this playback.
            if !command_rx.is_empty() {
                break;
            }
            let Some(text) = document.sentences(pos.chapter, pos.paragraph).into_iter().nth(pos.sentence)
            else {
                warn!("no sentence at {:?}, stopping playback", pos);
                break;
            };

            if event_tx
                .send(WorkerEvent {
                    generation,
                    event: AudioEvent::Advanced(pos),
                })
                .is_err()
            {
                return;
            }

            if let Err(e) = backend.speak(&text, interrupt) {
                warn!("speech backend failed: {}", e);
                break;
            }
            if interrupt.load(Ordering::Relaxed) {
                break;
            }

            position = pos.advance(document, NavMode::Sentence, false);
        }

        if position.is_none() {
            let _ = event_tx.send(WorkerEvent {
                generation,
                event: AudioEvent::Finished,
            });
        }
    }
}

/// Test engine: records every call and replays a scripted event queue.
#[derive(Default)]
pub struct ScriptedAudioEngine {
    pub played_from: Vec<Position>,
    pub stops: usize,
    events: VecDeque<AudioEvent>,
}

impl ScriptedAudioEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_event(&mut self, event: AudioEvent) {
        self.events.push_back(event);
    }
}

impl AudioEngine for ScriptedAudioEngine {
    fn play_from(&mut self, position: Position) -> Result<(), AudioError> {
        self.played_from.push(position);
        Ok(())
    }

    fn stop_and_clear(&mut self) -> Result<(), AudioError> {
        self.stops += 1;
        Ok(())
    }

    fn poll_event(&mut self) -> Option<AudioEvent> {
        self.events.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Chapter;
    use std::time::Instant;

    fn doc() -> Arc<Document> {
        Arc::new(
            Document::new(
                "fixture",
                vec![Chapter::new(vec!["One. Two.".to_string()])],
            )
            .unwrap(),
        )
    }

    struct InstantBackend;

    impl SpeechBackend for InstantBackend {
        fn speak(&mut self, _text: &str, _interrupt: &AtomicBool) -> Result<(), AudioError> {
            Ok(())
        }
    }

    #[test]
    fn service_reports_each_sentence_then_finishes() {
        let mut service = SpeechService::spawn(doc(), Box::new(InstantBackend));
        service.play_from(Position::START).unwrap();

        let mut events = Vec::new();
        let deadline = Instant::now() + Duration::from_secs(2);
        while events.len() < 3 && Instant::now() < deadline {
            if let Some(event) = service.poll_event() {
                events.push(event);
            }
            std::thread::sleep(Duration::from_millis(1));
        }

        assert_eq!(
            events,
            vec![
                AudioEvent::Advanced(Position::new(0, 0, 0)),
                AudioEvent::Advanced(Position::new(0, 0, 1)),
                AudioEvent::Finished,
            ]
        );
    }

    #[test]
    fn stop_discards_stale_events() {
        let mut service = SpeechService::spawn(doc(), Box::new(InstantBackend));
        service.play_from(Position::START).unwrap();
        std::thread::sleep(Duration::from_millis(50));
        service.stop_and_clear().unwrap();
        assert_eq!(service.poll_event(), None);
    }

    #[test]
    fn paced_backend_honors_interrupt() {
        let mut backend = PacedBackend::new(1.0); // one word a minute
        let interrupt = AtomicBool::new(true);
        let start = Instant::now();
        backend.speak("slow sentence", &interrupt).unwrap();
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
