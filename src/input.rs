use crate::position::Position;
use anyhow::Result;
pub use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use std::time::Duration;

/// Everything the session can be asked to do. Closed set, matched
/// exhaustively in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    NextSentence,
    PrevSentence,
    NextParagraph,
    PrevParagraph,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    ToggleAutoScroll,
    TogglePause,
    /// Adopt the topmost visible sentence and re-enable auto-scroll.
    MoveToTop,
    MoveToBeginning,
    MoveToEnd,
    Resize { width: u16, height: u16 },
    ClickAt { x: u16, y: u16 },
    /// Playback reached a new sentence (posted by the audio engine).
    HighlightAdvance(Position),
    PlaybackFinished,
    CopySelection,
    Quit,
}

/// Trait for abstracting event sources to enable testing.
pub trait EventSource {
    fn poll(&mut self, timeout: Duration) -> Result<bool>;
    fn read(&mut self) -> Result<Event>;
}

/// Real keyboard/mouse source backed by crossterm.
pub struct TerminalEventSource;

impl EventSource for TerminalEventSource {
    fn poll(&mut self, timeout: Duration) -> Result<bool> {
        Ok(crossterm::event::poll(timeout)?)
    }

    fn read(&mut self) -> Result<Event> {
        Ok(crossterm::event::read()?)
    }
}

/// Maps a key press to a command. Bindings follow the original reader:
/// h/l step paragraphs, j/k step sentences, u/n scroll, i/m page.
pub fn map_key(key: KeyEvent) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Command::Quit);
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Some(Command::Quit),
        KeyCode::Char('p') | KeyCode::Char(' ') => Some(Command::TogglePause),
        KeyCode::Char('h') => Some(Command::PrevParagraph),
        KeyCode::Char('j') => Some(Command::PrevSentence),
        KeyCode::Char('k') => Some(Command::NextSentence),
        KeyCode::Char('l') => Some(Command::NextParagraph),
        KeyCode::Char('u') | KeyCode::Up => Some(Command::ScrollUp),
        KeyCode::Char('n') | KeyCode::Down => Some(Command::ScrollDown),
        KeyCode::Char('i') | KeyCode::PageUp => Some(Command::PageUp),
        KeyCode::Char('m') | KeyCode::PageDown => Some(Command::PageDown),
        KeyCode::Char('a') => Some(Command::ToggleAutoScroll),
        KeyCode::Char('t') => Some(Command::MoveToTop),
        KeyCode::Char('y') | KeyCode::Home => Some(Command::MoveToBeginning),
        KeyCode::Char('b') | KeyCode::End => Some(Command::MoveToEnd),
        KeyCode::Char('c') => Some(Command::CopySelection),
        _ => None,
    }
}

/// Simulated event source for tests.
pub struct SimulatedEventSource {
    events: Vec<Event>,
    current_index: usize,
}

impl SimulatedEventSource {
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events,
            current_index: 0,
        }
    }

    pub fn key_event(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers,
            kind: crossterm::event::KeyEventKind::Press,
            state: crossterm::event::KeyEventState::empty(),
        })
    }

    pub fn char_key(c: char) -> Event {
        Self::key_event(KeyCode::Char(c), KeyModifiers::empty())
    }

    pub fn mouse(kind: MouseEventKind, x: u16, y: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column: x,
            row: y,
            modifiers: KeyModifiers::empty(),
        })
    }
}

impl EventSource for SimulatedEventSource {
    fn poll(&mut self, _timeout: Duration) -> Result<bool> {
        Ok(self.current_index < self.events.len())
    }

    fn read(&mut self) -> Result<Event> {
        if self.current_index < self.events.len() {
            let event = self.events[self.current_index].clone();
            self.current_index += 1;
            Ok(event)
        } else {
            // Exhausted scripts quit so a runaway loop terminates.
            Ok(Self::char_key('q'))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_keys_map_to_commands() {
        let cases = [
            ('k', Command::NextSentence),
            ('j', Command::PrevSentence),
            ('l', Command::NextParagraph),
            ('h', Command::PrevParagraph),
            ('a', Command::ToggleAutoScroll),
            ('p', Command::TogglePause),
            ('q', Command::Quit),
        ];
        for (ch, expected) in cases {
            let Event::Key(key) = SimulatedEventSource::char_key(ch) else {
                unreachable!();
            };
            assert_eq!(map_key(key), Some(expected), "key {ch}");
        }
    }

    #[test]
    fn unmapped_keys_produce_nothing() {
        let Event::Key(key) = SimulatedEventSource::char_key('z') else {
            unreachable!();
        };
        assert_eq!(map_key(key), None);
    }

    #[test]
    fn simulated_source_replays_in_order_then_runs_dry() {
        let mut source = SimulatedEventSource::new(vec![
            SimulatedEventSource::char_key('k'),
            SimulatedEventSource::char_key('p'),
        ]);
        assert!(source.poll(Duration::ZERO).unwrap());
        let Event::Key(first) = source.read().unwrap() else {
            unreachable!();
        };
        assert_eq!(first.code, KeyCode::Char('k'));
        source.read().unwrap();
        assert!(!source.poll(Duration::ZERO).unwrap());
    }
}
