use crate::audio::{AudioEngine, AudioEvent};
use crate::document::Document;
use crate::input::{
    Command, Event, EventSource, MouseButton, MouseEvent, MouseEventKind, map_key,
};
use crate::layout::{self, LineGrid};
use crate::position::{NavMode, Position};
use crate::progress::{ProgressRecord, ProgressStore};
use crate::scroll::ScrollState;
use crate::selection::Selection;
use crate::ui;
use anyhow::Result;
use crossterm::event::KeyEventKind;
use log::{debug, error, info};
use ratatui::Terminal;
use ratatui::layout::Rect;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const TICK_RATE: Duration = Duration::from_millis(33);
pub const RESTART_DEBOUNCE: Duration = Duration::from_millis(100);
pub const PERSIST_INTERVAL: Duration = Duration::from_secs(5);
const MAX_EVENTS_PER_FRAME: usize = 50;

enum Direction {
    Forward,
    Backward,
}

/// Owns every piece of mutable reader state and is the only writer of it.
/// Commands are applied one at a time; the tick hosts the three background
/// activities (scroll animation, display/audio reconciliation plus periodic
/// persistence, and the debounced audio restart), so nothing ever mutates
/// state concurrently with a command.
pub struct ReaderSession {
    document: Arc<Document>,
    grid: LineGrid,
    scroll: ScrollState,
    /// Authoritative playback cursor.
    audio_position: Position,
    /// What is rendered and highlighted; reconciled to `audio_position` on
    /// the next tick, which keeps a highlight change and its scroll motion
    /// on the same frame.
    display_position: Position,
    paused: bool,
    auto_scroll: bool,
    selection: Selection,
    drag_in_progress: bool,
    audio: Box<dyn AudioEngine>,
    progress: ProgressStore,
    book_id: String,
    /// Deadline of the debounced audio restart; re-armed (superseded) by
    /// every position change inside the window.
    pending_restart: Option<Instant>,
    last_persist: Instant,
    text_area: Rect,
    running: bool,
}

impl ReaderSession {
    pub fn new(
        document: Arc<Document>,
        audio: Box<dyn AudioEngine>,
        progress: ProgressStore,
        book_id: impl Into<String>,
        terminal_area: Rect,
    ) -> Self {
        let book_id = book_id.into();
        let text_area = ui::text_area(terminal_area);
        let grid = LineGrid::build(&document, (text_area.width as usize).max(20));
        let total = grid.total_lines();
        let mut scroll = ScrollState::new(text_area.height as usize);

        let record = progress.get(&book_id).cloned().unwrap_or_default();
        let position = record.position().clamp_to(&document);
        let paused = !record.tts_enabled;
        let auto_scroll = record.auto_scroll;

        if auto_scroll {
            if let Some(line) = grid.nearest_anchor_line(position) {
                scroll.jump_to_line(line, total);
            }
        } else if let Some(line) = record
            .manual_anchor
            .map(|anchor| anchor.clamp_to(&document))
            .and_then(|anchor| grid.nearest_anchor_line(anchor))
        {
            scroll.set_offset(line as f32, total);
        } else {
            scroll.set_offset(record.scroll_offset, total);
        }

        info!(
            "opened {:?} at {:?}, {} sentences total",
            book_id,
            position,
            document.total_sentences()
        );

        Self {
            document,
            grid,
            scroll,
            audio_position: position,
            display_position: position,
            paused,
            auto_scroll,
            selection: Selection::default(),
            drag_in_progress: false,
            audio,
            progress,
            book_id,
            pending_restart: None,
            last_persist: Instant::now(),
            text_area,
            running: true,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn grid(&self) -> &LineGrid {
        &self.grid
    }

    pub fn scroll(&self) -> &ScrollState {
        &self.scroll
    }

    pub fn display_position(&self) -> Position {
        self.display_position
    }

    pub fn audio_position(&self) -> Position {
        self.audio_position
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_auto_scroll(&self) -> bool {
        self.auto_scroll
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn has_pending_restart(&self) -> bool {
        self.pending_restart.is_some()
    }

    /// Scroll progress through the laid-out document, in percent.
    pub fn progress_percent(&self) -> f32 {
        let max = self.scroll.max_scroll(self.grid.total_lines());
        if max <= 0.0 {
            100.0
        } else {
            (self.scroll.offset() / max * 100.0).clamp(0.0, 100.0)
        }
    }

    /// Kicks off playback when the session was restored unpaused.
    pub fn begin(&mut self) {
        if !self.paused {
            self.start_playback();
        }
    }

    /// Routes one terminal event. Key presses go through the command map;
    /// mouse buttons feed selection state and synthesize click commands.
    pub fn handle_event(&mut self, event: Event, now: Instant) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if let Some(command) = map_key(key) {
                    self.process_command(command, now);
                }
            }
            Event::Mouse(mouse) => self.handle_mouse(mouse, now),
            Event::Resize(width, height) => {
                self.process_command(Command::Resize { width, height }, now);
            }
            _ => {}
        }
    }

    /// The single place commands mutate session state. Each handler either
    /// succeeds or logs and leaves the session navigable; only quit stops
    /// the loop.
    pub fn process_command(&mut self, command: Command, now: Instant) {
        debug!("command: {:?}", command);
        match command {
            Command::NextSentence => self.navigate(Direction::Forward, NavMode::Sentence, now),
            Command::PrevSentence => self.navigate(Direction::Backward, NavMode::Sentence, now),
            Command::NextParagraph => self.navigate(Direction::Forward, NavMode::Paragraph, now),
            Command::PrevParagraph => self.navigate(Direction::Backward, NavMode::Paragraph, now),
            Command::ScrollUp => self.manual_scroll(-1.0),
            Command::ScrollDown => self.manual_scroll(1.0),
            Command::PageUp => {
                self.auto_scroll = false;
                self.scroll.page_up(self.grid.total_lines());
            }
            Command::PageDown => {
                self.auto_scroll = false;
                self.scroll.page_down(self.grid.total_lines());
            }
            Command::ToggleAutoScroll => self.toggle_auto_scroll(now),
            Command::TogglePause => self.toggle_pause(now),
            Command::MoveToTop => self.move_to_top(now),
            Command::MoveToBeginning => {
                self.auto_scroll = false;
                self.scroll.to_beginning(self.grid.total_lines());
            }
            Command::MoveToEnd => {
                self.auto_scroll = false;
                self.scroll.to_end(self.grid.total_lines());
            }
            Command::Resize { width, height } => self.handle_resize(width, height),
            Command::ClickAt { x, y } => self.click_jump(x, y, now),
            Command::HighlightAdvance(position) => {
                // Dropped while paused so a stale worker event cannot move
                // the cursor after the user pauses.
                if !self.paused {
                    self.audio_position = position.clamp_to(&self.document);
                }
            }
            Command::PlaybackFinished => {
                info!("playback reached the end of the book");
                self.paused = true;
                self.persist(now);
            }
            Command::CopySelection => self.copy_selection(),
            Command::Quit => self.running = false,
        }
    }

    /// One scheduler pass: fire a due audio restart, drain engine events,
    /// reconcile the display position, step the animation, persist on the
    /// 5-second cadence.
    pub fn tick(&mut self, now: Instant) {
        if let Some(due) = self.pending_restart {
            if now >= due {
                self.pending_restart = None;
                if !self.paused {
                    self.start_playback();
                }
            }
        }

        while let Some(event) = self.audio.poll_event() {
            match event {
                AudioEvent::Advanced(position) => {
                    self.process_command(Command::HighlightAdvance(position), now);
                }
                AudioEvent::Finished => self.process_command(Command::PlaybackFinished, now),
            }
        }

        if !self.paused && self.display_position != self.audio_position {
            self.display_position = self.audio_position;
            if self.auto_scroll {
                if let Some(line) = self.grid.nearest_anchor_line(self.display_position) {
                    let target = self.scroll.centered_offset(line, self.grid.total_lines());
                    self.scroll.smooth_scroll_to(target, self.grid.total_lines());
                }
            }
        }

        self.scroll.tick_animation(self.grid.total_lines());

        if now.duration_since(self.last_persist) >= PERSIST_INTERVAL {
            self.persist(now);
        }
    }

    /// Ordered teardown: background work is disarmed before the audio stops
    /// so a pending restart cannot race a fresh playback start.
    pub fn shutdown(&mut self) {
        self.pending_restart = None;
        self.scroll.cancel_animation();
        if let Err(e) = self.audio.stop_and_clear() {
            error!("failed to stop audio at shutdown: {}", e);
        }
        self.persist(Instant::now());
        info!("session closed");
    }

    fn navigate(&mut self, direction: Direction, mode: NavMode, now: Instant) {
        let current = self.audio_position;
        let next = match direction {
            Direction::Forward => current.advance(&self.document, mode, true),
            Direction::Backward => Some(current.rewind(&self.document, mode)),
        };
        let Some(next) = next else { return };

        self.audio_position = next;
        self.display_position = next;
        if let Some(line) = self.grid.nearest_anchor_line(next) {
            self.scroll.jump_to_line(line, self.grid.total_lines());
        }
        self.persist(now);
        self.restart_audio(now);
    }

    /// Stops playback now and arms the debounced restart. Re-arming moves
    /// the deadline, so a burst of navigation produces exactly one restart,
    /// from the final position.
    fn restart_audio(&mut self, now: Instant) {
        if let Err(e) = self.audio.stop_and_clear() {
            error!("failed to stop audio: {}", e);
        }
        self.pending_restart = Some(now + RESTART_DEBOUNCE);
    }

    fn start_playback(&mut self) {
        if let Err(e) = self.audio.play_from(self.audio_position) {
            // Degrade to paused; navigation keeps working without audio.
            error!("audio engine failed to start: {}", e);
            self.paused = true;
        }
    }

    fn manual_scroll(&mut self, delta: f32) {
        self.auto_scroll = false;
        self.scroll.scroll_by(delta, self.grid.total_lines());
    }

    fn toggle_auto_scroll(&mut self, now: Instant) {
        self.auto_scroll = !self.auto_scroll;
        if self.auto_scroll {
            if let Some(line) = self.grid.nearest_anchor_line(self.display_position) {
                let target = self.scroll.centered_offset(line, self.grid.total_lines());
                self.scroll.smooth_scroll_to(target, self.grid.total_lines());
            }
        }
        self.persist(now);
    }

    fn toggle_pause(&mut self, now: Instant) {
        self.paused = !self.paused;
        self.pending_restart = None;
        if let Err(e) = self.audio.stop_and_clear() {
            error!("failed to stop audio: {}", e);
        }
        if !self.paused {
            self.start_playback();
        }
        self.persist(now);
    }

    /// Adopts the topmost visible sentence as the reading position and
    /// hands the viewport back to auto-scroll.
    fn move_to_top(&mut self, now: Instant) {
        let top = self
            .grid
            .topmost_anchor_in_view(self.scroll.top_line(), self.scroll.viewport_height());
        let Some(position) = top else { return };
        self.audio_position = position;
        self.display_position = position;
        self.auto_scroll = true;
        self.scroll.cancel_animation();
        self.persist(now);
        self.restart_audio(now);
    }

    fn click_jump(&mut self, x: u16, y: u16, now: Instant) {
        let Some((line, _)) = self.grid_coords(x, y) else {
            return;
        };
        let column = x - self.text_area.x;
        let Some(position) = self.grid.sentence_at(&self.document, line, column) else {
            return;
        };
        self.audio_position = position;
        self.display_position = position;
        self.auto_scroll = false;
        self.persist(now);
        self.restart_audio(now);
    }

    /// Reflow: capture the reading place, rebuild the grid wholesale at the
    /// new width, then resolve the offset so the place is preserved.
    fn handle_resize(&mut self, width: u16, height: u16) {
        let anchor = if self.auto_scroll {
            None
        } else {
            self.scroll.capture_resize_anchor(&self.grid)
        };

        self.text_area = ui::text_area(Rect::new(0, 0, width, height));
        self.scroll.set_viewport_height(self.text_area.height as usize);
        self.grid = LineGrid::build(&self.document, (self.text_area.width as usize).max(20));
        // Selection coordinates don't survive a reflow.
        self.selection.clear();

        match anchor {
            Some(anchor) => self.scroll.apply_resize_anchor(anchor, &self.grid),
            None => {
                if let Some(line) = self.grid.nearest_anchor_line(self.display_position) {
                    self.scroll.jump_to_line(line, self.grid.total_lines());
                }
            }
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent, now: Instant) {
        match mouse.kind {
            MouseEventKind::ScrollUp => self.process_command(Command::ScrollUp, now),
            MouseEventKind::ScrollDown => self.process_command(Command::ScrollDown, now),
            MouseEventKind::Down(MouseButton::Left) => {
                self.drag_in_progress = false;
                if let Some((line, column)) = self.grid_coords(mouse.column, mouse.row) {
                    self.selection.start_selection(line, column);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                self.drag_in_progress = true;
                if let Some((line, column)) = self.grid_coords(mouse.column, mouse.row) {
                    self.selection.update_selection(line, column);
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if self.drag_in_progress {
                    self.selection.finish_selection();
                } else {
                    self.selection.clear();
                    self.process_command(
                        Command::ClickAt {
                            x: mouse.column,
                            y: mouse.row,
                        },
                        now,
                    );
                }
            }
            _ => {}
        }
    }

    fn grid_coords(&self, x: u16, y: u16) -> Option<(usize, usize)> {
        let area = self.text_area;
        if x < area.x || y < area.y || x >= area.x + area.width || y >= area.y + area.height {
            return None;
        }
        let line = self.scroll.top_line() + (y - area.y) as usize;
        let line_text = self.grid.line(line)?;
        let column = layout::display_column_to_char_index(line_text, x - area.x);
        Some((line, column))
    }

    fn copy_selection(&mut self) {
        if !self.selection.is_active() {
            return;
        }
        let text = self.selection.extract_text(self.grid.lines());
        if text.is_empty() {
            return;
        }
        match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text)) {
            Ok(()) => {
                self.selection.clear();
                info!("selection copied to clipboard");
            }
            Err(e) => error!("clipboard copy failed: {}", e),
        }
    }

    fn persist(&mut self, now: Instant) {
        let manual_anchor = self
            .grid
            .topmost_anchor_in_view(self.scroll.top_line(), self.scroll.viewport_height());
        self.progress.update(
            &self.book_id,
            ProgressRecord {
                chapter: self.audio_position.chapter,
                paragraph: self.audio_position.paragraph,
                sentence: self.audio_position.sentence,
                scroll_offset: self.scroll.offset(),
                tts_enabled: !self.paused,
                auto_scroll: self.auto_scroll,
                manual_anchor,
                last_read: chrono::Utc::now(),
            },
        );
        self.last_persist = now;
    }
}

/// Synchronous event loop in the poll/tick style: drain a bounded batch of
/// input events, then run one scheduler pass per tick. The session is the
/// single consumer; everything external reaches it as an event or an audio
/// engine event drained inside `tick`.
pub fn run_session<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    session: &mut ReaderSession,
    event_source: &mut dyn EventSource,
) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    session.begin();
    let mut last_tick = Instant::now();

    while session.is_running() {
        terminal.draw(|frame| ui::render(frame, session))?;

        let timeout = TICK_RATE.saturating_sub(last_tick.elapsed());
        if event_source.poll(timeout)? {
            let mut processed = 0;
            while event_source.poll(Duration::ZERO)? && processed < MAX_EVENTS_PER_FRAME {
                let event = event_source.read()?;
                processed += 1;
                session.handle_event(event, Instant::now());
            }
        }

        if last_tick.elapsed() >= TICK_RATE {
            session.tick(Instant::now());
            last_tick = Instant::now();
        }
    }

    session.shutdown();
    Ok(())
}
