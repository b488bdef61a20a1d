use crate::session::ReaderSession;
use crate::theme::{OCEANIC, Palette};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use std::collections::HashMap;

/// The rect grid lines are painted into for a given terminal area. The
/// session interprets mouse coordinates and resize dimensions through the
/// same function, so painting and hit-testing can never disagree.
pub fn text_area(area: Rect) -> Rect {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);
    let content = chunks[0];
    // Block borders plus a two-column reading margin.
    Rect {
        x: content.x + 3,
        y: content.y + 1,
        width: content.width.saturating_sub(6),
        height: content.height.saturating_sub(2),
    }
}

/// Pull-based painter: renders the visible slice of the grid with the
/// current sentence highlighted, plus a status line. Holds no state.
pub fn render(frame: &mut Frame, session: &ReaderSession) {
    let palette = &OCEANIC;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", session.document().title()))
        .border_style(Style::default().fg(palette.dimmed));
    frame.render_widget(block, chunks[0]);

    let area = text_area(frame.area());
    let grid = session.grid();
    let top = session.scroll().top_line();

    let highlight: HashMap<usize, (usize, usize)> = grid
        .sentence_spans(session.document(), session.display_position())
        .into_iter()
        .map(|span| (span.line, (span.start_char, span.end_char)))
        .collect();

    let mut lines = Vec::with_capacity(area.height as usize);
    for row in 0..area.height as usize {
        let index = top + row;
        let Some(text) = grid.line(index) else { break };
        let selection = session
            .selection()
            .span_on_line(index, text.chars().count());
        lines.push(styled_line(
            text,
            highlight.get(&index).copied(),
            selection,
            palette,
        ));
    }
    frame.render_widget(Paragraph::new(lines).style(palette.text_style()), area);

    render_status(frame, session, chunks[1], palette);
}

fn styled_line(
    text: &str,
    highlight: Option<(usize, usize)>,
    selection: Option<(usize, usize)>,
    palette: &Palette,
) -> Line<'static> {
    let in_range = |range: Option<(usize, usize)>, idx: usize| {
        range.is_some_and(|(start, end)| idx >= start && idx < end)
    };

    let mut spans: Vec<Span> = Vec::new();
    let mut run = String::new();
    let mut run_style: Option<Style> = None;
    for (idx, ch) in text.chars().enumerate() {
        let style = if in_range(selection, idx) {
            palette.selection_style()
        } else if in_range(highlight, idx) {
            palette.highlight_style()
        } else {
            palette.text_style()
        };
        if run_style != Some(style) {
            if let Some(prev) = run_style.take() {
                if !run.is_empty() {
                    spans.push(Span::styled(std::mem::take(&mut run), prev));
                }
            }
            run_style = Some(style);
        }
        run.push(ch);
    }
    if let Some(style) = run_style {
        if !run.is_empty() {
            spans.push(Span::styled(run, style));
        }
    }
    Line::from(spans)
}

fn render_status(frame: &mut Frame, session: &ReaderSession, area: Rect, palette: &Palette) {
    let dim = Style::default().fg(palette.dimmed);
    let status_word = if session.is_paused() { "PAUSED" } else { "PLAYING" };
    let mode_word = if session.is_auto_scroll() { "AUTO" } else { "MANUAL" };

    let spans = vec![
        Span::styled(
            format!(" {status_word}"),
            palette.status_style(session.is_paused()),
        ),
        Span::styled(" | ", dim),
        Span::styled(mode_word, Style::default().fg(palette.accent)),
        Span::styled(" | ", dim),
        Span::styled(
            format!("{:.0}%", session.progress_percent()),
            palette.text_style(),
        ),
        Span::styled(
            "   h/l paragraph  j/k sentence  u/n scroll  i/m page  a auto  p pause  q quit",
            dim,
        ),
    ];
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
