/// Mouse text selection over grid lines, in (line, character column)
/// coordinates. Independent of reading positions: selecting text never moves
/// the playback cursor.
#[derive(Debug, Default)]
pub struct Selection {
    start: Option<(usize, usize)>,
    end: Option<(usize, usize)>,
    pub is_selecting: bool,
}

impl Selection {
    pub fn start_selection(&mut self, line: usize, column: usize) {
        self.start = Some((line, column));
        self.end = Some((line, column));
        self.is_selecting = true;
    }

    pub fn update_selection(&mut self, line: usize, column: usize) {
        if self.is_selecting {
            self.end = Some((line, column));
        }
    }

    pub fn finish_selection(&mut self) {
        self.is_selecting = false;
    }

    pub fn clear(&mut self) {
        self.start = None;
        self.end = None;
        self.is_selecting = false;
    }

    pub fn is_active(&self) -> bool {
        matches!((self.start, self.end), (Some(s), Some(e)) if s != e)
    }

    /// Selection endpoints ordered top-to-bottom.
    pub fn normalized(&self) -> Option<((usize, usize), (usize, usize))> {
        let (start, end) = (self.start?, self.end?);
        if start == end {
            return None;
        }
        if start.0 > end.0 || (start.0 == end.0 && start.1 > end.1) {
            Some((end, start))
        } else {
            Some((start, end))
        }
    }

    /// Character-column range of this selection on one line, if any.
    pub fn span_on_line(&self, line: usize, line_len: usize) -> Option<(usize, usize)> {
        let ((start_line, start_col), (end_line, end_col)) = self.normalized()?;
        if line < start_line || line > end_line {
            return None;
        }
        let from = if line == start_line { start_col.min(line_len) } else { 0 };
        let to = if line == end_line { end_col.min(line_len) } else { line_len };
        (from < to || line_len == 0).then_some((from, to))
    }

    /// Selected text as one whitespace-normalized string: lines joined with
    /// single spaces, runs of whitespace collapsed.
    pub fn extract_text(&self, lines: &[String]) -> String {
        let Some(((start_line, _), (end_line, _))) = self.normalized() else {
            return String::new();
        };

        let mut pieces = Vec::new();
        for line_idx in start_line..=end_line.min(lines.len().saturating_sub(1)) {
            let line = &lines[line_idx];
            let line_len = line.chars().count();
            if let Some((from, to)) = self.span_on_line(line_idx, line_len) {
                let piece: String = line.chars().skip(from).take(to - from).collect();
                pieces.push(piece);
            }
        }

        pieces
            .join(" ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }
}
