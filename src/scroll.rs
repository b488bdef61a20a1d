use crate::layout::LineGrid;
use crate::position::Position;
use log::debug;

/// Where the viewport was before a reflow: the topmost visible anchored
/// sentence and its fractional offset within the old viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeAnchor {
    pub position: Position,
    pub fraction: f32,
}

const ANIMATION_BASE_SPEED: f32 = 0.15;
const CONVERGENCE_THRESHOLD: f32 = 0.5;
const SNAP_THRESHOLD: f32 = 0.1;
const MIN_STEP: f32 = 2.0;
const MAX_ANIMATION_TICKS: u32 = 80;

#[derive(Debug, Clone, Copy)]
struct Animation {
    ticks: u32,
}

/// Viewport offset state. The offset is fractional while an animation is in
/// flight and is clamped to `[0, max_scroll]` after every operation.
#[derive(Debug)]
pub struct ScrollState {
    offset: f32,
    target: f32,
    viewport_height: usize,
    animation: Option<Animation>,
}

impl ScrollState {
    pub fn new(viewport_height: usize) -> Self {
        Self {
            offset: 0.0,
            target: 0.0,
            viewport_height: viewport_height.max(1),
            animation: None,
        }
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// First visible grid line.
    pub fn top_line(&self) -> usize {
        self.offset as usize
    }

    pub fn viewport_height(&self) -> usize {
        self.viewport_height
    }

    pub fn set_viewport_height(&mut self, height: usize) {
        self.viewport_height = height.max(1);
    }

    pub fn max_scroll(&self, total_lines: usize) -> f32 {
        total_lines.saturating_sub(self.viewport_height) as f32
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Idempotent; safe to call with no animation in flight.
    pub fn cancel_animation(&mut self) {
        self.animation = None;
        self.target = self.offset;
    }

    pub fn is_line_visible(&self, line: usize) -> bool {
        let top = self.top_line();
        line >= top && line < top + self.viewport_height
    }

    /// Offset that puts `line` in the middle of the viewport, clamped.
    pub fn centered_offset(&self, line: usize, total_lines: usize) -> f32 {
        let raw = line.saturating_sub(self.viewport_height / 2) as f32;
        raw.clamp(0.0, self.max_scroll(total_lines))
    }

    /// Immediate jump for explicit navigation: synchronous, no animation, so
    /// rapid repeated input always lands exactly where it should.
    pub fn jump_to_line(&mut self, line: usize, total_lines: usize) {
        let offset = self.centered_offset(line, total_lines);
        self.set_offset(offset, total_lines);
    }

    pub fn set_offset(&mut self, offset: f32, total_lines: usize) {
        self.animation = None;
        self.offset = offset.clamp(0.0, self.max_scroll(total_lines));
        self.target = self.offset;
    }

    pub fn scroll_by(&mut self, delta: f32, total_lines: usize) {
        self.set_offset(self.offset + delta, total_lines);
    }

    pub fn page_up(&mut self, total_lines: usize) {
        self.scroll_by(-(self.viewport_height as f32), total_lines);
    }

    pub fn page_down(&mut self, total_lines: usize) {
        self.scroll_by(self.viewport_height as f32, total_lines);
    }

    pub fn to_beginning(&mut self, total_lines: usize) {
        self.set_offset(0.0, total_lines);
    }

    pub fn to_end(&mut self, total_lines: usize) {
        self.set_offset(self.max_scroll(total_lines), total_lines);
    }

    /// Starts a smooth scroll towards `target_offset`, superseding any
    /// animation already in flight. Tiny gaps snap immediately instead of
    /// micro-stepping.
    pub fn smooth_scroll_to(&mut self, target_offset: f32, total_lines: usize) {
        self.target = target_offset.clamp(0.0, self.max_scroll(total_lines));
        if (self.target - self.offset).abs() < SNAP_THRESHOLD {
            self.offset = self.target;
            self.animation = None;
            return;
        }
        self.animation = Some(Animation { ticks: 0 });
    }

    /// Advances the in-flight animation by one tick. Step size grows with
    /// the remaining distance; the animation ends on convergence or when the
    /// tick budget runs out, snapping to the target either way. Returns true
    /// when the offset moved.
    pub fn tick_animation(&mut self, total_lines: usize) -> bool {
        let Some(animation) = self.animation.as_mut() else {
            return false;
        };

        let diff = self.target - self.offset;
        let distance = diff.abs();
        if distance <= CONVERGENCE_THRESHOLD || animation.ticks >= MAX_ANIMATION_TICKS {
            self.offset = self.target;
            self.animation = None;
            return true;
        }

        let mut step = diff * ANIMATION_BASE_SPEED;
        if distance > 30.0 {
            step *= 2.5;
        } else if distance > 15.0 {
            step *= 1.8;
        } else if distance > 5.0 {
            step *= 1.2;
        } else if distance < 2.0 {
            step *= 0.7;
        }
        if step.abs() < MIN_STEP {
            step = if diff > 0.0 { MIN_STEP } else { -MIN_STEP };
        }
        if step.abs() > distance {
            step = diff;
        }

        animation.ticks += 1;
        self.offset = (self.offset + step).clamp(0.0, self.max_scroll(total_lines));
        true
    }

    /// Captures the reading place before a reflow: the topmost visible
    /// anchored sentence and how far down the viewport it sat.
    pub fn capture_resize_anchor(&self, grid: &LineGrid) -> Option<ResizeAnchor> {
        let position = grid.topmost_anchor_in_view(self.top_line(), self.viewport_height)?;
        let line = grid.anchor_line(position)?;
        let fraction = (line as f32 - self.offset) / self.viewport_height as f32;
        Some(ResizeAnchor {
            position,
            fraction: fraction.clamp(0.0, 1.0),
        })
    }

    /// Re-resolves the offset against a rebuilt grid so the anchored
    /// sentence reappears at the same fraction of the new viewport.
    pub fn apply_resize_anchor(&mut self, anchor: ResizeAnchor, grid: &LineGrid) {
        let Some(line) = grid.nearest_anchor_line(anchor.position) else {
            debug!("resize anchor {:?} has no line after reflow", anchor.position);
            self.set_offset(self.offset, grid.total_lines());
            return;
        };
        let offset = line as f32 - anchor.fraction * self.viewport_height as f32;
        self.set_offset(offset, grid.total_lines());
    }
}
