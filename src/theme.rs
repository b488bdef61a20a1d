use ratatui::style::{Color, Modifier, Style};

/// The handful of color roles lectern paints. One built-in scheme; theming
/// engines are out of scope.
pub struct Palette {
    pub background: Color,
    pub text: Color,
    pub dimmed: Color,
    pub highlight_fg: Color,
    pub highlight_bg: Color,
    pub selection_bg: Color,
    pub playing: Color,
    pub paused: Color,
    pub accent: Color,
}

/// Oceanic Next base16 values, mapped onto the roles above.
pub const OCEANIC: Palette = Palette {
    background: Color::Rgb(0x1b, 0x2b, 0x34),
    text: Color::Rgb(0xd8, 0xde, 0xe9),
    dimmed: Color::Rgb(0x65, 0x73, 0x7e),
    highlight_fg: Color::Rgb(0x1b, 0x2b, 0x34),
    highlight_bg: Color::Rgb(0xfa, 0xc8, 0x63),
    selection_bg: Color::Rgb(0x34, 0x3d, 0x46),
    playing: Color::Rgb(0x99, 0xc7, 0x94),
    paused: Color::Rgb(0xec, 0x5f, 0x67),
    accent: Color::Rgb(0x66, 0x99, 0xcc),
};

impl Palette {
    pub fn text_style(&self) -> Style {
        Style::default().fg(self.text)
    }

    pub fn highlight_style(&self) -> Style {
        Style::default()
            .fg(self.highlight_fg)
            .bg(self.highlight_bg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn selection_style(&self) -> Style {
        Style::default().fg(self.text).bg(self.selection_bg)
    }

    pub fn status_style(&self, paused: bool) -> Style {
        Style::default().fg(if paused { self.paused } else { self.playing })
    }
}
