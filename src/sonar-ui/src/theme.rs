use ratatui::style::{Color, Modifier, Style};
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub title: Color,
    pub muted: Color,
    /// Marker colour of the card whose track is playing.
    pub playing: Color,
    pub selection: Color,
    pub error: Color,
    pub notice: Color,
    pub is_color: bool,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            title: Color::Cyan,
            muted: Color::Gray,
            playing: Color::Green,
            selection: Color::DarkGray,
            error: Color::Red,
            notice: Color::Yellow,
            is_color: true,
        }
    }
}

impl Theme {
    pub fn monochrome() -> Self {
        Self {
            title: Color::White,
            muted: Color::Gray,
            playing: Color::White, // marker glyph carries the meaning
            selection: Color::Reset,
            error: Color::White,
            notice: Color::White,
            is_color: false,
        }
    }

    pub fn from_config(name: Option<&str>) -> Self {
        // NO_COLOR wins over config (no-color.org)
        if env::var_os("NO_COLOR").is_some() {
            return Self::monochrome();
        }

        match name {
            Some("monochrome") => Self::monochrome(),
            Some("default") | None => Self::default(),
            Some(other) => {
                tracing::warn!(theme = other, "unknown theme, using default");
                Self::default()
            }
        }
    }

    pub fn selected(&self) -> Style {
        if self.is_color {
            Style::default()
                .bg(self.selection)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::REVERSED)
        }
    }

    pub fn playing_style(&self) -> Style {
        Style::default()
            .fg(self.playing)
            .add_modifier(Modifier::BOLD)
    }

    pub fn banner(&self, is_error: bool) -> Style {
        let color = if is_error { self.error } else { self.notice };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }
}
