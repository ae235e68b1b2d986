use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};

const HELP_MD: &str = include_str!("help/help.md");

/// Key reference shown in the overlay, rendered from a small Markdown file.
#[derive(Debug, Clone)]
pub struct HelpContent {
    lines: Vec<Line<'static>>,
}

impl Default for HelpContent {
    fn default() -> Self {
        Self::new()
    }
}

impl HelpContent {
    pub fn new() -> Self {
        Self {
            lines: parse_markdown(HELP_MD),
        }
    }

    pub fn text(&self) -> Text<'static> {
        Text::from(self.lines.clone())
    }
}

fn parse_markdown(markdown: &str) -> Vec<Line<'static>> {
    markdown.lines().map(parse_line).collect()
}

fn parse_line(line: &str) -> Line<'static> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Line::from("");
    }

    let heading = Style::default().add_modifier(Modifier::BOLD);
    if let Some(content) = trimmed.strip_prefix("## ") {
        return Line::from(Span::styled(content.to_string(), heading));
    }
    if let Some(content) = trimmed.strip_prefix("# ") {
        return Line::from(Span::styled(content.to_uppercase(), heading));
    }
    if let Some(content) = trimmed.strip_prefix("- ") {
        return Line::from(format!("  • {content}"));
    }

    Line::from(trimmed.to_string())
}
