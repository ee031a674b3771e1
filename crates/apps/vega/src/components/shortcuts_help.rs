//! Keyboard shortcuts help overlay
//!
//! Displays a centered window listing all available keyboard shortcuts.

use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};

use crate::input::{ShortcutCategory, shortcuts_help};

/// Width of the key column
const KEYS_WIDTH: usize = 22;

/// Shortcuts help overlay component
pub struct ShortcutsHelp {
    categories: Vec<ShortcutCategory>,
}

impl ShortcutsHelp {
    pub fn new() -> Self {
        Self {
            categories: shortcuts_help(),
        }
    }
}

impl Default for ShortcutsHelp {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for ShortcutsHelp {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let window = centered(area, 90, 90);
        Clear.render(window, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Keyboard Shortcuts ")
            .title_bottom(" Press Escape or ? to close ");
        let inner = block.inner(window);
        block.render(window, buf);

        // Two columns so every category fits
        let [left, right] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(inner);
        let split = self.categories.len().div_ceil(2);
        Paragraph::new(category_lines(&self.categories[..split])).render(left, buf);
        Paragraph::new(category_lines(&self.categories[split..])).render(right, buf);
    }
}

fn category_lines(categories: &[ShortcutCategory]) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for category in categories {
        lines.push(Line::styled(
            category.name,
            Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        ));
        for shortcut in &category.shortcuts {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("  {:<width$}", shortcut.keys, width = KEYS_WIDTH),
                    Style::default().fg(Color::Cyan),
                ),
                Span::raw(shortcut.description),
            ]));
        }
        lines.push(Line::raw(""));
    }
    lines
}

/// A rectangle of the given percentage size centered in `area`
fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let [_, middle, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(area);
    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(middle);
    center
}
