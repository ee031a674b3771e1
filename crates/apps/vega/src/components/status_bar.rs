//! Status bar - bottom line with the current status message

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::Widget;

pub struct StatusBar<'a> {
    message: &'a str,
}

impl<'a> StatusBar<'a> {
    pub fn new(message: &'a str) -> Self {
        Self { message }
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default().add_modifier(Modifier::REVERSED);
        buf.set_style(area, style);
        Line::styled(self.message, style).render(area, buf);
    }
}
