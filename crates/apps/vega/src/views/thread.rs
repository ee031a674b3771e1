//! Thread view - displays an open thread with a scrolling body

use mail::{Label, Message, Thread, label_names};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::Paragraph;

use crate::components::thread_list_item::format_local_timestamp;

/// Extra rows the body may scroll past its end
pub const HEADER_PADDING: i64 = 10;

/// Rows moved by a single scroll step
pub const SCROLL_STEP: i64 = 2;

/// Rows taken by the fixed header above the body
const HEADER_ROWS: u16 = 3;

/// The open thread and its scroll position
#[derive(Debug, Default)]
pub struct ThreadView {
    thread: Option<Thread>,
    /// Fully fetched messages, in thread order
    messages: Vec<Message>,
    /// 1-based position of the thread in the list, and the list length
    position: (usize, usize),
    scroll: usize,
}

impl ThreadView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a thread. Scroll resets to the top.
    pub fn open(&mut self, thread: Thread, messages: Vec<Message>, position: usize, total: usize) {
        self.thread = Some(thread);
        self.messages = messages;
        self.position = (position, total);
        self.scroll = 0;
    }

    pub fn close(&mut self) {
        self.thread = None;
        self.messages.clear();
        self.scroll = 0;
    }

    pub fn thread(&self) -> Option<&Thread> {
        self.thread.as_ref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The most recent message, which replies and saves act on
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    /// Lines of the fixed header
    pub fn header_lines(&self, labels: &[Label], width: usize) -> Vec<String> {
        let Some(thread) = &self.thread else {
            return Vec::new();
        };
        let names = label_names(&thread.label_ids(), labels);
        vec![
            format!(
                "Thread {} of {}: {} ({} messages)",
                self.position.0,
                self.position.1,
                thread.subject(),
                self.messages.len()
            ),
            format!("Labels: {}", names.join(", ")),
            "-".repeat(width),
        ]
    }

    /// Lines of the scrolling body.
    ///
    /// Every message gets a `timestamp - From` line. Bodies are shown for
    /// unread messages and for the last message.
    pub fn body_lines(&self) -> Vec<String> {
        self.body().into_iter().map(|(_, text)| text).collect()
    }

    /// Body lines tagged with whether they start a message
    fn body(&self) -> Vec<(bool, String)> {
        let mut lines = Vec::new();
        let last = self.messages.len().saturating_sub(1);
        for (index, msg) in self.messages.iter().enumerate() {
            lines.push((
                true,
                format!(
                    "{:>7} - {}",
                    format_local_timestamp(msg.date()),
                    msg.header("From").unwrap_or_default()
                ),
            ));
            if msg.is_unread() || index == last {
                lines.extend(msg.body_text().lines().map(|l| (false, l.to_string())));
                lines.push((false, String::new()));
            }
        }
        lines
    }

    /// Largest scroll offset for a body pane of `visible` rows
    pub fn max_scroll(&self, visible: usize) -> usize {
        let total = self.body_lines().len() as i64;
        (total - visible as i64 + HEADER_PADDING).max(0) as usize
    }

    /// Move by `delta` rows, clamped to `0..=max_scroll(visible)`
    pub fn scroll_by(&mut self, delta: i64, visible: usize) {
        let max = self.max_scroll(visible) as i64;
        let target = (self.scroll as i64).saturating_add(delta);
        self.scroll = target.clamp(0, max) as usize;
    }

    pub fn page_down(&mut self, visible: usize) {
        self.scroll_by(visible as i64, visible);
    }

    pub fn page_up(&mut self, visible: usize) {
        self.scroll_by(-(visible as i64), visible);
    }

    pub fn scroll_down(&mut self, visible: usize) {
        self.scroll_by(SCROLL_STEP, visible);
    }

    pub fn scroll_up(&mut self, visible: usize) {
        self.scroll_by(-SCROLL_STEP, visible);
    }

    /// Rows available to the body in a pane of `height` rows
    pub fn body_height(height: u16) -> usize {
        height.saturating_sub(HEADER_ROWS) as usize
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, labels: &[Label]) {
        let [header_area, body_area] =
            Layout::vertical([Constraint::Length(HEADER_ROWS), Constraint::Min(0)]).areas(area);

        let header: Vec<Line> = self
            .header_lines(labels, area.width as usize)
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                if i == 0 {
                    Line::styled(text, Style::default().add_modifier(Modifier::BOLD))
                } else {
                    Line::raw(text)
                }
            })
            .collect();
        frame.render_widget(Paragraph::new(header), header_area);

        let body: Vec<Line> = self
            .body()
            .into_iter()
            .skip(self.scroll)
            .take(body_area.height as usize)
            .map(|(starts_message, text)| {
                if starts_message {
                    Line::styled(text, Style::default().fg(Color::Green))
                } else {
                    Line::raw(text)
                }
            })
            .collect();
        frame.render_widget(Paragraph::new(body), body_area);
    }
}
