//! Thread list view
//!
//! [`ListModel`] holds the fetched items, the cursor, the set of marked ids
//! and the details toggle. It is rebuilt wholesale on every refresh; the
//! cursor and the marks carry over when their targets still exist.

use chrono::{DateTime, Local, Utc};
use mail::{Message, Thread};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::Line;
use ratatui::widgets::Paragraph;
use std::collections::HashSet;

use crate::components::ThreadListItem;

/// Rows kept above the cursor once the list scrolls
pub const LOOKBACK: usize = 5;

/// Anything that can be shown as a row of the list
pub trait ListEntry {
    fn entry_id(&self) -> &str;
    fn date(&self) -> Option<DateTime<Utc>>;
    /// Display name if present, else the address
    fn sender(&self) -> String;
    fn subject(&self) -> &str;
    fn snippet(&self) -> &str;
    fn is_unread(&self) -> bool;
}

impl ListEntry for Thread {
    fn entry_id(&self) -> &str {
        self.id.as_str()
    }

    fn date(&self) -> Option<DateTime<Utc>> {
        Thread::date(self)
    }

    fn sender(&self) -> String {
        self.latest()
            .map(|m| m.sender().short_name().to_string())
            .unwrap_or_default()
    }

    fn subject(&self) -> &str {
        Thread::subject(self)
    }

    fn snippet(&self) -> &str {
        Thread::snippet(self)
    }

    fn is_unread(&self) -> bool {
        Thread::is_unread(self)
    }
}

impl ListEntry for Message {
    fn entry_id(&self) -> &str {
        self.id.as_str()
    }

    fn date(&self) -> Option<DateTime<Utc>> {
        Message::date(self)
    }

    fn sender(&self) -> String {
        Message::sender(self).short_name().to_string()
    }

    fn subject(&self) -> &str {
        Message::subject(self)
    }

    fn snippet(&self) -> &str {
        &self.snippet
    }

    fn is_unread(&self) -> bool {
        Message::is_unread(self)
    }
}

/// Cursor, marks and items of the list view
#[derive(Debug, Clone)]
pub struct ListModel<T> {
    items: Vec<T>,
    current: usize,
    marked: HashSet<String>,
    show_details: bool,
}

impl<T> Default for ListModel<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            current: 0,
            marked: HashSet::new(),
            show_details: false,
        }
    }
}

impl<T: ListEntry> ListModel<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the items. The cursor stays put if still in range and is
    /// clamped otherwise; marks on ids that vanished are dropped.
    pub fn refresh(&mut self, items: Vec<T>) {
        let ids: HashSet<&str> = items.iter().map(|i| i.entry_id()).collect();
        self.marked.retain(|id| ids.contains(id.as_str()));
        self.items = items;
        self.current = self.current.min(self.items.len().saturating_sub(1));
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&T> {
        self.items.get(self.current)
    }

    pub fn move_next(&mut self) {
        if self.current + 1 < self.items.len() {
            self.current += 1;
        }
    }

    pub fn move_previous(&mut self) {
        self.current = self.current.saturating_sub(1);
    }

    pub fn toggle_mark(&mut self, id: &str) {
        if !self.marked.remove(id) {
            self.marked.insert(id.to_string());
        }
    }

    /// Toggle the mark on the current row and step to the next one
    pub fn toggle_mark_current(&mut self) {
        if let Some(id) = self.current().map(|item| item.entry_id().to_string()) {
            self.toggle_mark(&id);
            self.move_next();
        }
    }

    pub fn unmark(&mut self, id: &str) {
        self.marked.remove(id);
    }

    pub fn is_marked(&self, id: &str) -> bool {
        self.marked.contains(id)
    }

    /// Marked ids in list order
    pub fn marked_ids(&self) -> Vec<String> {
        self.items
            .iter()
            .map(|item| item.entry_id())
            .filter(|id| self.marked.contains(*id))
            .map(str::to_string)
            .collect()
    }

    pub fn toggle_details(&mut self) {
        self.show_details = !self.show_details;
    }

    pub fn show_details(&self) -> bool {
        self.show_details
    }

    /// First visible row for a pane of `height` rows.
    ///
    /// Zero until the cursor would leave the pane, then the cursor sits
    /// [`LOOKBACK`] rows from the top.
    pub fn scroll_offset(&self, height: usize) -> usize {
        if height == 0 || self.current < height {
            0
        } else {
            self.current - LOOKBACK.min(height - 1)
        }
    }

    /// Visible lines for a pane of `height` rows
    pub fn lines(&self, height: usize, now: &DateTime<Local>) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for (index, item) in self.items.iter().enumerate().skip(self.scroll_offset(height)) {
            if lines.len() >= height {
                break;
            }
            let is_current = index == self.current;
            let row = ThreadListItem::new(item, is_current, self.is_marked(item.entry_id()));
            lines.push(row.render(now));
            if is_current && self.show_details {
                lines.push(Line::raw(row.detail_text()));
            }
        }
        lines.truncate(height);
        lines
    }
}

/// Draw the thread list into `area`
pub fn render_thread_list<T: ListEntry>(frame: &mut Frame, area: Rect, model: &ListModel<T>) {
    let lines = if model.is_empty() {
        vec![Line::raw("No threads")]
    } else {
        model.lines(area.height as usize, &Local::now())
    };
    frame.render_widget(Paragraph::new(lines), area);
}
