//! Thread list item component - formats a single row of the thread list

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use std::fmt::Display;

use crate::views::ListEntry;

/// Width of the timestamp column
pub const TIMESTAMP_WIDTH: usize = 7;

/// Width of the sender column
pub const SENDER_WIDTH: usize = 20;

/// A single row of the thread list
pub struct ThreadListItem<'a, T> {
    entry: &'a T,
    is_current: bool,
    is_marked: bool,
}

impl<'a, T: ListEntry> ThreadListItem<'a, T> {
    pub fn new(entry: &'a T, is_current: bool, is_marked: bool) -> Self {
        Self {
            entry,
            is_current,
            is_marked,
        }
    }

    /// Row text: current indicator, flag, timestamp, sender, subject
    pub fn text<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> String
    where
        Tz::Offset: Display,
    {
        let cursor = if self.is_current { '*' } else { ' ' };
        let flag = if self.is_marked {
            'X'
        } else if self.entry.is_unread() {
            '>'
        } else {
            ' '
        };

        format!(
            "{}{} {:>tw$} | {:>sw$} | {}",
            cursor,
            flag,
            format_timestamp(self.entry.date(), now),
            truncate(&self.entry.sender(), SENDER_WIDTH),
            self.entry.subject(),
            tw = TIMESTAMP_WIDTH,
            sw = SENDER_WIDTH,
        )
    }

    /// The snippet line shown under the current row when details are on
    pub fn detail_text(&self) -> String {
        format!("    {}", self.entry.snippet())
    }

    pub fn render<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Line<'static>
    where
        Tz::Offset: Display,
    {
        let mut style = Style::default();
        if self.is_current {
            style = style.add_modifier(Modifier::REVERSED);
        }
        if self.entry.is_unread() {
            style = style.add_modifier(Modifier::BOLD);
        }
        Line::styled(self.text(now), style)
    }
}

/// Format a timestamp for the list, relative to `now` in `now`'s timezone.
///
/// Older than a year shows the year, another day shows `Mon DD`, today
/// shows `HH:MM`.
pub fn format_timestamp<Tz: TimeZone>(date: Option<DateTime<Utc>>, now: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    let Some(date) = date else {
        return "Unknown".to_string();
    };
    let local = date.with_timezone(&now.timezone());

    if now.clone().signed_duration_since(&local) > TimeDelta::days(365) {
        local.format("%Y").to_string()
    } else if local.date_naive() != now.date_naive() {
        local.format("%b %d").to_string()
    } else {
        local.format("%H:%M").to_string()
    }
}

/// Format a date in the local timezone against the current time
pub fn format_local_timestamp(date: Option<DateTime<Utc>>) -> String {
    format_timestamp(date, &Local::now())
}

fn truncate(s: &str, width: usize) -> String {
    s.chars().take(width).collect()
}
