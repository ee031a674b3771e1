//! File dialogs - cursor-driven directory navigator for open and save
//!
//! The navigator owns its listing and cursor. Keys that the key map resolves
//! arrive as [`Action`]s; while the save filename is being edited, raw keys
//! go straight into the filename buffer instead.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Margin, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::input::Action;

/// Rows kept above the cursor once the listing scrolls
const LOOKBACK: usize = 5;

/// Cells between the screen edge and the dialog border
const INSET: u16 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

impl DirEntry {
    fn dir(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_dir: true,
            size: 0,
            modified: None,
        }
    }
}

/// List a directory: `.` and `..` first, then directories, then everything
/// else, each group sorted by name.
pub fn read_dir(path: &Path) -> io::Result<Vec<DirEntry>> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();

    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(meta) = stat(&entry.path()) else {
            log::debug!("Skipping {}: gone before it could be read", name);
            continue;
        };
        let item = DirEntry {
            name,
            is_dir: meta.is_dir(),
            size: meta.len(),
            modified: meta.modified().ok(),
        };
        if item.is_dir {
            dirs.push(item);
        } else {
            files.push(item);
        }
    }

    dirs.sort_by(|a, b| a.name.cmp(&b.name));
    files.sort_by(|a, b| a.name.cmp(&b.name));

    let mut entries = vec![DirEntry::dir("."), DirEntry::dir("..")];
    entries.extend(dirs);
    entries.extend(files);
    Ok(entries)
}

/// Metadata following symlinks, or of the link itself when it dangles
fn stat(path: &Path) -> Option<fs::Metadata> {
    fs::metadata(path)
        .or_else(|_| fs::symlink_metadata(path))
        .ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigatorKind {
    Open,
    Save,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigatorOutcome {
    /// Still choosing
    Pending,
    Chosen(PathBuf),
    Cancelled,
}

#[derive(Debug)]
pub struct FileNavigator {
    kind: NavigatorKind,
    dir: PathBuf,
    entries: Vec<DirEntry>,
    /// Index into `entries`; `-1` is the `<save>` row in save dialogs
    cursor: isize,
    filename: String,
    editing: bool,
    last_error: Option<String>,
}

impl FileNavigator {
    /// Choose an existing file, starting in `dir`
    pub fn open(dir: impl AsRef<Path>) -> io::Result<Self> {
        Self::new(NavigatorKind::Open, dir.as_ref(), String::new())
    }

    /// Choose a path to write, starting in `dir` with a suggested filename
    pub fn save(dir: impl AsRef<Path>, filename: impl Into<String>) -> io::Result<Self> {
        Self::new(NavigatorKind::Save, dir.as_ref(), filename.into())
    }

    fn new(kind: NavigatorKind, dir: &Path, filename: String) -> io::Result<Self> {
        let dir = std::path::absolute(dir)?;
        let entries = read_dir(&dir)?;
        Ok(Self {
            kind,
            dir,
            entries,
            cursor: match kind {
                NavigatorKind::Open => 0,
                NavigatorKind::Save => -1,
            },
            filename,
            editing: false,
            last_error: None,
        })
    }

    pub fn kind(&self) -> NavigatorKind {
        self.kind
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entries(&self) -> &[DirEntry] {
        &self.entries
    }

    pub fn cursor(&self) -> isize {
        self.cursor
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn min_cursor(&self) -> isize {
        match self.kind {
            NavigatorKind::Open => 0,
            NavigatorKind::Save => -1,
        }
    }

    /// Handle one key press. `action` is what the navigator key map resolved
    /// the key to, if anything.
    pub fn handle_key(&mut self, key: &KeyEvent, action: Option<Action>) -> NavigatorOutcome {
        if self.editing {
            return self.edit_filename(key);
        }

        match action {
            Some(Action::MoveUp) => {
                self.cursor = (self.cursor - 1).max(self.min_cursor());
                NavigatorOutcome::Pending
            }
            Some(Action::MoveDown) => {
                let last = self.entries.len() as isize - 1;
                self.cursor = (self.cursor + 1).min(last.max(self.min_cursor()));
                NavigatorOutcome::Pending
            }
            Some(Action::OpenSelected) => self.select(),
            Some(Action::ToggleFilenameEdit) if self.kind == NavigatorKind::Save => {
                self.editing = true;
                NavigatorOutcome::Pending
            }
            Some(Action::Cancel) => NavigatorOutcome::Cancelled,
            _ => NavigatorOutcome::Pending,
        }
    }

    fn edit_filename(&mut self, key: &KeyEvent) -> NavigatorOutcome {
        match key.code {
            KeyCode::Tab | KeyCode::Esc => self.editing = false,
            KeyCode::Enter => {
                self.editing = false;
                return self.confirm_save();
            }
            KeyCode::Backspace => {
                self.filename.pop();
            }
            KeyCode::Char('c' | 'g') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return NavigatorOutcome::Cancelled;
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.filename.push(c);
            }
            _ => {}
        }
        NavigatorOutcome::Pending
    }

    fn select(&mut self) -> NavigatorOutcome {
        if self.cursor < 0 {
            return self.confirm_save();
        }
        let Some(entry) = self.entries.get(self.cursor as usize).cloned() else {
            return NavigatorOutcome::Pending;
        };

        if entry.is_dir {
            let target = match entry.name.as_str() {
                "." => self.dir.clone(),
                ".." => self.dir.parent().unwrap_or(&self.dir).to_path_buf(),
                name => self.dir.join(name),
            };
            self.change_dir(target);
            return NavigatorOutcome::Pending;
        }

        match self.kind {
            NavigatorKind::Open => NavigatorOutcome::Chosen(self.dir.join(&entry.name)),
            NavigatorKind::Save => {
                self.filename = entry.name;
                self.cursor = -1;
                NavigatorOutcome::Pending
            }
        }
    }

    fn confirm_save(&mut self) -> NavigatorOutcome {
        if self.filename.trim().is_empty() {
            self.last_error = Some("Filename is empty".to_string());
            return NavigatorOutcome::Pending;
        }
        NavigatorOutcome::Chosen(self.dir.join(&self.filename))
    }

    /// Re-list `target`. On failure the previous listing stays.
    fn change_dir(&mut self, target: PathBuf) {
        match read_dir(&target) {
            Ok(entries) => {
                log::debug!("Navigator entered {}", target.display());
                self.dir = target;
                self.entries = entries;
                self.cursor = 0;
                self.last_error = None;
            }
            Err(e) => {
                log::warn!("Failed to list {}: {}", target.display(), e);
                self.last_error = Some(format!("{}: {}", target.display(), e));
            }
        }
    }

    /// Header lines above the listing
    fn header_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if self.kind == NavigatorKind::Save {
            let caret = if self.editing { "_" } else { "" };
            lines.push(format!("Filename> {}{}", self.filename, caret));
        }
        lines.push(format!("Current dir: {}", self.dir.display()));
        if let Some(err) = &self.last_error {
            lines.push(format!("Error: {}", err));
        }
        lines.push(String::new());
        lines
    }

    /// Listing rows, `<save>` first in save dialogs
    pub fn rows(&self) -> Vec<String> {
        let mut rows = Vec::new();
        if self.kind == NavigatorKind::Save {
            rows.push(self.row("<save>", self.cursor == -1));
        }
        for (index, entry) in self.entries.iter().enumerate() {
            let name = if entry.is_dir {
                format!("{}/", entry.name)
            } else {
                entry.name.clone()
            };
            rows.push(self.row(&name, self.cursor == index as isize));
        }
        rows
    }

    fn row(&self, name: &str, is_current: bool) -> String {
        if is_current {
            format!(" > {}", name)
        } else {
            format!("   {}", name)
        }
    }

    /// First visible listing row when `height` rows fit. The cursor row
    /// always stays on screen.
    pub fn scroll_offset(&self, height: usize) -> usize {
        let shift = match self.kind {
            NavigatorKind::Open => 0,
            NavigatorKind::Save => 1,
        };
        let row = (self.cursor + shift).max(0) as usize;
        row.saturating_sub(LOOKBACK.min(height.saturating_sub(1)))
    }

    /// Draw as a bordered window inset from `area`
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let window = area.inner(Margin {
            horizontal: INSET,
            vertical: INSET,
        });
        let title = match self.kind {
            NavigatorKind::Open => " Open file ",
            NavigatorKind::Save => " Save file ",
        };
        let block = Block::default().borders(Borders::ALL).title(title);
        let inner = block.inner(window);

        let mut lines: Vec<Line> = self
            .header_lines()
            .into_iter()
            .map(|text| {
                if text.starts_with("Error:") {
                    Line::styled(text, Style::default().fg(Color::Red))
                } else {
                    Line::raw(text)
                }
            })
            .collect();
        let room = (inner.height as usize).saturating_sub(lines.len());
        lines.extend(
            self.rows()
                .into_iter()
                .skip(self.scroll_offset(room))
                .take(room)
                .map(Line::raw),
        );

        frame.render_widget(Clear, window);
        frame.render_widget(Paragraph::new(lines).block(block), window);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;
    use tempfile::TempDir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.txt"), "bee").unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::create_dir(dir.path().join("z")).unwrap();
        fs::write(dir.path().join("z").join("inner.txt"), "inner").unwrap();
        dir
    }

    fn names(entries: &[DirEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    fn press(nav: &mut FileNavigator, action: Action) -> NavigatorOutcome {
        nav.handle_key(&key(KeyCode::Null), Some(action))
    }

    #[test]
    fn test_read_dir_ordering() {
        let dir = fixture();
        let entries = read_dir(dir.path()).unwrap();
        assert_eq!(names(&entries), vec![".", "..", "z", "a.txt", "b.txt"]);
        assert!(entries[2].is_dir);
        assert_eq!(entries[4].size, 3);
    }

    #[test]
    fn test_read_dir_missing_is_error() {
        let dir = TempDir::new().unwrap();
        let err = read_dir(&dir.path().join("missing")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_open_descends_and_chooses() {
        let dir = fixture();
        let mut nav = FileNavigator::open(dir.path()).unwrap();
        assert_eq!(nav.cursor(), 0);

        // Cursor on "z"
        press(&mut nav, Action::MoveDown);
        press(&mut nav, Action::MoveDown);
        assert_eq!(press(&mut nav, Action::OpenSelected), NavigatorOutcome::Pending);
        assert!(nav.dir().ends_with("z"));
        assert_eq!(nav.cursor(), 0);
        assert_eq!(names(nav.entries()), vec![".", "..", "inner.txt"]);

        press(&mut nav, Action::MoveDown);
        press(&mut nav, Action::MoveDown);
        let chosen = press(&mut nav, Action::OpenSelected);
        assert_eq!(chosen, NavigatorOutcome::Chosen(nav.dir().join("inner.txt")));
    }

    #[test]
    fn test_parent_is_lexical() {
        let dir = fixture();
        let mut nav = FileNavigator::open(dir.path().join("z")).unwrap();
        press(&mut nav, Action::MoveDown);
        press(&mut nav, Action::OpenSelected);
        assert_eq!(nav.dir(), std::path::absolute(dir.path()).unwrap());
    }

    #[test]
    fn test_cursor_is_clamped() {
        let dir = fixture();
        let mut nav = FileNavigator::open(dir.path()).unwrap();
        press(&mut nav, Action::MoveUp);
        assert_eq!(nav.cursor(), 0);
        for _ in 0..20 {
            press(&mut nav, Action::MoveDown);
        }
        assert_eq!(nav.cursor(), 4);

        let mut save = FileNavigator::save(dir.path(), "out.txt").unwrap();
        assert_eq!(save.cursor(), -1);
        press(&mut save, Action::MoveUp);
        assert_eq!(save.cursor(), -1);
    }

    #[test]
    fn test_save_confirms_filename() {
        let dir = fixture();
        let mut nav = FileNavigator::save(dir.path(), "draft.txt").unwrap();
        let chosen = press(&mut nav, Action::OpenSelected);
        assert_eq!(chosen, NavigatorOutcome::Chosen(nav.dir().join("draft.txt")));
    }

    #[test]
    fn test_save_on_file_copies_name() {
        let dir = fixture();
        let mut nav = FileNavigator::save(dir.path(), "").unwrap();
        // <save>, ., .., z, a.txt
        for _ in 0..4 {
            press(&mut nav, Action::MoveDown);
        }
        assert_eq!(press(&mut nav, Action::OpenSelected), NavigatorOutcome::Pending);
        assert_eq!(nav.filename(), "a.txt");
        assert_eq!(nav.cursor(), -1);
    }

    #[test]
    fn test_save_refuses_empty_filename() {
        let dir = fixture();
        let mut nav = FileNavigator::save(dir.path(), "").unwrap();
        assert_eq!(press(&mut nav, Action::OpenSelected), NavigatorOutcome::Pending);
        assert_eq!(nav.last_error(), Some("Filename is empty"));
    }

    #[test]
    fn test_filename_editing() {
        let dir = fixture();
        let mut nav = FileNavigator::save(dir.path(), "ab").unwrap();
        press(&mut nav, Action::ToggleFilenameEdit);
        assert!(nav.is_editing());

        // 'q' is text while editing, not cancel
        nav.handle_key(&key(KeyCode::Backspace), None);
        nav.handle_key(&key(KeyCode::Char('q')), Some(Action::Cancel));
        assert_eq!(nav.filename(), "aq");

        let chosen = nav.handle_key(&key(KeyCode::Enter), Some(Action::OpenSelected));
        assert_eq!(chosen, NavigatorOutcome::Chosen(nav.dir().join("aq")));
        assert!(!nav.is_editing());
    }

    #[test]
    fn test_open_ignores_filename_edit() {
        let dir = fixture();
        let mut nav = FileNavigator::open(dir.path()).unwrap();
        press(&mut nav, Action::ToggleFilenameEdit);
        assert!(!nav.is_editing());
    }

    #[test]
    fn test_cancel() {
        let dir = fixture();
        let mut nav = FileNavigator::open(dir.path()).unwrap();
        assert_eq!(press(&mut nav, Action::Cancel), NavigatorOutcome::Cancelled);

        let mut save = FileNavigator::save(dir.path(), "x").unwrap();
        save.handle_key(&key(KeyCode::Tab), Some(Action::ToggleFilenameEdit));
        let mut ctrl_g = KeyEvent::new(KeyCode::Char('g'), KeyModifiers::CONTROL);
        ctrl_g.kind = KeyEventKind::Press;
        assert_eq!(save.handle_key(&ctrl_g, None), NavigatorOutcome::Cancelled);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_dir_keeps_listing() {
        use std::os::unix::fs::PermissionsExt;

        let dir = fixture();
        let locked = dir.path().join("z");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(&locked).is_ok() {
            // Running as root; permissions are not enforced
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let mut nav = FileNavigator::open(dir.path()).unwrap();
        press(&mut nav, Action::MoveDown);
        press(&mut nav, Action::MoveDown);
        press(&mut nav, Action::OpenSelected);
        assert_eq!(nav.cursor(), 2);
        assert_eq!(names(nav.entries()), vec![".", "..", "z", "a.txt", "b.txt"]);
        assert!(nav.last_error().is_some());

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn test_rows_and_offset() {
        let dir = fixture();
        let mut nav = FileNavigator::save(dir.path(), "x").unwrap();
        let rows = nav.rows();
        assert_eq!(rows[0], " > <save>");
        assert_eq!(rows[3], "   z/");
        assert_eq!(nav.scroll_offset(20), 0);

        for _ in 0..6 {
            press(&mut nav, Action::MoveDown);
        }
        assert_eq!(nav.cursor(), 4);
        assert_eq!(nav.scroll_offset(20), 0);
    }

    #[test]
    fn test_scroll_offset_keeps_cursor_visible() {
        let dir = fixture();
        for i in 0..10 {
            fs::write(dir.path().join(format!("f{i}.txt")), "").unwrap();
        }
        let mut nav = FileNavigator::open(dir.path()).unwrap();
        for _ in 0..9 {
            press(&mut nav, Action::MoveDown);
        }
        assert_eq!(nav.cursor(), 9);

        assert_eq!(nav.scroll_offset(20), 4);
        for height in 1..=6 {
            let offset = nav.scroll_offset(height);
            assert!(offset <= 9 && 9 < offset + height, "height {height}");
        }
        assert_eq!(nav.scroll_offset(3), 7);
        assert_eq!(nav.scroll_offset(0), 9);
    }

    #[test]
    fn test_stat_missing_entry() {
        let dir = TempDir::new().unwrap();
        assert!(stat(&dir.path().join("vanished")).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_read_dir_lists_dangling_symlink() {
        let dir = fixture();
        std::os::unix::fs::symlink(dir.path().join("missing"), dir.path().join("link")).unwrap();
        let entries = read_dir(dir.path()).unwrap();
        assert_eq!(names(&entries), vec![".", "..", "z", "a.txt", "b.txt", "link"]);
        assert!(!entries[5].is_dir);
    }
}
