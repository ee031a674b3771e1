//! Main application state
//!
//! [`App`] owns every piece of session state: the active view, the thread
//! list, the open thread, any file dialog and the status line. Key presses
//! resolve through the [`Keymap`] for the active view and run against it.
//! Remote calls fan out through the fetch coordinator; their results are
//! applied here, on the UI thread.

use anyhow::{Context as _, Result};
use crossterm::event::{KeyCode, KeyEvent};
use log::{debug, info, warn};
use mail::compose::{compose_seed, reply_seed};
use mail::{
    ActionHandler, Apply, BatchReport, Label, MailService, Parallel, Thread, ThreadId, fetch_all,
    spawn_best_effort,
};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::components::{ShortcutsHelp, StatusBar};
use crate::editor::{ComposeMode, TextEditor, run_mode_loop};
use crate::input::{Action, Context, Keymap, keystroke};
use crate::settings::Settings;
use crate::terminal::TerminalControl;
use crate::views::{
    FileNavigator, ListModel, NavigatorKind, NavigatorOutcome, ThreadView, render_thread_list,
};

/// Main pane height assumed until the first draw
const INITIAL_PANE_HEIGHT: u16 = 23;

/// Suggested filename for saved drafts
const DRAFT_FILENAME: &str = "draft.txt";

/// Suggested filename for saved messages
const MESSAGE_FILENAME: &str = "message.txt";

/// Which view has the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    ThreadList,
    OpenThread,
    FileOpen,
    FileSave,
}

/// A label mutation applied to each marked thread
type ThreadOp = fn(&ActionHandler, &ThreadId) -> Result<()>;

/// Results of a batch label change, collected on the UI thread
#[derive(Default)]
struct BatchOutcome {
    report: BatchReport,
    done: Vec<String>,
}

pub struct App {
    mode: ViewMode,
    /// View to return to when a file dialog closes
    return_mode: ViewMode,
    list: ListModel<Thread>,
    thread_view: ThreadView,
    navigator: Option<FileNavigator>,
    /// Text waiting for the save dialog to pick a path
    pending_save: Option<String>,
    labels: Vec<Label>,
    status: String,
    show_help: bool,
    settings: Settings,
    reply_regex: Regex,
    keymap: Keymap,
    actions: ActionHandler,
    editor: Box<dyn TextEditor>,
    /// Height of the main pane at the last draw
    pane_height: u16,
}

impl App {
    /// Set up the session. Fails if the settings are unusable or the
    /// label list cannot be fetched.
    pub fn new(
        settings: Settings,
        service: Arc<dyn MailService>,
        editor: Box<dyn TextEditor>,
    ) -> Result<Self> {
        let reply_regex = settings.reply_regex()?;
        let keymap = Keymap::with_overrides(&settings.bindings);
        let labels = service.list_labels().context("Failed to list labels")?;
        info!("Loaded {} labels", labels.len());

        Ok(Self {
            mode: ViewMode::ThreadList,
            return_mode: ViewMode::ThreadList,
            list: ListModel::new(),
            thread_view: ThreadView::new(),
            navigator: None,
            pending_save: None,
            labels,
            status: String::new(),
            show_help: false,
            settings,
            reply_regex,
            keymap,
            actions: ActionHandler::new(service),
            editor,
            pane_height: INITIAL_PANE_HEIGHT,
        })
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn list(&self) -> &ListModel<Thread> {
        &self.list
    }

    pub fn thread_view(&self) -> &ThreadView {
        &self.thread_view
    }

    pub fn navigator(&self) -> Option<&FileNavigator> {
        self.navigator.as_ref()
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn is_help_visible(&self) -> bool {
        self.show_help
    }

    fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
        debug!("Status: {}", self.status);
    }

    /// Handle one key press. Returns true when the user asked to quit.
    pub fn handle_key(&mut self, key: KeyEvent, term: &mut dyn TerminalControl) -> bool {
        if self.show_help {
            let action = self.keymap.resolve(Context::ThreadList, &key);
            if key.code == KeyCode::Esc || action == Some(Action::ShowShortcuts) {
                self.show_help = false;
            }
            return false;
        }

        let context = match self.mode {
            ViewMode::ThreadList => Context::ThreadList,
            ViewMode::OpenThread => Context::Thread,
            ViewMode::FileOpen | ViewMode::FileSave => {
                let action = self.keymap.resolve(Context::Navigator, &key);
                let editing = self.navigator.as_ref().is_some_and(FileNavigator::is_editing);
                return match action {
                    Some(global @ (Action::ShowShortcuts | Action::Quit)) if !editing => {
                        self.run_action(global, term)
                    }
                    _ => {
                        self.handle_navigator_key(&key, action, term);
                        false
                    }
                };
            }
        };

        match self.keymap.resolve(context, &key) {
            Some(action) => self.run_action(action, term),
            None => {
                self.set_status(format!("unknown key: {}", keystroke(&key)));
                false
            }
        }
    }

    fn run_action(&mut self, action: Action, term: &mut dyn TerminalControl) -> bool {
        let height = ThreadView::body_height(self.pane_height);
        match (self.mode, action) {
            (_, Action::Quit) => return true,
            (_, Action::ShowShortcuts) => self.show_help = !self.show_help,

            (ViewMode::ThreadList, Action::MoveUp) => self.list.move_previous(),
            (ViewMode::ThreadList, Action::MoveDown) => self.list.move_next(),
            (ViewMode::ThreadList, Action::OpenSelected) => self.open_current(),
            (ViewMode::ThreadList, Action::ToggleDetails) => self.list.toggle_details(),
            (ViewMode::ThreadList, Action::ToggleMark) => self.list.toggle_mark_current(),
            (ViewMode::ThreadList, Action::Refresh) => self.refresh(),
            (ViewMode::ThreadList, Action::Archive) => {
                self.batch_apply("archived", ActionHandler::archive_thread)
            }
            (ViewMode::ThreadList, Action::Trash) => {
                self.batch_apply("trashed", ActionHandler::trash_thread)
            }
            (ViewMode::ThreadList, Action::Compose) => self.compose(term),
            (ViewMode::ThreadList, Action::ComposeFromFile) => self.compose_from_file(),

            (ViewMode::OpenThread, Action::GoBack) => self.close_thread(),
            (ViewMode::OpenThread, Action::ScrollUp) => self.thread_view.scroll_up(height),
            (ViewMode::OpenThread, Action::ScrollDown) => self.thread_view.scroll_down(height),
            (ViewMode::OpenThread, Action::PageUp) => self.thread_view.page_up(height),
            (ViewMode::OpenThread, Action::PageDown) => self.thread_view.page_down(height),
            (ViewMode::OpenThread, Action::PrevThread) => self.prev_thread(),
            (ViewMode::OpenThread, Action::NextThread) => self.next_thread(),
            (ViewMode::OpenThread, Action::MarkAndNext) => self.mark_and_next(),
            (ViewMode::OpenThread, Action::Reply) => self.reply(term),
            (ViewMode::OpenThread, Action::Archive) => self.archive_open_thread(),
            (ViewMode::OpenThread, Action::SaveMessage) => self.save_message(),

            (mode, action) => debug!("Ignoring {:?} in {:?}", action, mode),
        }
        false
    }

    /// Re-list threads and fetch each one in parallel
    pub fn refresh(&mut self) {
        match self.reload() {
            Ok(report) if report.failed > 0 => self.set_status(format!(
                "Loaded {} threads, {} failed: {}",
                report.ok,
                report.failed,
                report.last_error.unwrap_or_default()
            )),
            Ok(report) => self.set_status(format!("Loaded {} threads", report.ok)),
            Err(e) => self.set_status(format!("Failed to list threads: {:#}", e)),
        }
    }

    fn reload(&mut self) -> Result<BatchReport> {
        let service = self.actions.service().clone();
        let summaries = service.list_threads(&self.settings.query, self.settings.max_results)?;
        let ids: Vec<ThreadId> = summaries.into_iter().map(|s| s.id).collect();
        debug!("Fetching {} threads", ids.len());

        let (threads, report) = fetch_all(ids, move |id| service.get_thread(&id));
        self.list.refresh(threads.into_iter().flatten().collect());
        Ok(report)
    }

    /// Open the thread under the cursor, fetching every message in full
    pub fn open_current(&mut self) {
        let Some(thread) = self.list.current().cloned() else {
            self.set_status("No thread selected");
            return;
        };

        let service = self.actions.service().clone();
        let (full, report) = fetch_all(thread.message_ids(), move |id| service.get_message(&id));
        // Keep the metadata copy of any message that failed to load
        let messages: Vec<_> = full
            .into_iter()
            .zip(&thread.messages)
            .map(|(full, meta)| full.unwrap_or_else(|| meta.clone()))
            .collect();

        if report.failed > 0 {
            self.set_status(format!(
                "Failed to load {} of {} messages: {}",
                report.failed,
                report.total(),
                report.last_error.as_deref().unwrap_or_default()
            ));
        } else {
            self.set_status("");
        }

        if thread.is_unread() {
            let actions = self.actions.clone();
            let id = thread.id.clone();
            spawn_best_effort("mark-read", move || actions.mark_read(&id));
        }

        let position = self.list.current_index() + 1;
        let total = self.list.len();
        self.thread_view.open(thread, messages, position, total);
        self.mode = ViewMode::OpenThread;
    }

    pub fn close_thread(&mut self) {
        self.thread_view.close();
        self.mode = ViewMode::ThreadList;
    }

    pub fn next_thread(&mut self) {
        let before = self.list.current_index();
        self.list.move_next();
        self.reopen_if_moved(before);
    }

    pub fn prev_thread(&mut self) {
        let before = self.list.current_index();
        self.list.move_previous();
        self.reopen_if_moved(before);
    }

    /// Toggle the mark on the open thread and open the next one
    pub fn mark_and_next(&mut self) {
        let before = self.list.current_index();
        self.list.toggle_mark_current();
        self.reopen_if_moved(before);
    }

    fn reopen_if_moved(&mut self, before: usize) {
        if self.list.current_index() == before {
            self.set_status("No more threads");
        } else {
            self.open_current();
        }
    }

    /// Apply `op` to every marked thread in parallel, then refresh.
    ///
    /// Threads that succeed are unmarked; failures stay marked.
    pub fn batch_apply(&mut self, verb: &'static str, op: ThreadOp) {
        let ids = self.list.marked_ids();
        if ids.is_empty() {
            self.set_status("No threads marked");
            return;
        }
        info!("Batch {}: {} threads", verb, ids.len());

        let mut batch: Parallel<BatchOutcome> = Parallel::new();
        for id in ids {
            let actions = self.actions.clone();
            batch.add(move || -> Apply<BatchOutcome> {
                let result = op(&actions, &ThreadId::new(id.clone()));
                Box::new(move |outcome: &mut BatchOutcome| match result {
                    Ok(()) => {
                        outcome.report.ok += 1;
                        outcome.done.push(id);
                    }
                    Err(e) => {
                        warn!("Thread {} not {}: {:#}", id, verb, e);
                        outcome.report.record_failure(format!("{:#}", e));
                    }
                })
            });
        }

        let mut outcome = BatchOutcome::default();
        let status = match batch.run(&mut outcome) {
            Ok(_) => outcome.report.summary(verb),
            Err(e) => format!("Failed to start batch: {:#}", e),
        };
        for id in &outcome.done {
            self.list.unmark(id);
        }

        match self.reload() {
            Ok(_) => self.set_status(status),
            Err(e) => self.set_status(format!("{}; refresh failed: {:#}", status, e)),
        }
    }

    fn archive_open_thread(&mut self) {
        let Some(id) = self.thread_view.thread().map(|t| t.id.clone()) else {
            return;
        };
        match self.actions.archive_thread(&id) {
            Ok(()) => {
                self.close_thread();
                self.refresh();
                self.set_status("Archived");
            }
            Err(e) => self.set_status(format!("Failed to archive: {:#}", e)),
        }
    }

    /// Write a new message in the editor
    pub fn compose(&mut self, term: &mut dyn TerminalControl) {
        let seed = compose_seed(&self.settings.signature);
        self.edit_and_dispatch(term, &seed);
    }

    /// Reply to the last message of the open thread
    pub fn reply(&mut self, term: &mut dyn TerminalControl) {
        let Some(original) = self.thread_view.last_message() else {
            self.set_status("No message to reply to");
            return;
        };
        let seed = reply_seed(
            original,
            &self.reply_regex,
            &self.settings.reply_prefix,
            &self.settings.signature,
        );
        self.edit_and_dispatch(term, &seed);
    }

    /// Pick a file whose contents seed the editor
    pub fn compose_from_file(&mut self) {
        match FileNavigator::open(start_dir()) {
            Ok(navigator) => self.enter_navigator(navigator),
            Err(e) => self.set_status(format!("Failed to list directory: {}", e)),
        }
    }

    /// Pick a path and write `text` to it
    pub fn save_draft(&mut self, text: String) {
        self.start_save(DRAFT_FILENAME, text);
    }

    /// Pick a path and write the body of the last message of the open thread
    pub fn save_message(&mut self) {
        let Some(body) = self.thread_view.last_message().map(|m| m.body_text()) else {
            self.set_status("No message to save");
            return;
        };
        self.start_save(MESSAGE_FILENAME, body);
    }

    fn start_save(&mut self, filename: &str, text: String) {
        match FileNavigator::save(start_dir(), filename) {
            Ok(navigator) => {
                self.pending_save = Some(text);
                self.enter_navigator(navigator);
            }
            Err(e) => self.set_status(format!("Failed to list directory: {}", e)),
        }
    }

    fn enter_navigator(&mut self, navigator: FileNavigator) {
        // A dialog opened from a dialog returns where the first one would
        if !matches!(self.mode, ViewMode::FileOpen | ViewMode::FileSave) {
            self.return_mode = self.mode;
        }
        self.mode = match navigator.kind() {
            NavigatorKind::Open => ViewMode::FileOpen,
            NavigatorKind::Save => ViewMode::FileSave,
        };
        self.navigator = Some(navigator);
    }

    fn leave_navigator(&mut self) {
        self.navigator = None;
        self.mode = self.return_mode;
    }

    fn handle_navigator_key(
        &mut self,
        key: &KeyEvent,
        action: Option<Action>,
        term: &mut dyn TerminalControl,
    ) {
        let Some(navigator) = self.navigator.as_mut() else {
            self.mode = self.return_mode;
            return;
        };

        match navigator.handle_key(key, action) {
            NavigatorOutcome::Pending => {}
            NavigatorOutcome::Cancelled => {
                self.pending_save = None;
                self.leave_navigator();
                self.set_status("Cancelled");
            }
            NavigatorOutcome::Chosen(path) => {
                let kind = navigator.kind();
                self.leave_navigator();
                match kind {
                    NavigatorKind::Open => self.compose_with_file(term, &path),
                    NavigatorKind::Save => self.write_pending(&path),
                }
            }
        }
    }

    fn compose_with_file(&mut self, term: &mut dyn TerminalControl, path: &Path) {
        match fs::read_to_string(path) {
            Ok(seed) => self.edit_and_dispatch(term, &seed),
            Err(e) => self.set_status(format!("Failed to read {}: {}", path.display(), e)),
        }
    }

    fn write_pending(&mut self, path: &Path) {
        let text = self.pending_save.take().unwrap_or_default();
        match fs::write(path, text) {
            Ok(()) => {
                info!("Saved {}", path.display());
                self.set_status(format!("Saved to {}", path.display()));
            }
            Err(e) => self.set_status(format!("Failed to save {}: {}", path.display(), e)),
        }
    }

    /// Run the editor loop on `seed` and act on the chosen mode
    fn edit_and_dispatch(&mut self, term: &mut dyn TerminalControl, seed: &str) {
        let session = run_mode_loop(self.editor.as_mut(), term, seed, &mut |notice: &str| {
            info!("{}", notice)
        });

        let session = match session {
            Ok(session) => session,
            Err(e) => {
                warn!("Editor failed: {}", e);
                self.set_status(format!("Running editor: {}", e));
                return;
            }
        };
        match session.mode {
            ComposeMode::Send => match self.actions.send(&session.text) {
                Ok(()) => self.set_status("Successfully sent"),
                Err(e) => self.set_status(format!("Error sending: {:#}", e)),
            },
            ComposeMode::Draft => self.save_draft(session.text),
            ComposeMode::Abort => self.set_status("Sending aborted"),
        }
    }

    /// Draw the active view and the status line
    pub fn render(&mut self, frame: &mut Frame) {
        let [main, status] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(frame.area());
        self.pane_height = main.height;

        let underlying = match self.mode {
            ViewMode::FileOpen | ViewMode::FileSave => self.return_mode,
            mode => mode,
        };
        match underlying {
            ViewMode::OpenThread => self.thread_view.render(frame, main, &self.labels),
            _ => render_thread_list(frame, main, &self.list),
        }
        if let Some(navigator) = &self.navigator {
            navigator.render(frame, main);
        }

        frame.render_widget(StatusBar::new(&self.status), status);
        if self.show_help {
            frame.render_widget(ShortcutsHelp::new(), frame.area());
        }
    }
}

/// Directory file dialogs start in
fn start_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
