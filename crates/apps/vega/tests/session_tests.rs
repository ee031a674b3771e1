//! Session tests for Vega
//!
//! Drive [`App`] with key presses against an in-memory mailbox, a scripted
//! editor and a terminal that only counts suspend/resume calls.

use anyhow::{Result, anyhow};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use mail::{Label, MailService, Message, MessageId, Thread, ThreadId, ThreadSummary, mime};
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use vega::editor::{EditorError, TextEditor};
use vega::input::Action;
use vega::terminal::{NullTerminal, TerminalControl};
use vega::{App, Settings, ViewMode};

#[derive(Debug, Clone, PartialEq)]
struct LabelChange {
    thread: String,
    add: Vec<String>,
    remove: Vec<String>,
}

#[derive(Default)]
struct FakeGmail {
    threads: Mutex<Vec<Thread>>,
    /// Threads whose label changes fail
    stuck: HashSet<String>,
    labels_down: bool,
    changes: Mutex<Vec<LabelChange>>,
    sent: Mutex<Vec<String>>,
}

fn message(thread: &str, index: usize, unread: bool) -> Message {
    let mut labels = vec!["INBOX".to_string()];
    if unread {
        labels.push("UNREAD".to_string());
    }
    Message::builder(
        MessageId::new(format!("{}-m{}", thread, index)),
        ThreadId::new(thread),
    )
    .header("From", format!("Sender {} <s{}@example.com>", thread, index))
    .header("Subject", format!("Subject {}", thread))
    .header("Date", "Sat, 15 Jun 2024 14:30:00 +0000")
    .header("Message-ID", format!("<{}-{}@example.com>", thread, index))
    .text_part("text/plain", &format!("Body {} of {}\n", index, thread))
    .label_ids(labels)
    .build()
}

impl FakeGmail {
    fn new(count: usize) -> Self {
        let threads = (0..count)
            .map(|i| {
                let id = format!("t{}", i);
                let messages = vec![message(&id, 0, false), message(&id, 1, i == 0)];
                Thread::new(ThreadId::new(id), messages)
            })
            .collect();
        Self {
            threads: Mutex::new(threads),
            ..Default::default()
        }
    }

    fn changes(&self) -> Vec<LabelChange> {
        self.changes.lock().unwrap().clone()
    }

    fn sent(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|raw| mime::decode_to_string(raw).unwrap())
            .collect()
    }
}

impl MailService for FakeGmail {
    fn list_threads(&self, query: &str, max_results: usize) -> Result<Vec<ThreadSummary>> {
        let label = query.strip_prefix("in:").map(|l| l.to_uppercase());
        Ok(self
            .threads
            .lock()
            .unwrap()
            .iter()
            .filter(|t| label.as_deref().is_none_or(|l| t.has_label(l)))
            .take(max_results)
            .map(|t| ThreadSummary {
                id: t.id.clone(),
                snippet: String::new(),
            })
            .collect())
    }

    fn get_thread(&self, id: &ThreadId) -> Result<Thread> {
        self.threads
            .lock()
            .unwrap()
            .iter()
            .find(|t| &t.id == id)
            .cloned()
            .ok_or_else(|| anyhow!("no thread {}", id.as_str()))
    }

    fn get_message(&self, id: &MessageId) -> Result<Message> {
        self.threads
            .lock()
            .unwrap()
            .iter()
            .flat_map(|t| t.messages.iter())
            .find(|m| &m.id == id)
            .cloned()
            .ok_or_else(|| anyhow!("no message {}", id.as_str()))
    }

    fn modify_labels(&self, id: &ThreadId, add: &[&str], remove: &[&str]) -> Result<()> {
        if self.stuck.contains(id.as_str()) {
            return Err(anyhow!("rate limited"));
        }
        self.changes.lock().unwrap().push(LabelChange {
            thread: id.as_str().to_string(),
            add: add.iter().map(|l| l.to_string()).collect(),
            remove: remove.iter().map(|l| l.to_string()).collect(),
        });
        let mut threads = self.threads.lock().unwrap();
        if let Some(thread) = threads.iter_mut().find(|t| &t.id == id) {
            for msg in &mut thread.messages {
                msg.label_ids.retain(|l| !remove.contains(&l.as_str()));
                msg.label_ids.extend(add.iter().map(|l| l.to_string()));
            }
        }
        Ok(())
    }

    fn send_raw(&self, raw: &str) -> Result<()> {
        self.sent.lock().unwrap().push(raw.to_string());
        Ok(())
    }

    fn list_labels(&self) -> Result<Vec<Label>> {
        if self.labels_down {
            return Err(anyhow!("service unavailable"));
        }
        Ok(vec![
            Label::system("INBOX", "Inbox"),
            Label::system("UNREAD", "Unread"),
        ])
    }
}

/// Hands back canned texts and records every seed
struct ScriptedEditor {
    responses: VecDeque<String>,
    seeds: Arc<Mutex<Vec<String>>>,
}

impl TextEditor for ScriptedEditor {
    fn edit(&mut self, term: &mut dyn TerminalControl, seed: &str) -> Result<String, EditorError> {
        term.suspend().map_err(EditorError::Terminal)?;
        self.seeds.lock().unwrap().push(seed.to_string());
        term.resume().map_err(EditorError::Terminal)?;
        Ok(self.responses.pop_front().unwrap_or_else(|| seed.to_string()))
    }
}

struct Session {
    app: App,
    service: Arc<FakeGmail>,
    seeds: Arc<Mutex<Vec<String>>>,
    term: NullTerminal,
}

impl Session {
    fn start(service: FakeGmail, responses: &[&str]) -> Self {
        Self::with_settings(service, responses, Settings::default())
    }

    fn with_settings(service: FakeGmail, responses: &[&str], settings: Settings) -> Self {
        let service = Arc::new(service);
        let seeds = Arc::new(Mutex::new(Vec::new()));
        let editor = ScriptedEditor {
            responses: responses.iter().map(|r| r.to_string()).collect(),
            seeds: seeds.clone(),
        };
        let mut app = App::new(settings, service.clone(), Box::new(editor)).unwrap();
        app.refresh();
        Self {
            app,
            service,
            seeds,
            term: NullTerminal::default(),
        }
    }

    fn press(&mut self, code: KeyCode) -> bool {
        self.app
            .handle_key(KeyEvent::new(code, KeyModifiers::NONE), &mut self.term)
    }

    fn ctrl(&mut self, c: char) -> bool {
        self.app.handle_key(
            KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL),
            &mut self.term,
        )
    }

    fn keys(&mut self, keys: &str) {
        for c in keys.chars() {
            self.press(KeyCode::Char(c));
        }
    }

    fn list_ids(&self) -> Vec<String> {
        self.app
            .list()
            .items()
            .iter()
            .map(|t| t.id.as_str().to_string())
            .collect()
    }

    fn screen(&mut self) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|frame| self.app.render(frame)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[test]
fn test_refresh_loads_threads_in_list_order() {
    let session = Session::start(FakeGmail::new(3), &[]);
    assert_eq!(session.list_ids(), vec!["t0", "t1", "t2"]);
    assert_eq!(session.app.status(), "Loaded 3 threads");
    assert_eq!(session.app.labels().len(), 2);
}

#[test]
fn test_startup_fails_without_labels() {
    let service = Arc::new(FakeGmail {
        labels_down: true,
        ..FakeGmail::new(1)
    });
    let editor = ScriptedEditor {
        responses: VecDeque::new(),
        seeds: Arc::default(),
    };
    let err = App::new(Settings::default(), service, Box::new(editor))
        .err()
        .unwrap();
    assert!(format!("{:#}", err).contains("Failed to list labels"));
}

#[test]
fn test_navigation_and_unknown_key() {
    let mut session = Session::start(FakeGmail::new(3), &[]);
    session.keys("nn");
    assert_eq!(session.app.list().current_index(), 2);
    session.keys("n");
    assert_eq!(session.app.list().current_index(), 2);
    session.press(KeyCode::Up);
    assert_eq!(session.app.list().current_index(), 1);

    session.keys("Z");
    assert_eq!(session.app.status(), "unknown key: Z");
}

#[test]
fn test_quit() {
    let mut session = Session::start(FakeGmail::new(1), &[]);
    assert!(!session.press(KeyCode::Char('n')));
    assert!(session.press(KeyCode::Char('q')));
    assert!(session.ctrl('c'));
}

#[test]
fn test_batch_archive_unmarks_and_refreshes() {
    let mut session = Session::start(FakeGmail::new(4), &[]);
    session.keys("xnx");
    assert_eq!(session.app.list().marked_ids(), vec!["t0", "t2"]);

    session.keys("a");
    assert_eq!(session.app.status(), "OK, archived 2 threads");
    assert!(session.app.list().marked_ids().is_empty());
    assert_eq!(session.list_ids(), vec!["t1", "t3"]);

    let mut archived: Vec<String> = session
        .service
        .changes()
        .into_iter()
        .filter(|c| c.remove == vec!["INBOX"])
        .map(|c| c.thread)
        .collect();
    archived.sort();
    assert_eq!(archived, vec!["t0", "t2"]);
}

#[test]
fn test_batch_partial_failure_keeps_failed_marks() {
    let mut service = FakeGmail::new(3);
    service.stuck.insert("t1".to_string());
    let mut session = Session::start(service, &[]);

    session.keys("xx");
    session.keys("d");
    assert_eq!(session.app.status(), "1 trashed OK, 1 failed: rate limited");
    assert_eq!(session.app.list().marked_ids(), vec!["t1"]);
    assert_eq!(session.list_ids(), vec!["t1", "t2"]);
}

#[test]
fn test_batch_without_marks() {
    let mut session = Session::start(FakeGmail::new(2), &[]);
    session.keys("e");
    assert_eq!(session.app.status(), "No threads marked");
    assert!(session.service.changes().is_empty());
}

#[test]
fn test_open_thread_clears_unread_in_background() {
    let mut session = Session::start(FakeGmail::new(2), &[]);
    session.press(KeyCode::Enter);
    assert_eq!(session.app.mode(), ViewMode::OpenThread);
    assert_eq!(session.app.thread_view().messages().len(), 2);

    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let cleared = session
            .service
            .changes()
            .iter()
            .any(|c| c.thread == "t0" && c.remove == vec!["UNREAD"]);
        if cleared {
            break;
        }
        assert!(Instant::now() < deadline, "UNREAD was never removed");
        std::thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn test_read_thread_is_not_touched() {
    let mut session = Session::start(FakeGmail::new(2), &[]);
    session.keys("n");
    session.press(KeyCode::Enter);
    std::thread::sleep(Duration::from_millis(50));
    assert!(session.service.changes().is_empty());
}

#[test]
fn test_thread_view_navigation() {
    let mut session = Session::start(FakeGmail::new(3), &[]);
    session.press(KeyCode::Enter);

    session.ctrl('n');
    assert_eq!(session.app.thread_view().thread().unwrap().id.as_str(), "t1");
    assert_eq!(session.app.list().current_index(), 1);

    session.ctrl('p');
    session.ctrl('p');
    assert_eq!(session.app.status(), "No more threads");
    assert_eq!(session.app.thread_view().thread().unwrap().id.as_str(), "t0");

    // Mark from inside the thread and move on
    session.keys("x");
    assert_eq!(session.app.list().marked_ids(), vec!["t0"]);
    assert_eq!(session.app.thread_view().thread().unwrap().id.as_str(), "t1");

    session.keys("<");
    assert_eq!(session.app.mode(), ViewMode::ThreadList);
    assert!(session.app.thread_view().thread().is_none());
}

#[test]
fn test_thread_scrolling_stays_in_bounds() {
    let mut session = Session::start(FakeGmail::new(1), &[]);
    session.screen();
    session.press(KeyCode::Enter);

    session.press(KeyCode::PageDown);
    let max = session.app.thread_view().max_scroll(20);
    assert!(session.app.thread_view().scroll() <= max);
    session.keys("pppp");
    assert_eq!(session.app.thread_view().scroll(), 0);
}

#[test]
fn test_compose_and_send() {
    let mut session = Session::start(
        FakeGmail::new(1),
        &["To: bob@example.com\nSubject: Lunch\nMode: Send\n\nNoon?\n"],
    );
    session.keys("c");

    assert_eq!(session.app.status(), "Successfully sent");
    let seeds = session.seeds.lock().unwrap().clone();
    assert_eq!(seeds, vec!["To: \nSubject: \nMode: Send\n\nBest regards"]);

    let sent = session.service.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("To: bob@example.com"));
    assert!(sent[0].contains("Noon?"));
    assert!(!sent[0].contains("Mode:"));
    assert_eq!((session.term.suspended, session.term.resumed), (1, 1));
}

#[test]
fn test_compose_reprompts_then_aborts() {
    let mut session = Session::start(
        FakeGmail::new(1),
        &["To: x\nSubject: y\n\nbody", "To: x\nSubject: y\nMode: Abort\n\nbody"],
    );
    session.keys("c");

    assert_eq!(session.app.status(), "Sending aborted");
    assert_eq!(session.seeds.lock().unwrap().len(), 2);
    assert!(session.service.sent().is_empty());
}

#[test]
fn test_send_without_recipient_reports_error() {
    let mut session = Session::start(FakeGmail::new(1), &[]);
    // Editor hands back the seed untouched: valid mode, empty To
    session.keys("c");
    assert!(session.app.status().starts_with("Error sending"));
    assert!(session.service.sent().is_empty());
}

#[test]
fn test_reply_seeds_quote_and_sends() {
    let mut session = Session::start(FakeGmail::new(1), &[]);
    session.press(KeyCode::Enter);
    session.keys("r");

    let seeds = session.seeds.lock().unwrap().clone();
    let seed = &seeds[0];
    assert!(seed.starts_with("To: Sender t0 <s1@example.com>\nSubject: Re: Subject t0\n"));
    assert!(seed.contains("In-Reply-To: <t0-1@example.com>"));
    assert!(seed.contains("> Body 1 of t0"));

    assert_eq!(session.app.status(), "Successfully sent");
    assert!(session.service.sent()[0].contains("Subject: Re: Subject t0"));
}

#[test]
fn test_draft_is_saved_through_dialog() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("lunch.txt");
    let mut session = Session::start(
        FakeGmail::new(1),
        &["To: bob@example.com\nMode: Draft\n\nNoon?\n"],
    );

    session.keys("c");
    assert_eq!(session.app.mode(), ViewMode::FileSave);
    assert_eq!(session.app.navigator().unwrap().filename(), "draft.txt");

    // Replace the suggested name with an absolute path
    session.press(KeyCode::Tab);
    for _ in 0.."draft.txt".len() {
        session.press(KeyCode::Backspace);
    }
    session.keys(&target.display().to_string());
    session.press(KeyCode::Enter);

    assert_eq!(session.app.mode(), ViewMode::ThreadList);
    assert_eq!(
        std::fs::read_to_string(&target).unwrap(),
        "To: bob@example.com\nMode: Draft\n\nNoon?\n"
    );
    assert!(session.app.status().starts_with("Saved to"));
    assert!(session.service.sent().is_empty());
}

#[test]
fn test_save_message_cancelled() {
    let mut session = Session::start(FakeGmail::new(1), &[]);
    session.press(KeyCode::Enter);
    session.keys("s");
    assert_eq!(session.app.mode(), ViewMode::FileSave);

    session.keys("q");
    assert_eq!(session.app.mode(), ViewMode::OpenThread);
    assert_eq!(session.app.status(), "Cancelled");
    assert!(session.app.navigator().is_none());
}

#[test]
fn test_compose_from_file_opens_navigator() {
    let mut session = Session::start(FakeGmail::new(1), &[]);
    session.keys("o");
    assert_eq!(session.app.mode(), ViewMode::FileOpen);
    assert_eq!(session.app.navigator().unwrap().cursor(), 0);

    session.press(KeyCode::Esc);
    assert_eq!(session.app.mode(), ViewMode::ThreadList);
}

#[test]
fn test_global_keys_work_in_dialogs() {
    let mut settings = Settings::default();
    settings.bindings = BTreeMap::from([(
        "global".to_string(),
        BTreeMap::from([("ctrl-q".to_string(), Action::Quit)]),
    )]);
    let mut session = Session::with_settings(FakeGmail::new(1), &[], settings);

    session.keys("o?");
    assert!(session.app.is_help_visible());
    assert_eq!(session.app.mode(), ViewMode::FileOpen);
    assert!(session.screen().contains("Keyboard Shortcuts"));

    session.press(KeyCode::Esc);
    assert!(!session.app.is_help_visible());
    assert_eq!(session.app.mode(), ViewMode::FileOpen);

    // Navigator bindings still shadow the global "q"
    assert!(!session.press(KeyCode::Char('q')));
    assert_eq!(session.app.mode(), ViewMode::ThreadList);

    session.keys("o");
    assert!(session.ctrl('q'));
}

#[test]
fn test_question_mark_is_text_while_editing_filename() {
    let mut session = Session::start(FakeGmail::new(1), &[]);
    session.press(KeyCode::Enter);
    session.keys("s");
    session.press(KeyCode::Tab);
    session.keys("?");

    assert!(!session.app.is_help_visible());
    assert_eq!(session.app.navigator().unwrap().filename(), "message.txt?");
}

#[test]
fn test_binding_overrides_from_settings() {
    let mut settings = Settings::default();
    settings.bindings = BTreeMap::from([(
        "thread_list".to_string(),
        BTreeMap::from([("z".to_string(), Action::Trash)]),
    )]);
    let mut session = Session::with_settings(FakeGmail::new(2), &[], settings);

    session.keys("xz");
    assert_eq!(session.app.status(), "OK, trashed 1 threads");
    assert_eq!(session.list_ids(), vec!["t1"]);
}

#[test]
fn test_render_list_and_help() {
    let mut session = Session::start(FakeGmail::new(2), &[]);
    let screen = session.screen();
    assert!(screen.contains("Subject t0"));
    assert!(screen.contains("Loaded 2 threads"));

    session.keys("?");
    assert!(session.app.is_help_visible());
    assert!(session.screen().contains("Keyboard Shortcuts"));

    // Other keys are swallowed while help is up
    session.keys("n");
    assert_eq!(session.app.list().current_index(), 0);
    session.press(KeyCode::Esc);
    assert!(!session.app.is_help_visible());
}

#[test]
fn test_render_thread_and_dialog() {
    let mut session = Session::start(FakeGmail::new(1), &[]);
    session.press(KeyCode::Enter);
    let screen = session.screen();
    assert!(screen.contains("Thread 1 of 1: Subject t0 (2 messages)"));
    assert!(screen.contains("Labels: Inbox"));
    assert!(screen.contains("Body 1 of t0"));

    session.keys("s");
    let screen = session.screen();
    assert!(screen.contains("Save file"));
    assert!(screen.contains("Filename> message.txt"));
    assert!(screen.contains(" > <save>"));
}
