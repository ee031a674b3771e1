//! External editor bridge
//!
//! Text goes out to `$EDITOR` through a temp file and comes back with a
//! `Mode:` header saying what to do with it. Text without a valid mode is
//! sent back to the editor until the user fixes it or gives up.

use std::fs;
use std::io::{self, Write};
use std::process::{Command, ExitStatus};
use thiserror::Error;

use crate::terminal::TerminalControl;

pub use mail::compose::{MODE_HEADER, strip_mode_header};

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("failed to create temporary file: {0}")]
    TempFile(#[source] io::Error),
    #[error("editor command {0:?} is empty or malformed")]
    Command(String),
    #[error("failed to run editor {command:?}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("editor exited with {0}")]
    ExitStatus(ExitStatus),
    #[error("failed to read back edited file: {0}")]
    ReadBack(#[source] io::Error),
    #[error("failed to hand over the terminal: {0}")]
    Terminal(#[source] io::Error),
}

/// Something that lets the user edit a buffer
pub trait TextEditor {
    fn edit(&mut self, term: &mut dyn TerminalControl, seed: &str) -> Result<String, EditorError>;
}

/// Runs an editor command on a temp file
#[derive(Debug, Clone)]
pub struct ExternalEditor {
    command: String,
}

impl ExternalEditor {
    /// `command` is split shell-style; the file path is appended
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

/// Resumes the terminal when dropped
struct Suspended<'a> {
    term: &'a mut dyn TerminalControl,
}

impl<'a> Suspended<'a> {
    fn new(term: &'a mut dyn TerminalControl) -> Result<Self, EditorError> {
        term.suspend().map_err(EditorError::Terminal)?;
        Ok(Self { term })
    }
}

impl Drop for Suspended<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.term.resume() {
            log::error!("Failed to resume terminal: {}", e);
        }
    }
}

impl TextEditor for ExternalEditor {
    fn edit(&mut self, term: &mut dyn TerminalControl, seed: &str) -> Result<String, EditorError> {
        let words = shell_words::split(&self.command)
            .map_err(|_| EditorError::Command(self.command.clone()))?;
        let (program, args) = words
            .split_first()
            .ok_or_else(|| EditorError::Command(self.command.clone()))?;

        // Removed on drop
        let mut file = tempfile::Builder::new()
            .prefix("vega-")
            .suffix(".txt")
            .tempfile()
            .map_err(EditorError::TempFile)?;
        file.write_all(seed.as_bytes())
            .and_then(|_| file.flush())
            .map_err(EditorError::TempFile)?;

        log::debug!("Running editor {:?} on {}", self.command, file.path().display());
        let status = {
            let _suspended = Suspended::new(term)?;
            Command::new(program)
                .args(args)
                .arg(file.path())
                .status()
                .map_err(|source| EditorError::Spawn {
                    command: self.command.clone(),
                    source,
                })?
        };
        if !status.success() {
            return Err(EditorError::ExitStatus(status));
        }

        fs::read_to_string(file.path()).map_err(EditorError::ReadBack)
    }
}

/// What the user asked for in the `Mode:` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeMode {
    Send,
    Draft,
    Abort,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidMode {
    #[error("no blank line after the headers")]
    NoBody,
    #[error("no \"Mode:\" header")]
    Missing,
    #[error("unknown mode {0:?}, use send, draft or abort")]
    Unknown(String),
}

/// Read the `Mode:` header from edited text.
///
/// The headers end at the first blank line. The mode word is
/// case-insensitive.
pub fn parse_mode(text: &str) -> Result<ComposeMode, InvalidMode> {
    let (headers, _body) = text.split_once("\n\n").ok_or(InvalidMode::NoBody)?;
    let word = headers
        .lines()
        .filter_map(|line| line.strip_prefix(MODE_HEADER))
        .map(str::trim)
        .find(|word| !word.is_empty())
        .ok_or(InvalidMode::Missing)?;

    match word.to_ascii_lowercase().as_str() {
        "send" => Ok(ComposeMode::Send),
        "draft" => Ok(ComposeMode::Draft),
        "abort" => Ok(ComposeMode::Abort),
        _ => Err(InvalidMode::Unknown(word.to_string())),
    }
}

/// Result of an editing round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorSession {
    pub mode: ComposeMode,
    /// The text as the editor last returned it
    pub text: String,
}

/// Edit until the text carries a valid mode.
///
/// Invalid text is reopened as-is, with a notice through `notify`. If the
/// user hands back the same invalid text on a retry, the session ends as
/// [`ComposeMode::Abort`].
pub fn run_mode_loop(
    editor: &mut dyn TextEditor,
    term: &mut dyn TerminalControl,
    seed: &str,
    notify: &mut dyn FnMut(&str),
) -> Result<EditorSession, EditorError> {
    let mut input = seed.to_string();
    let mut retrying = false;

    loop {
        let output = editor.edit(term, &input)?;
        match parse_mode(&output) {
            Ok(mode) => return Ok(EditorSession { mode, text: output }),
            Err(invalid) => {
                if retrying && output == input {
                    log::info!("Editor returned unchanged invalid text, aborting");
                    return Ok(EditorSession {
                        mode: ComposeMode::Abort,
                        text: output,
                    });
                }
                log::debug!("Editor output rejected: {}", invalid);
                notify(&format!("Invalid message: {}", invalid));
                input = output;
                retrying = true;
            }
        }
    }
}
