//! Terminal setup and the suspend/resume seam used while an editor runs

use crossterm::ExecutableCommand;
use crossterm::cursor::Show;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{self, Stdout};

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Hand the terminal to another program and take it back
pub trait TerminalControl {
    fn suspend(&mut self) -> io::Result<()>;
    fn resume(&mut self) -> io::Result<()>;
}

impl TerminalControl for Tui {
    fn suspend(&mut self) -> io::Result<()> {
        disable_raw_mode()?;
        self.backend_mut().execute(LeaveAlternateScreen)?;
        self.show_cursor()
    }

    fn resume(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        self.backend_mut().execute(EnterAlternateScreen)?;
        // Force a full redraw of whatever the editor left behind
        self.clear()
    }
}

/// Terminal control for tests and headless runs; counts calls
#[derive(Debug, Default)]
pub struct NullTerminal {
    pub suspended: usize,
    pub resumed: usize,
}

impl TerminalControl for NullTerminal {
    fn suspend(&mut self) -> io::Result<()> {
        self.suspended += 1;
        Ok(())
    }

    fn resume(&mut self) -> io::Result<()> {
        self.resumed += 1;
        Ok(())
    }
}

/// Restores the terminal when dropped, including on panic unwind
pub struct TerminalRestoreGuard;

impl Drop for TerminalRestoreGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = stdout.execute(LeaveAlternateScreen);
        let _ = stdout.execute(Show);
    }
}

/// Enter raw mode on the alternate screen. Keep the guard alive for as long
/// as the terminal is in use.
pub fn init() -> io::Result<(Tui, TerminalRestoreGuard)> {
    let guard = TerminalRestoreGuard;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    enable_raw_mode()?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    Ok((terminal, guard))
}
