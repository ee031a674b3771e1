//! Vega - a terminal Gmail client
//!
//! This is the main entry point for the Vega mail application.

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyEventKind};
use env_logger::{Builder, Env, Target};
use log::{LevelFilter, info};
use mail::{GmailAuth, GmailClient, GmailCredentials, MailService, Scope};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use vega::App;
use vega::editor::ExternalEditor;
use vega::settings::Settings;
use vega::terminal::{self, Tui};

/// Log file in the config directory
const LOG_FILE: &str = "vega.log";

/// How long to wait for input before redrawing
const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Parser)]
#[command(name = "vega", version, about = "Terminal Gmail client")]
struct Cli {
    /// Settings file to use instead of vega.json in the config directory
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Authorize with Google in the browser, save tokens and exit
    #[arg(long)]
    configure: bool,

    /// Request read-only access
    #[arg(long)]
    readonly: bool,

    /// Editor command; overrides $EDITOR and the settings file
    #[arg(long)]
    editor: Option<String>,

    /// Search query for the thread list
    #[arg(long)]
    query: Option<String>,

    /// Number of threads to list
    #[arg(long)]
    max_results: Option<usize>,

    /// Log filter, e.g. "debug" or "mail=trace"; overrides RUST_LOG
    #[arg(long)]
    log_level: Option<String>,
}

fn main() {
    if let Err(e) = run(Cli::parse()) {
        eprintln!("vega: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_dir = config::init().context("Failed to initialize config directory")?;
    init_logging(&config_dir, cli.log_level.as_deref());

    let mut settings = Settings::load(cli.config.as_deref())?;
    settings.resolve_editor(cli.editor, std::env::var("EDITOR").ok());
    if let Some(query) = cli.query {
        settings.query = query;
    }
    if let Some(max_results) = cli.max_results {
        settings.max_results = max_results;
    }

    let creds = GmailCredentials::load()?;
    let scope = if cli.readonly {
        Scope::Readonly
    } else {
        Scope::Modify
    };
    let auth = GmailAuth::new(creds.client_id, creds.client_secret, scope)?;

    if cli.configure {
        auth.configure()?;
        println!("Authorization saved. Run vega without --configure to start.");
        return Ok(());
    }

    let service: Arc<dyn MailService> = Arc::new(GmailClient::new(auth));
    let editor = Box::new(ExternalEditor::new(settings.editor.clone()));
    let mut app = App::new(settings, service, editor)?;

    let (mut terminal, _guard) = terminal::init().context("Failed to set up terminal")?;
    info!("Vega started");
    app.refresh();
    event_loop(&mut terminal, &mut app)
}

fn event_loop(terminal: &mut Tui, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| app.render(frame))?;

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if app.handle_key(key, terminal) {
                info!("Vega exiting");
                return Ok(());
            }
        }
    }
}

/// Log to a file in the config directory so the screen stays clean
fn init_logging(config_dir: &Path, level: Option<&str>) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder.format_timestamp_millis();
    if let Some(level) = level {
        builder.parse_filters(level);
    }

    let path = config_dir.join(LOG_FILE);
    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => {
            builder.target(Target::Pipe(Box::new(file)));
        }
        Err(e) => {
            eprintln!("vega: logging disabled, cannot open {}: {}", path.display(), e);
            builder.filter_level(LevelFilter::Off);
        }
    }
    builder.init();
}
