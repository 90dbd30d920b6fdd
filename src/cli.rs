//! Command-line entry point: argument parsing, bootstrap and the terminal loop.

use crate::config::{self, Config};
use crate::event::Event;
use crate::search::providers::GoogleSearchProvider;
use crate::tui::App;
use crate::view::SearchView;
use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture, Event as CrosstermEvent, EventStream};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Search the Stor&Liten LEGO catalogue from the terminal
#[derive(Debug, Parser)]
#[command(name = "sok", version, about)]
pub struct Args {
    /// Search to run right away
    pub query: Option<String>,

    /// Config file to use instead of ~/.config/sok/config.toml
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write debug logs to a file
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    /// Load the config file and layer environment and flags on top
    pub fn resolve_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => config::load_or_create_config_at(path)?,
            None => config::load_or_create_config()?,
        };
        config.apply_env();
        if self.debug {
            config.debug = true;
        }
        Ok(config)
    }
}

pub async fn run() -> Result<()> {
    // A missing .env file is fine
    dotenv::dotenv().ok();

    let args = Args::parse();
    let config = args.resolve_config()?;
    let _log_guard = crate::logging::init(&config)?;

    if !config.has_credentials() {
        eprintln!("Warning: SOK_API_KEY / SOK_CX not set, searches will fail until configured.");
    }

    let provider =
        GoogleSearchProvider::new(&config).context("Failed to build search HTTP client")?;
    let mut view = SearchView::new(Arc::new(provider));
    if let Some(query) = &args.query {
        view.set_query(query.clone());
    }

    let mut app = App::new(view);
    if args.query.is_some() {
        app.submit();
    }

    tracing::info!(site = %config.site_search, "starting search ui");
    run_terminal(app).await
}

async fn run_terminal(mut app: App) -> Result<()> {
    install_panic_hook();
    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, &mut app).await;
    restore_terminal(&mut terminal)?;
    result
}

async fn event_loop(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut events = EventStream::new();
    let mut tick = tokio::time::interval(Duration::from_millis(100));

    while !app.should_quit() {
        terminal
            .draw(|frame| app.render(frame))
            .context("Failed to draw terminal frame")?;

        tokio::select! {
            maybe_event = events.next() => match maybe_event {
                Some(Ok(event)) => {
                    if let Some(event) = translate(event) {
                        app.handle_event(event)?;
                    }
                }
                Some(Err(e)) => return Err(e).context("Failed to read terminal event"),
                None => app.handle_event(Event::Quit)?,
            },
            _ = tick.tick() => {}
        }

        while let Some(outcome) = app.poll_fetch() {
            app.handle_event(Event::Fetched(outcome))?;
        }
    }

    Ok(())
}

fn translate(event: CrosstermEvent) -> Option<Event> {
    match event {
        CrosstermEvent::Key(key) => Some(Event::Key(key)),
        CrosstermEvent::Mouse(mouse) => Some(Event::Mouse(mouse)),
        CrosstermEvent::Resize(w, h) => Some(Event::Resize(w, h)),
        _ => None,
    }
}

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to enter alternate screen")?;
    Terminal::new(CrosstermBackend::new(stdout)).context("Failed to create terminal")
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

/// Put the terminal back before printing a panic message
fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        previous(info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let args = Args::try_parse_from(["sok", "--debug", "lego city"]).unwrap();
        assert_eq!(args.query.as_deref(), Some("lego city"));
        assert!(args.debug);
        assert!(args.config.is_none());
    }

    #[test]
    fn test_debug_flag_overrides_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "debug = false\nsite_search = \"example.se/\"\n").unwrap();

        let args = Args::try_parse_from([
            "sok".to_string(),
            "--debug".to_string(),
            "--config".to_string(),
            path.display().to_string(),
        ])
        .unwrap();
        let config = args.resolve_config().unwrap();

        assert!(config.debug);
        assert_eq!(config.site_search, "example.se/");
    }
}
