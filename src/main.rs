//! dishfeed, browse a paginated dish catalog from the terminal.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌──────────┐ fetch_page ┌──────────┐ PageCompletion ┌──────────┐  draw()  ┌──────────┐
//! │ source/  │ ◄───────── │ feed.rs  │ ◄───────────── │  app.rs  │ ───────► │  ui.rs   │
//! │ (HTTP)   │   (task)   │ (pager)  │  (mpsc) watch► │ (screens)│          │ (render) │
//! └──────────┘            └──────────┘                └──────────┘          └──────────┘
//!                                                          ▲
//!                                                          │ handle_key_event()
//!                                                     ┌──────────┐
//!                                                     │ input.rs │
//!                                                     └──────────┘
//! ```
//!
//! * **`source/`**: source traits, catalog records and the HTTP [`ApiClient`].
//! * **`feed`**: the pagination state machine behind the dish list.
//! * **`auth`**: on-disk session token storage.
//! * **`app`**: owns screen state (login, feed, detail) and background tasks.
//! * **`ui`**: pure rendering: reads `App` state and draws widgets.
//! * **`input`**: maps key events to `App` mutations.
//! * **`config`**: command-line flags.
//! * **`main`**: wires everything together: parse args, set up logging, the
//!   async runtime and the terminal, and run the event loop.

mod app;
mod auth;
mod config;
mod feed;
mod input;
mod source;
mod ui;

use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::EnvFilter;

use app::{App, Services};
use auth::TokenStore;
use config::{Cli, Settings};
use source::ApiClient;

// ---------------------------------------------------------------------------
// RAII terminal guard
// ---------------------------------------------------------------------------

/// Manages terminal raw-mode and alternate-screen lifetime via [`Drop`].
///
/// Constructing this struct enters raw mode + alternate screen.  When the
/// value is dropped (normally or during stack unwinding) it restores the
/// terminal.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Restore the terminal before the panic message is printed.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

/// Send `tracing` output to `path`, filtered by `RUST_LOG` (default `warn`).
///
/// The TUI owns stdout, so without a log file nothing is recorded.
fn init_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let settings = Settings::from_cli(Cli::parse())?;
    init_logging(settings.log_file.as_deref())?;
    tracing::info!(base_url = %settings.base_url, page_size = settings.page_size, "starting");

    // Fetches run here; the UI loop below stays synchronous.
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;

    let tokens = TokenStore::new(&settings.token_file);
    let api = Arc::new(ApiClient::new(
        settings.base_url.clone(),
        settings.timeout,
        tokens.clone(),
    )?);

    install_panic_hook();
    let mut guard = TerminalGuard::new()?;
    let mut app = App::new(
        Services::from_shared(api),
        tokens,
        runtime.handle().clone(),
        settings.page_size,
    );

    // -- main event loop -----------------------------------------------------
    // Runs at ~10 fps (100 ms tick).  Each iteration:
    //   1. Apply finished background work (pages, login, detail).
    //   2. Render the UI.
    //   3. Poll for keyboard input (non-blocking, up to tick_rate).
    let tick_rate = Duration::from_millis(100);

    loop {
        app.tick();

        guard.terminal.draw(|f| ui::draw(&mut app, f))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                input::handle_key_event(&mut app, key);
            }
        }

        if app.quit {
            break;
        }
    }

    // In-flight requests are abandoned, not awaited.
    drop(app);
    runtime.shutdown_background();
    Ok(())
}
