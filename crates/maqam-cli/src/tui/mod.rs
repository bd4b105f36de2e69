//! Maqam TUI
//!
//! Terminal user interface for Maqam - a reader for the configured
//! document with page bookmarks.
//!
//! ## Screens
//!
//! Two top-level screens:
//! - Reader: extracted text of the current page, page position and a
//!   bookmark indicator
//! - Bookmarks: saved maqam entries, newest first
//!
//! ## Navigation
//!
//! - ←/→ or h/l: Turn pages (reader)
//! - j/k or ↑/↓: Move selection (bookmarks)
//! - m: Save a maqam for the current page
//! - Space: Show/hide a list item's actions
//! - Enter: Open the selected bookmark's page
//! - d: Delete (when an item's actions are shown)
//! - b / r / Tab: Switch between screens
//! - q: Quit

mod app;
mod ui;

use std::fs::File;
use std::io::stdout;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use maqam_core::{Config, MountToken, ReadingDocument, Store, StoreEvent};

use app::{ActiveScreen, App, InputMode};

/// Outcome of an asynchronous document resolution
enum LoadResult {
    Ready {
        token: MountToken,
        document: ReadingDocument,
    },
    Failed {
        token: MountToken,
        message: String,
    },
}

/// Run the TUI application
pub async fn run(initial_page: Option<u32>) -> Result<()> {
    let config = Config::load()?;
    let mut store = Store::open(&config)?;

    // Initialize TUI logging (file-based, only if MAQAM_LOG is set)
    init_tui_logging(&config);

    // Committed store mutations wake the UI through this channel; the
    // list never polls
    let (store_tx, store_rx) = std::sync::mpsc::channel::<StoreEvent>();
    let _store_sub = store.subscribe(move |event| {
        let _ = store_tx.send(event.clone());
    });

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Create app and mount the reader at the requested page
    let mut app = App::new(&store)?;
    let (load_tx, load_rx) = tokio::sync::mpsc::channel::<LoadResult>(4);
    mount_reader(&mut app, &config, &load_tx, initial_page);

    // Run app
    let result = run_app(
        &mut terminal,
        &mut app,
        &mut store,
        &config,
        &store_rx,
        load_rx,
        load_tx,
    )
    .await;

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

/// Mount the reader screen and start resolving the document
fn mount_reader(
    app: &mut App,
    config: &Config,
    load_tx: &tokio::sync::mpsc::Sender<LoadResult>,
    goto_page: Option<u32>,
) {
    let token = app.switch_to_reader(goto_page);
    spawn_document_load(config, token, load_tx.clone());
}

/// Resolve the document off the UI loop
///
/// The result carries its mount token; arriving after the screen was
/// left or re-entered it is discarded by the viewer.
fn spawn_document_load(
    config: &Config,
    token: MountToken,
    tx: tokio::sync::mpsc::Sender<LoadResult>,
) {
    let document_path = config.document.clone();
    tokio::task::spawn_blocking(move || {
        let result = match document_path {
            Some(path) => match ReadingDocument::open(&path) {
                Ok(document) => LoadResult::Ready { token, document },
                Err(e) => LoadResult::Failed {
                    token,
                    message: e.to_string(),
                },
            },
            None => LoadResult::Failed {
                token,
                message: "No document configured. Run: maqam config set document <path>"
                    .to_string(),
            },
        };
        let _ = tx.blocking_send(result);
    });
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    store: &mut Store,
    config: &Config,
    store_rx: &std::sync::mpsc::Receiver<StoreEvent>,
    mut load_rx: tokio::sync::mpsc::Receiver<LoadResult>,
    load_tx: tokio::sync::mpsc::Sender<LoadResult>,
) -> Result<()> {
    loop {
        // Check for status message timeout
        app.check_status_timeout();

        // Draw UI
        terminal.draw(|frame| ui::draw(frame, app))?;

        tokio::select! {
            biased;

            // Document resolution completed
            load_result = load_rx.recv() => {
                if let Some(result) = load_result {
                    match result {
                        LoadResult::Ready { token, document } => {
                            let page_count = document.page_count();
                            if app.viewer.resolve_ready(token, page_count) {
                                app.document = Some(document);
                                app.refresh_page_indicator(store);
                            }
                        }
                        LoadResult::Failed { token, message } => {
                            app.viewer.resolve_error(token, message);
                        }
                    }
                }
            }

            // Poll for terminal events
            _ = tokio::time::sleep(std::time::Duration::from_millis(50)) => {
                // Apply pushed store updates
                let mut store_dirty = false;
                while store_rx.try_recv().is_ok() {
                    store_dirty = true;
                }
                if store_dirty {
                    if let Err(e) = app.refresh(store) {
                        app.set_status(format!("Refresh failed: {}", e));
                    }
                }

                // Check for terminal events (non-blocking)
                if event::poll(std::time::Duration::from_millis(0))? {
                    if let Event::Key(key) = event::read()? {
                        // Only handle key press events (not release)
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }

                        // If help is showing, any key dismisses it
                        if app.show_help {
                            app.show_help = false;
                            continue;
                        }

                        match app.input_mode {
                            InputMode::Normal => {
                                handle_normal_mode(app, store, config, &load_tx, key.code, key.modifiers);
                            }
                            InputMode::Editor => {
                                handle_editor_mode(app, store, key.code, key.modifiers);
                            }
                            InputMode::ConfirmDelete => {
                                handle_confirm_mode(app, store, key.code);
                            }
                        }
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Handle key events in normal mode
fn handle_normal_mode(
    app: &mut App,
    store: &mut Store,
    config: &Config,
    load_tx: &tokio::sync::mpsc::Sender<LoadResult>,
    code: KeyCode,
    modifiers: KeyModifiers,
) {
    match code {
        // Quit
        KeyCode::Char('q') => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
            return;
        }

        // Help
        KeyCode::Char('?') => {
            app.toggle_help();
            return;
        }

        _ => {}
    }

    match app.active_screen {
        ActiveScreen::Reader => match code {
            KeyCode::Char('h') | KeyCode::Left => {
                app.prev_page(store);
            }
            KeyCode::Char('l') | KeyCode::Right => {
                app.next_page(store);
            }
            KeyCode::Char('m') => {
                app.open_editor();
            }
            KeyCode::Char('b') | KeyCode::Tab => {
                if let Err(e) = app.switch_to_bookmarks(store) {
                    app.set_status(format!("Failed to load bookmarks: {}", e));
                }
            }
            _ => {}
        },
        ActiveScreen::Bookmarks => match code {
            KeyCode::Char('k') | KeyCode::Up => {
                app.move_up();
            }
            KeyCode::Char('j') | KeyCode::Down => {
                app.move_down();
            }
            KeyCode::Char(' ') => {
                app.toggle_disclosure();
            }
            KeyCode::Enter => {
                // Navigation only fires when nothing is disclosed; a
                // disclosed item collapses instead
                if let Some(page) = app.activate_selected() {
                    mount_reader(app, config, load_tx, Some(page));
                }
            }
            KeyCode::Char('d') => {
                app.request_delete();
            }
            KeyCode::Char('e') => {
                app.request_edit();
            }
            KeyCode::Char('r') | KeyCode::Tab => {
                mount_reader(app, config, load_tx, None);
            }
            _ => {}
        },
    }
}

/// Handle key events while the bookmark editor is open
fn handle_editor_mode(app: &mut App, store: &mut Store, code: KeyCode, modifiers: KeyModifiers) {
    match code {
        KeyCode::Esc => {
            app.cancel_editor();
        }
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.cancel_editor();
        }
        KeyCode::Enter => {
            app.save_editor(store);
        }
        KeyCode::Char(c) => {
            app.editor_insert_char(c);
        }
        KeyCode::Backspace => {
            app.editor_delete_char();
        }
        _ => {}
    }
}

/// Handle key events while the delete confirmation is showing
fn handle_confirm_mode(app: &mut App, store: &mut Store, code: KeyCode) {
    match code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
            app.confirm_delete(store, true);
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.confirm_delete(store, false);
        }
        _ => {}
    }
}

/// Initialize logging for TUI mode
///
/// Only initializes if MAQAM_LOG environment variable is set.
/// Logs to file (config.log_file or default {data_dir}/debug.log).
fn init_tui_logging(config: &Config) {
    // Only log if MAQAM_LOG is set
    let Ok(log_level) = std::env::var("MAQAM_LOG") else {
        return;
    };

    // Determine log file path
    let log_path = config
        .log_file
        .clone()
        .unwrap_or_else(|| config.data_dir.join("debug.log"));

    // Create log file
    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
            return;
        }
    };

    let env_filter = EnvFilter::new(format!(
        "maqam_core={},maqam_cli={}",
        log_level, log_level
    ));

    // Initialize file-based logging (ignore error if already initialized)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(log_file)
        .try_init();

    info!("TUI logging initialized to {:?}", log_path);
}
