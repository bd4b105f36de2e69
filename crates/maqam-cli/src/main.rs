//! Maqam CLI
//!
//! Command-line interface for Maqam - page bookmarks for a fixed-page
//! reading document.

use anyhow::Result;
use clap::{Parser, Subcommand};

use maqam_core::{Config, Store};

mod commands;
mod output;
mod tui;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "maqam")]
#[command(about = "Maqam - page bookmarks for your reading document")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the TUI reader
    Tui {
        /// Page to open the reader at
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Manage bookmarks
    Bookmark {
        #[command(subcommand)]
        command: BookmarkCommands,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Show status (document, storage, counts)
    Status,
}

#[derive(Subcommand)]
enum BookmarkCommands {
    /// Create a new bookmark
    #[command(alias = "add")]
    Create {
        /// Page number (1-based)
        page: u32,
        /// Free-text details
        #[arg(short, long, default_value = "")]
        details: String,
    },
    /// List all bookmarks, newest first
    #[command(alias = "ls")]
    List {
        /// Only show bookmarks for this page
        #[arg(short, long)]
        page: Option<u32>,
    },
    /// Show bookmark details
    Show {
        /// Bookmark ID (full UUID or prefix)
        id: String,
    },
    /// Delete a bookmark
    #[command(alias = "rm")]
    Delete {
        /// Bookmark ID (full UUID or prefix)
        id: String,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, document, page_count, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Config commands don't need the store
    if let Some(Commands::Config { command }) = &cli.command {
        return handle_config_command(command.clone(), &output);
    }

    // Handle TUI (default when no command given)
    match &cli.command {
        Some(Commands::Tui { page }) => return tui::run(Some(*page)).await,
        None => return tui::run(None).await,
        _ => {}
    }

    init_cli_logging();

    // Open store for commands that need it
    let config = Config::load()?;
    let mut store = Store::open(&config)?;

    match cli.command.unwrap() {
        Commands::Tui { .. } => unreachable!(),    // Handled above
        Commands::Config { .. } => unreachable!(), // Handled above
        Commands::Bookmark { command } => {
            handle_bookmark_command(command, &mut store, &config, &output)
        }
        Commands::Status => commands::status::show(&store, &config, &output),
    }
}

fn handle_bookmark_command(
    command: BookmarkCommands,
    store: &mut Store,
    config: &Config,
    output: &Output,
) -> Result<()> {
    match command {
        BookmarkCommands::Create { page, details } => {
            commands::bookmark::create(store, config, page, details, output)
        }
        BookmarkCommands::List { page } => commands::bookmark::list(store, page, output),
        BookmarkCommands::Show { id } => commands::bookmark::show(store, id, output),
        BookmarkCommands::Delete { id } => commands::bookmark::delete(store, id, output),
    }
}

fn handle_config_command(command: Option<ConfigCommands>, output: &Output) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(output),
        Some(ConfigCommands::Set { key, value }) => commands::config::set(key, value, output),
    }
}

/// Log to stderr for CLI commands, controlled by RUST_LOG
fn init_cli_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
