//! flashdeck - flashcard decks in the terminal
//!
//! Cards answered "easy" come back after 1, 3, 7, 14 and then 30 days.
//! Cards answered "hard" come back the next day.

mod analytics;
mod config;
mod error;
mod import;
mod models;
mod schedule;
mod session;
mod storage;
mod store;
mod ui;

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use unicode_width::UnicodeWidthStr;

use config::Config;
use storage::DeckStorage;
use store::DeckStore;
use ui::App;

// ══════════════════════════════════════════════════════════════════════════
// CLI Arguments
// ══════════════════════════════════════════════════════════════════════════

#[derive(Parser, Debug)]
#[command(name = "flashdeck")]
#[command(author, version, about = "Flashcard decks with spaced review in the terminal", long_about = None)]
struct Args {
    /// Deck file to use instead of the configured one
    #[arg(short, long)]
    store: Option<PathBuf>,

    /// Import decks from a .json, .csv or .txt file
    #[arg(short, long)]
    import: Option<PathBuf>,

    /// Name for the imported deck (only when the file holds one deck)
    #[arg(long, requires = "import")]
    import_name: Option<String>,

    /// Write every deck to a JSON backup file
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Print the decks and exit
    #[arg(short, long)]
    list: bool,
}

impl Args {
    fn is_batch(&self) -> bool {
        self.import.is_some() || self.export.is_some() || self.list
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Main Entry Point
// ══════════════════════════════════════════════════════════════════════════

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load().unwrap_or_default();

    init_logging(&config, args.is_batch())?;

    let store_path = args
        .store
        .clone()
        .or_else(|| config.store_path.clone())
        .unwrap_or_else(DeckStorage::default_path);
    let storage = DeckStorage::new(store_path)?;
    let mut store = DeckStore::open(storage).context("Failed to load decks")?;

    if args.is_batch() {
        return run_batch(&args, &mut store);
    }

    run_tui(store, config)
}

/// Log to stderr for one-shot commands, and to a file while the TUI owns the terminal.
fn init_logging(config: &Config, batch: bool) -> Result<()> {
    let env = env_logger::Env::default().default_filter_or(config.log_level.as_str());
    let mut builder = env_logger::Builder::from_env(env);

    if !batch {
        let log_path = DeckStorage::default_log_path();
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("Failed to open log file: {:?}", log_path))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.init();
    Ok(())
}

fn run_batch(args: &Args, store: &mut DeckStore) -> Result<()> {
    if let Some(ref path) = args.import {
        let decks = store.import_file(path, args.import_name.as_deref())?;
        for deck in &decks {
            println!("✓ Imported {} cards into '{}'", deck.cards.len(), deck.name);
        }
    }

    if let Some(ref path) = args.export {
        let count = store.export_to(path)?;
        println!("✓ Exported {} decks to {}", count, path.display());
    }

    if args.list {
        print_decks(store);
    }

    Ok(())
}

fn print_decks(store: &DeckStore) {
    if store.decks().is_empty() {
        println!("No decks yet.");
        return;
    }

    let name_width = store
        .decks()
        .iter()
        .map(|d| d.name.width())
        .max()
        .unwrap_or(0);

    for deck in store.decks() {
        let due = store.cards_needing_review(&deck.id).len();
        let padding = " ".repeat(name_width - deck.name.width());
        println!(
            "{}{}  {:>4} cards  {:>4} learned  {:>4} due",
            deck.name,
            padding,
            deck.cards.len(),
            deck.learned_count(),
            due
        );
    }
}

fn run_tui(store: DeckStore, config: Config) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app
    let mut app = App::new(store, config);

    // Run main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    // Handle any errors
    if let Err(err) = result {
        log::error!("{:#}", err);
        eprintln!("Error: {}", err);
        return Err(err);
    }

    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    while app.running {
        terminal.draw(|frame| app.render(frame))?;
        app.handle_events()?;
    }
    Ok(())
}
