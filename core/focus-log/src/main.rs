//! focus-log: viewer for recorded focus sessions.
//!
//! Reads `focus_log.json` fresh on every invocation, so it is safe to run
//! while the recorder is writing.
//!
//! ## Subcommands
//!
//! - `list`: one line per session, newest first
//! - `show`: timeline of all sessions, or one by `--index` / `--start`
//! - `delete`: remove a session by its start timestamp
//! - `filters`: manage programs hidden from `show`
//! - `path`: print the session log location

mod render;

use clap::{Parser, Subcommand};
use focus_core::{FilterManager, Session, SessionStore, StorageConfig, Timeline};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "focus-log")]
#[command(about = "Browse and manage recorded focus sessions")]
#[command(version)]
struct Cli {
    /// Data directory (defaults to FOCUS_LOG_DIR or the per-user data dir)
    #[arg(long, value_name = "DIR", global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List sessions, newest first
    List,

    /// Show the session timeline
    Show {
        /// 1-based session number as printed by `list`
        #[arg(long, conflicts_with = "start")]
        index: Option<usize>,

        /// Session start timestamp (Unix seconds)
        #[arg(long)]
        start: Option<i64>,
    },

    /// Delete a session by its start timestamp
    Delete {
        #[arg(long)]
        start: i64,
    },

    /// Manage program filters
    Filters {
        #[command(subcommand)]
        action: FilterAction,
    },

    /// Print the session log path
    Path,
}

#[derive(Subcommand)]
enum FilterAction {
    /// List filters with their numbers
    List,

    /// Hide a program from the timeline
    Add {
        program_name: String,

        /// Store the filter without enabling it
        #[arg(long)]
        disabled: bool,
    },

    /// Remove a filter by number
    Remove { number: usize },

    /// Enable or disable a filter by number
    Toggle { number: usize },
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        tracing::error!(error = %err, "focus-log failed");
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), String> {
    let storage = match cli.data_dir {
        Some(dir) => StorageConfig::with_root(dir),
        None => StorageConfig::resolve()?,
    };
    let store = SessionStore::new(storage.log_file());

    match cli.command {
        Commands::List => print!("{}", render::session_list(&store.load())),
        Commands::Show { index, start } => {
            let filters = FilterManager::load(storage.settings_file());
            let sessions = store.load();
            let selected = match (index, start) {
                (Some(number), _) => number
                    .checked_sub(1)
                    .and_then(|i| sessions.get(i))
                    .map(|session| vec![session.clone()])
                    .ok_or_else(|| format!("No session number {}", number))?,
                (None, Some(start)) => sessions
                    .iter()
                    .find(|session| session.start_timestamp == start)
                    .map(|session| vec![session.clone()])
                    .ok_or_else(|| format!("No session starting at {}", start))?,
                (None, None) => sessions.clone(),
            };
            let mut timeline = Timeline::build(&selected, |name| filters.is_filtered(name));
            if selected.len() == 1 {
                renumber(&mut timeline, &sessions, selected[0].start_timestamp);
            }
            print!("{}", render::timeline(&timeline));
        }
        Commands::Delete { start } => {
            if store.delete_by_start(start)? {
                println!("Deleted session {}", start);
            } else {
                return Err(format!("No session starting at {}", start));
            }
        }
        Commands::Filters { action } => filters(&storage, action)?,
        Commands::Path => println!("{}", store.path().display()),
    }
    Ok(())
}

/// Keeps the document-wide session number when showing a single session.
fn renumber(timeline: &mut Timeline, all: &[Session], start: i64) {
    let Some(position) = all.iter().position(|s| s.start_timestamp == start) else {
        return;
    };
    for session in timeline.days.iter_mut().flat_map(|day| day.sessions.iter_mut()) {
        session.number = position + 1;
    }
}

fn filters(storage: &StorageConfig, action: FilterAction) -> Result<(), String> {
    let mut manager = FilterManager::load(storage.settings_file());
    match action {
        FilterAction::List => print!("{}", render::filter_list(manager.filters())),
        FilterAction::Add {
            program_name,
            disabled,
        } => {
            if program_name.trim().is_empty() {
                return Err("Program name must not be empty".to_string());
            }
            if !manager.add(&program_name, !disabled)? {
                return Err(format!("Filter for '{}' already exists", program_name));
            }
        }
        FilterAction::Remove { number } => {
            let index = number.checked_sub(1).ok_or("Filter numbers start at 1")?;
            if !manager.remove(index)? {
                return Err(format!("No filter number {}", number));
            }
        }
        FilterAction::Toggle { number } => {
            let index = number.checked_sub(1).ok_or("Filter numbers start at 1")?;
            if !manager.toggle(index)? {
                return Err(format!("No filter number {}", number));
            }
        }
    }
    Ok(())
}
