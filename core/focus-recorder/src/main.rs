//! focus-recorder: records one focus session into the Focus Log.
//!
//! Reads focus events from a platform bridge on stdin (see [`bridge`]),
//! aggregates them per application and window title, and keeps
//! `focus_log.json` current while recording. The session ends when the
//! bridge closes its output or on Ctrl-C.

mod bridge;
mod logging;

use clap::Parser;
use focus_core::{
    load_recorder_config, Recorder, RecorderConfig, SessionAggregator, SessionStore,
    StorageConfig,
};
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

use bridge::LineSource;

#[derive(Parser)]
#[command(name = "focus-recorder")]
#[command(about = "Record application focus from a platform bridge on stdin")]
#[command(version)]
struct Cli {
    /// Free-text note stored with the session
    #[arg(long, default_value = "")]
    comment: String,

    /// Data directory (defaults to FOCUS_LOG_DIR or the per-user data dir)
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Recorder config file (defaults to <data-dir>/recorder.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let storage = match cli.data_dir.clone() {
        Some(dir) => Ok(StorageConfig::with_root(dir)),
        None => StorageConfig::resolve(),
    };
    let _logging_guard = logging::init(storage.as_ref().ok().map(|s| s.logs_dir()).as_deref());

    let storage = match storage {
        Ok(storage) => storage,
        Err(err) => {
            error!(error = %err, "Failed to resolve data directory");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(&cli, &storage) {
        error!(error = %err, "focus-recorder failed");
        std::process::exit(1);
    }
}

fn run(cli: &Cli, storage: &StorageConfig) -> Result<(), String> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| storage.recorder_config_file());
    let config = match load_recorder_config(&config_path) {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %err, "Failed to load recorder config; using defaults");
            RecorderConfig::default()
        }
    };

    let store = SessionStore::new(storage.log_file());
    info!(
        path = %store.path().display(),
        flush_policy = ?config.flush_policy(),
        "Focus recorder starting"
    );

    let aggregator = SessionAggregator::new(store, config.flush_policy());
    let source = LineSource::new(BufReader::new(io::stdin()));
    let mut recorder = Recorder::new(
        aggregator,
        source,
        Duration::from_millis(config.tick_interval_ms()),
    );

    let stop = recorder.stop_handle();
    if let Err(err) = ctrlc::set_handler(move || {
        stop.request_stop();
    }) {
        warn!(error = %err, "Failed to install Ctrl-C handler");
    }

    recorder.start_session(&cli.comment)?;
    match recorder.run()? {
        Some(session) => info!(
            start_timestamp = session.start_timestamp,
            duration_secs = session.duration_secs().unwrap_or(0),
            applications = session.applications().len(),
            "Session saved"
        ),
        None => warn!("No session was recorded"),
    }
    Ok(())
}
