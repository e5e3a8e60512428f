use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use volume_core::settings::Settings;
use volume_runtime::source::{FileSource, SheetSource, TableSource};

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// `~/.volume-board/`, or `./.volume-board/` without a home directory.
pub fn board_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".volume-board")
}

/// Ensure `~/.volume-board/` and `~/.volume-board/logs/` exist.
pub fn ensure_directories() -> anyhow::Result<()> {
    let dir = board_dir();
    std::fs::create_dir_all(&dir)?;
    std::fs::create_dir_all(dir.join("logs"))?;
    Ok(())
}

/// Log file used when `--log-file` is not given.
pub fn default_log_path() -> PathBuf {
    board_dir().join("logs").join("volume-board.log")
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map the CLI level names onto `EnvFilter` directives.
pub fn level_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        other => other.to_lowercase(),
    }
}

/// Open `path` for appending, creating it and its parent directory.
pub fn open_log_file(path: &Path) -> anyhow::Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))
}

/// Initialise the global `tracing` subscriber, writing to `log_file`.
///
/// The terminal belongs to the dashboard, so nothing is logged to stderr.
/// `RUST_LOG` is not consulted; the level comes from the CLI.
pub fn setup_logging(log_level: &str, log_file: &Path) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(level_directive(log_level)).unwrap_or_else(|_| EnvFilter::new("info"));

    let writer = Mutex::new(open_log_file(log_file)?);
    let layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_ansi(false)
        .with_writer(writer);

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .context("installing tracing subscriber")?;

    Ok(())
}

// ── Source selection ───────────────────────────────────────────────────────────

/// `--file` wins over `--sheet-id`.
pub fn build_source(settings: &Settings) -> anyhow::Result<Box<dyn TableSource>> {
    if let Some(path) = &settings.file {
        return Ok(Box::new(FileSource::new(path.clone())));
    }
    let sheet_id = settings
        .sheet_id
        .as_deref()
        .context("either --file or --sheet-id is required")?;
    let source = SheetSource::new(sheet_id, &settings.sheet_name)?;
    tracing::debug!(url = %source.url(), "sheet export url");
    Ok(Box::new(source))
}

// ── Tests ──────────────────────────────────────────────────────────────────────
