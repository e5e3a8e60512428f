use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{DashboardError, Result};
use crate::models::MetricSpec;
use crate::normalize::{Normalizer, SignPolicy};

/// Worksheet read when `--sheet-name` is not given.
pub const DEFAULT_SHEET_NAME: &str = "구글 데이터";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Daily shipment volume and temporary-labor dashboard
#[derive(Parser, Debug, Clone)]
#[command(
    name = "volume-board",
    about = "Daily shipment volume and temporary-labor dashboard",
    version
)]
pub struct Settings {
    /// Google Sheets document id to export as CSV
    #[arg(long)]
    pub sheet_id: Option<String>,

    /// Worksheet name inside the document
    #[arg(long, default_value = DEFAULT_SHEET_NAME)]
    pub sheet_name: String,

    /// Read a local CSV file instead of the sheet export
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Report year (defaults to the current year)
    #[arg(long)]
    pub year: Option<i32>,

    /// Report month 1-12 (defaults to the current month)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,

    /// Open directly on this company's view
    #[arg(long)]
    pub entity: Option<String>,

    /// Header label of the company column; also locates the header row
    #[arg(long, default_value = "화주사")]
    pub entity_column: String,

    /// Header label of the category column
    #[arg(long, default_value = "구분")]
    pub category_column: String,

    /// Home summary metric as LABEL=KEYWORD[,KEYWORD...] (repeatable)
    #[arg(long = "metric", value_name = "LABEL=KEYWORDS")]
    pub metrics: Vec<String>,

    /// Fixed category order of the labor sub-report
    #[arg(long, value_delimiter = ',', default_value = "남,여,지게차")]
    pub labor_categories: Vec<String>,

    /// Read "-5" as -5 instead of 5
    #[arg(long)]
    pub signed_cells: bool,

    /// Refresh rate in seconds (1-300)
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u32).range(1..=300))]
    pub refresh_rate: u32,

    /// Seconds a fetched table stays fresh
    #[arg(long, default_value = "10")]
    pub cache_ttl: u64,

    /// Timezone used to pick the current month (auto-detected if not specified)
    #[arg(long, default_value = "auto")]
    pub timezone: String,

    /// Display theme
    #[arg(long, default_value = "auto", value_parser = ["light", "dark", "classic", "auto"])]
    pub theme: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.volume-board/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_rate: Option<u32>,
}

impl LastUsedParams {
    /// `~/.volume-board/last_used.json`.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".volume-board").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &std::path::Path) -> Result<()> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, resolve `"auto"` values, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Same as [`Settings::load_with_last_used`] with explicit args and
    /// config path so tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(e) = LastUsedParams::clear_at(config_path) {
                tracing::warn!(error = %e, "could not clear saved parameters");
            }
            return Self::resolve_auto_values(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins over persisted values.
        if settings.sheet_id.is_none() {
            settings.sheet_id = last.sheet_id;
        }
        if !is_arg_explicitly_set(&matches, "sheet_name") {
            if let Some(v) = last.sheet_name {
                settings.sheet_name = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "theme") {
            if let Some(v) = last.theme {
                settings.theme = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "timezone") {
            if let Some(v) = last.timezone {
                settings.timezone = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "refresh_rate") {
            if let Some(v) = last.refresh_rate {
                settings.refresh_rate = v;
            }
        }

        settings = Self::resolve_auto_values(settings);

        if let Err(e) = LastUsedParams::from(&settings).save_to(config_path) {
            tracing::warn!(error = %e, "could not persist parameters");
        }

        settings
    }

    /// Resolve `"auto"` timezone and apply the `--debug` flag.
    fn resolve_auto_values(mut settings: Settings) -> Settings {
        if settings.timezone == "auto" {
            settings.timezone = crate::time_utils::get_system_timezone();
        }
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// `(year, month)` to report: explicit flags, else the current month.
    pub fn report_month(&self) -> (i32, u32) {
        let (year, month) = crate::time_utils::current_year_month(&self.timezone);
        (self.year.unwrap_or(year), self.month.unwrap_or(month))
    }

    /// Parsed `--metric` definitions, or the built-in set when none given.
    pub fn metric_specs(&self) -> Result<Vec<MetricSpec>> {
        if self.metrics.is_empty() {
            return Ok(MetricSpec::defaults());
        }
        self.metrics.iter().map(|m| m.parse()).collect()
    }

    /// Cell normalizer matching `--signed-cells`.
    pub fn normalizer(&self) -> Normalizer {
        if self.signed_cells {
            Normalizer::new(SignPolicy::Signed)
        } else {
            Normalizer::default()
        }
    }

    /// Reject combinations that leave nothing to read.
    pub fn validate(&self) -> Result<()> {
        if self.file.is_none() && self.sheet_id.is_none() {
            return Err(DashboardError::Config(
                "either --file or --sheet-id is required".to_string(),
            ));
        }
        if self.entity_column.trim().is_empty() || self.category_column.trim().is_empty() {
            return Err(DashboardError::Config(
                "column labels must not be empty".to_string(),
            ));
        }
        if self.timezone != "auto" && !crate::time_utils::validate_timezone(&self.timezone) {
            return Err(DashboardError::Config(format!(
                "unknown timezone \"{}\"",
                self.timezone
            )));
        }
        Ok(())
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            sheet_id: s.sheet_id.clone(),
            sheet_name: Some(s.sheet_name.clone()),
            theme: Some(s.theme.clone()),
            timezone: Some(s.timezone.clone()),
            refresh_rate: Some(s.refresh_rate),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
