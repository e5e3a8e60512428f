//! Where the raw CSV blob comes from.
//!
//! [`SheetSource`] downloads the public CSV export of a Google Sheets
//! worksheet; [`FileSource`] reads a local file. Both are blocking and are
//! driven from `spawn_blocking` by the orchestrator.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;
use volume_core::error::{DashboardError, Result};

/// Base of the Google Sheets visualization endpoint.
const EXPORT_BASE: &str = "https://docs.google.com/";

/// Per-request timeout for the sheet export.
pub const FETCH_TIMEOUT_SECS: u64 = 15;

/// Anything that can hand over the current CSV blob.
pub trait TableSource: Send {
    /// Fetch the whole CSV document.
    fn fetch(&self) -> Result<String>;

    /// Short human-readable origin, shown in the header and logs.
    fn describe(&self) -> String;
}

// ── SheetSource ───────────────────────────────────────────────────────────────

/// CSV export of one worksheet of a public Google Sheets document.
#[derive(Debug, Clone)]
pub struct SheetSource {
    url: Url,
    sheet_name: String,
    timeout: Duration,
}

impl SheetSource {
    pub fn new(sheet_id: &str, sheet_name: &str) -> Result<Self> {
        Ok(Self {
            url: Self::export_url(sheet_id, sheet_name)?,
            sheet_name: sheet_name.to_string(),
            timeout: Duration::from_secs(FETCH_TIMEOUT_SECS),
        })
    }

    /// `https://docs.google.com/spreadsheets/d/{id}/gviz/tq?tqx=out:csv&sheet={name}`
    ///
    /// Path segments and the sheet name are percent-encoded.
    pub fn export_url(sheet_id: &str, sheet_name: &str) -> Result<Url> {
        let sheet_id = sheet_id.trim();
        if sheet_id.is_empty() {
            return Err(DashboardError::Config("sheet id is empty".to_string()));
        }

        let mut url = Url::parse(EXPORT_BASE)
            .map_err(|e| DashboardError::Config(format!("bad export base: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| DashboardError::Config("export base cannot hold a path".to_string()))?
            .clear()
            .extend(["spreadsheets", "d", sheet_id, "gviz", "tq"]);
        url.query_pairs_mut()
            .append_pair("tqx", "out:csv")
            .append_pair("sheet", sheet_name);
        Ok(url)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl TableSource for SheetSource {
    fn fetch(&self) -> Result<String> {
        // The blocking client owns a runtime; build and drop it on the calling
        // (blocking) thread.
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(fetch_error)?;

        let response = client.get(self.url.clone()).send().map_err(fetch_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(DashboardError::HttpStatus {
                status: status.as_u16(),
                url: self.url.to_string(),
            });
        }

        let body = response.text().map_err(fetch_error)?;
        tracing::debug!(bytes = body.len(), sheet = %self.sheet_name, "sheet export downloaded");
        Ok(body)
    }

    fn describe(&self) -> String {
        format!("sheet \"{}\"", self.sheet_name)
    }
}

fn fetch_error(err: reqwest::Error) -> DashboardError {
    DashboardError::Fetch(err.to_string())
}

// ── FileSource ────────────────────────────────────────────────────────────────

/// A CSV file on local disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TableSource for FileSource {
    fn fetch(&self) -> Result<String> {
        let bytes = std::fs::read(&self.path).map_err(|source| DashboardError::FileRead {
            path: self.path.clone(),
            source,
        })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn describe(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
