//! TTL-cached data manager for the refresh loop.
//!
//! Wraps a [`TableSource`] plus [`parse_table`] with a short time-to-live
//! cache so operator edits show up within seconds without hammering the
//! sheet export. Fetches are retried with back-off; on failure the previous
//! table is served again.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use volume_core::error::Result;
use volume_core::models::RawTable;
use volume_data::reader::{parse_table, TableLayout};

use crate::source::TableSource;

// ── Defaults ──────────────────────────────────────────────────────────────────

/// Maximum number of fetch attempts before giving up and returning stale data.
const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Back-off step between attempts (attempt × step).
const RETRY_STEP: Duration = Duration::from_millis(100);

// ── DataManager ───────────────────────────────────────────────────────────────

/// TTL-cached wrapper around fetch + parse.
pub struct DataManager {
    source: Box<dyn TableSource>,
    layout: TableLayout,
    /// Maximum age of cached data before it is considered stale.
    cache_ttl: Duration,
    retry_step: Duration,
    cache: Option<Arc<RawTable>>,
    /// When the cache was last populated.
    cache_timestamp: Option<Instant>,
    /// Human-readable description of the last error encountered.
    last_error: Option<String>,
    /// Wall-clock time of the last *successful* fetch.
    last_successful_fetch: Option<DateTime<Local>>,
}

impl DataManager {
    pub fn new(source: Box<dyn TableSource>, layout: TableLayout, cache_ttl_secs: u64) -> Self {
        Self {
            source,
            layout,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            retry_step: RETRY_STEP,
            cache: None,
            cache_timestamp: None,
            last_error: None,
            last_successful_fetch: None,
        }
    }

    /// Override the back-off step (tests use zero).
    pub fn with_retry_step(mut self, step: Duration) -> Self {
        self.retry_step = step;
        self
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Return the table, using the cache when it is still valid.
    ///
    /// When `force_refresh` is `true` the cache is bypassed. On fetch failure
    /// the previous table (if any) is returned and the error is remembered
    /// in [`DataManager::last_error`].
    pub fn get_data(&mut self, force_refresh: bool) -> Option<Arc<RawTable>> {
        if !force_refresh && self.is_cache_valid() {
            tracing::debug!("returning cached sheet table");
            return self.cache.clone();
        }

        match self.fetch_with_retry() {
            Ok(table) => {
                tracing::debug!(
                    records = table.records.len(),
                    day_columns = table.columns.len(),
                    "sheet cache updated"
                );
                self.cache = Some(Arc::new(table));
                self.cache_timestamp = Some(Instant::now());
                self.last_successful_fetch = Some(Local::now());
                self.last_error = None;
                self.cache.clone()
            }
            Err(e) => {
                tracing::warn!(error = %e, "fetch failed; falling back to cached data");
                self.last_error = Some(e.to_string());
                self.cache.clone()
            }
        }
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_successful_fetch(&self) -> Option<DateTime<Local>> {
        self.last_successful_fetch
    }

    pub fn source_description(&self) -> String {
        self.source.describe()
    }

    // ── Private helpers ───────────────────────────────────────────────────

    fn is_cache_valid(&self) -> bool {
        match (self.cache.as_ref(), self.cache_timestamp) {
            (Some(_), Some(ts)) => ts.elapsed() < self.cache_ttl,
            _ => false,
        }
    }

    /// Up to [`MAX_RETRY_ATTEMPTS`] attempts, sleeping `attempt × retry_step`
    /// between them.
    fn fetch_with_retry(&self) -> Result<RawTable> {
        let mut attempt = 0;
        loop {
            match self.fetch_fresh() {
                Ok(table) => return Ok(table),
                Err(e) => {
                    attempt += 1;
                    tracing::warn!(attempt, error = %e, "fetch attempt failed");
                    if attempt >= MAX_RETRY_ATTEMPTS {
                        return Err(e);
                    }
                    thread::sleep(self.retry_step * attempt);
                }
            }
        }
    }

    fn fetch_fresh(&self) -> Result<RawTable> {
        let blob = self.source.fetch()?;
        parse_table(&blob, &self.layout)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use volume_core::error::DashboardError;

    const BLOB: &str = "화주사,구분,1,2\nAcme,출고,5,6\n";

    /// Serves a scripted sequence of responses and counts calls.
    struct ScriptedSource {
        responses: Mutex<Vec<std::result::Result<String, String>>>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedSource {
        fn new(responses: Vec<std::result::Result<&str, &str>>) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let responses = responses
                .into_iter()
                .rev()
                .map(|r| r.map(str::to_string).map_err(str::to_string))
                .collect();
            (
                Self {
                    responses: Mutex::new(responses),
                    calls: Arc::clone(&calls),
                },
                calls,
            )
        }
    }

    impl TableSource for ScriptedSource {
        fn fetch(&self) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.responses.lock().unwrap().pop();
            match next {
                Some(Ok(blob)) => Ok(blob),
                Some(Err(msg)) => Err(DashboardError::Config(msg)),
                None => Err(DashboardError::Config("script exhausted".to_string())),
            }
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }

    fn manager(responses: Vec<std::result::Result<&str, &str>>, ttl: u64) -> (DataManager, Arc<AtomicUsize>) {
        let (source, calls) = ScriptedSource::new(responses);
        let mgr = DataManager::new(Box::new(source), TableLayout::default(), ttl)
            .with_retry_step(Duration::ZERO);
        (mgr, calls)
    }

    // ── cache miss on first call ──────────────────────────────────────────

    #[test]
    fn test_cache_empty_before_first_call() {
        let (mgr, calls) = manager(vec![Ok(BLOB)], 30);
        assert!(!mgr.is_cache_valid());
        assert!(mgr.cache_timestamp.is_none());
        assert!(mgr.last_error().is_none());
        assert!(mgr.last_successful_fetch().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_first_call_fetches_and_parses() {
        let (mut mgr, calls) = manager(vec![Ok(BLOB)], 30);
        let table = mgr.get_data(false).expect("table");
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.columns.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(mgr.last_successful_fetch().is_some());
    }

    // ── cache valid within TTL ────────────────────────────────────────────

    #[test]
    fn test_cache_valid_within_ttl() {
        let (mut mgr, calls) = manager(vec![Ok(BLOB), Ok(BLOB)], 30);
        let first = mgr.get_data(false).unwrap();
        let second = mgr.get_data(false).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    // ── cache expired after TTL ───────────────────────────────────────────

    #[test]
    fn test_cache_expired_with_zero_ttl() {
        let (mut mgr, calls) = manager(vec![Ok(BLOB), Ok(BLOB)], 0);
        mgr.get_data(false);
        assert!(!mgr.is_cache_valid());
        mgr.get_data(false);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    // ── force_refresh bypasses valid cache ────────────────────────────────

    #[test]
    fn test_force_refresh_bypasses_cache() {
        let (mut mgr, calls) = manager(vec![Ok(BLOB), Ok(BLOB)], 60);
        mgr.get_data(false);
        mgr.get_data(true);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    // ── retries ───────────────────────────────────────────────────────────

    #[test]
    fn test_retry_recovers_after_transient_failure() {
        let (mut mgr, calls) = manager(vec![Err("timeout"), Ok(BLOB)], 30);
        assert!(mgr.get_data(false).is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(mgr.last_error().is_none());
    }

    #[test]
    fn test_gives_up_after_three_attempts() {
        let (mut mgr, calls) = manager(vec![Err("a"), Err("b"), Err("c"), Ok(BLOB)], 30);
        assert!(mgr.get_data(false).is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(mgr.last_error(), Some("Configuration error: c"));
    }

    // ── stale fallback ────────────────────────────────────────────────────

    #[test]
    fn test_failure_falls_back_to_stale_table() {
        let (mut mgr, _calls) = manager(vec![Ok(BLOB), Err("x"), Err("y"), Err("z")], 0);
        let first = mgr.get_data(false).unwrap();
        let second = mgr.get_data(false).expect("stale table served");
        assert!(Arc::ptr_eq(&first, &second));
        assert!(mgr.last_error().is_some());
    }

    #[test]
    fn test_parse_error_counts_as_failure() {
        let (mut mgr, calls) = manager(vec![Ok("no,header\n"), Ok("x\n"), Ok("y\n")], 30);
        assert!(mgr.get_data(false).is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(mgr.last_error().unwrap().contains("Header row not found"));
    }

    #[test]
    fn test_source_description() {
        let (mgr, _calls) = manager(vec![], 30);
        assert_eq!(mgr.source_description(), "scripted");
    }
}
