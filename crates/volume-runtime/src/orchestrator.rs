//! Async refresh orchestrator.
//!
//! Owns the [`DataManager`] inside a tokio task, sending a
//! [`DashboardSnapshot`] through an `mpsc` channel after every refresh so the
//! TUI event loop never touches the network or the cache directly.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::{mpsc, Notify};
use tokio::time;
use volume_core::models::RawTable;

use crate::data_manager::DataManager;

// ── Public types ──────────────────────────────────────────────────────────────

/// One refresh result forwarded to the TUI layer.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    /// Latest parsed table; `None` until the first successful fetch.
    pub table: Option<Arc<RawTable>>,
    /// Wall-clock time of the last successful fetch.
    pub fetched_at: Option<DateTime<Local>>,
    /// Where the table comes from (sheet name or file name).
    pub source: String,
    /// Error of the most recent refresh, if it failed.
    pub last_error: Option<String>,
}

impl DashboardSnapshot {
    /// `true` when the table shown is older than a failed refresh.
    pub fn is_stale(&self) -> bool {
        self.table.is_some() && self.last_error.is_some()
    }
}

// ── RefreshOrchestrator ───────────────────────────────────────────────────────

/// Background refresh coordinator.
pub struct RefreshOrchestrator {
    update_interval: Duration,
    data_manager: DataManager,
}

impl RefreshOrchestrator {
    pub fn new(data_manager: DataManager, update_interval_secs: u64) -> Self {
        Self {
            update_interval: Duration::from_secs(update_interval_secs.max(1)),
            data_manager,
        }
    }

    /// Spawn the refresh loop.
    ///
    /// Returns the snapshot receiver and a [`RefreshHandle`] that can abort
    /// the loop or ask for an out-of-cycle refresh.
    pub fn start(self) -> (mpsc::Receiver<DashboardSnapshot>, RefreshHandle) {
        let (tx, rx) = mpsc::channel(16);
        let notify = Arc::new(Notify::new());

        let loop_notify = Arc::clone(&notify);
        let handle = tokio::spawn(async move {
            self.refresh_loop(tx, loop_notify).await;
        });

        (rx, RefreshHandle { handle, notify })
    }

    // ── Private implementation ────────────────────────────────────────────

    /// Immediate forced fetch, then one refresh per tick or manual request.
    /// Exits when the receiver is dropped.
    async fn refresh_loop(self, tx: mpsc::Sender<DashboardSnapshot>, notify: Arc<Notify>) {
        let mut manager = self.data_manager;

        manager = match fetch_and_send(manager, &tx, true).await {
            Some(m) => m,
            None => return,
        };

        let mut interval = time::interval(self.update_interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
        interval.tick().await;

        loop {
            let force = tokio::select! {
                _ = interval.tick() => false,
                _ = notify.notified() => true,
            };

            if tx.is_closed() {
                tracing::debug!("snapshot channel closed; exiting loop");
                break;
            }

            manager = match fetch_and_send(manager, &tx, force).await {
                Some(m) => m,
                None => break,
            };
        }
    }
}

/// Run one blocking refresh on the blocking pool and forward the snapshot.
///
/// The manager is moved into the blocking task and handed back; `None`
/// means the task panicked and the loop cannot continue.
async fn fetch_and_send(
    mut manager: DataManager,
    tx: &mpsc::Sender<DashboardSnapshot>,
    force: bool,
) -> Option<DataManager> {
    let joined = tokio::task::spawn_blocking(move || {
        let table = manager.get_data(force);
        (manager, table)
    })
    .await;

    let (manager, table) = match joined {
        Ok(pair) => pair,
        Err(e) => {
            tracing::error!(error = %e, "refresh task failed; stopping refresh loop");
            return None;
        }
    };

    let snapshot = DashboardSnapshot {
        table,
        fetched_at: manager.last_successful_fetch(),
        source: manager.source_description(),
        last_error: manager.last_error().map(str::to_string),
    };

    if let Err(e) = tx.send(snapshot).await {
        tracing::warn!(error = %e, "failed to send snapshot; receiver dropped");
    }
    Some(manager)
}

// ── RefreshHandle ─────────────────────────────────────────────────────────────

/// Handle to the background refresh task.
pub struct RefreshHandle {
    handle: tokio::task::JoinHandle<()>,
    notify: Arc<Notify>,
}

impl RefreshHandle {
    /// Immediately abort the refresh loop.
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Ask for a forced refresh without waiting for the next tick.
    pub fn request_refresh(&self) {
        self.notify.notify_one();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
