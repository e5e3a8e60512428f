//! Runtime layer for the volume board.
//!
//! Fetches the sheet export (or a local file), keeps a TTL cache of the
//! parsed table and pushes refresh snapshots to the UI.

pub mod data_manager;
pub mod orchestrator;
pub mod source;

pub use volume_core as core;
pub use volume_data as data;

pub use data_manager::DataManager;
pub use orchestrator::{DashboardSnapshot, RefreshHandle, RefreshOrchestrator};
pub use source::{FileSource, SheetSource, TableSource};
