//! Terminal UI layer for the volume board.
//!
//! Provides themes, the header component, the summary table widgets and the
//! application event loop built on top of [`ratatui`].

pub mod app;
pub mod components;
pub mod table_view;
pub mod themes;

pub use app::{App, ReportConfig, View};
pub use volume_core as core;
