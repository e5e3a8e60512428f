//! Data layer for the volume board.
//!
//! Parses the operations sheet export into records, aggregates categories
//! per day-column and builds the home and per-company reports.

pub mod aggregator;
pub mod analysis;
pub mod reader;

pub use volume_core as core;
