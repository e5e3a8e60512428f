//! Core types for the volume board.
//!
//! Holds the cell normalizer, the table/record models shared by every other
//! crate, display formatting, errors and CLI settings.

pub mod error;
pub mod formatting;
pub mod models;
pub mod normalize;
pub mod settings;
pub mod time_utils;

pub use error::{DashboardError, Result};
