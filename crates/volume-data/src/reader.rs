//! CSV table reading.
//!
//! Turns the raw export of the operations sheet into a [`RawTable`]: locates
//! the header row by the entity-column sentinel, classifies day-columns and
//! builds one [`Record`] per data row.

use std::collections::HashSet;

use tracing::{debug, warn};
use volume_core::error::{DashboardError, Result};
use volume_core::models::{CellValue, DayColumn, RawTable, Record};

/// Column labels that anchor the table inside the sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    /// Entity (company) column label; the first row containing it is the header.
    pub entity_label: String,
    /// Category column label.
    pub category_label: String,
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            entity_label: "화주사".to_string(),
            category_label: "구분".to_string(),
        }
    }
}

impl TableLayout {
    pub fn new(entity_label: impl Into<String>, category_label: impl Into<String>) -> Self {
        Self {
            entity_label: entity_label.into(),
            category_label: category_label.into(),
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Parse a CSV blob into a [`RawTable`].
///
/// * Rows above the header are preamble and ignored.
/// * The header is the first row with a cell equal (after trimming,
///   case-sensitive) to `layout.entity_label`.
/// * Columns whose label parses as a [`DayColumn`] become day-columns; a
///   repeated day label keeps its first column.
/// * Rows with a blank entity are dropped.
/// * Short rows simply lack the trailing cells; they are not padded.
pub fn parse_table(blob: &str, layout: &TableLayout) -> Result<RawTable> {
    let blob = blob.trim_start_matches('\u{feff}');
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(blob.as_bytes());

    let mut rows = reader.records();
    let mut preamble = 0usize;

    let header = loop {
        match rows.next() {
            Some(row) => {
                let row = row.map_err(csv_error)?;
                if row.iter().any(|f| f.trim() == layout.entity_label) {
                    break row;
                }
                preamble += 1;
            }
            None => return Err(DashboardError::HeaderNotFound(layout.entity_label.clone())),
        }
    };

    let labels: Vec<String> = header.iter().map(|f| f.trim().to_string()).collect();
    let entity_idx = labels
        .iter()
        .position(|l| *l == layout.entity_label)
        .ok_or_else(|| DashboardError::HeaderNotFound(layout.entity_label.clone()))?;
    let category_idx = labels
        .iter()
        .position(|l| *l == layout.category_label)
        .ok_or_else(|| DashboardError::MissingColumn(layout.category_label.clone()))?;

    let day_columns = classify_day_columns(&labels);

    let mut records = Vec::new();
    let mut dropped = 0usize;
    for row in rows {
        let row = row.map_err(csv_error)?;
        let entity = row.get(entity_idx).map(str::trim).unwrap_or_default();
        if entity.is_empty() {
            dropped += 1;
            continue;
        }
        let category = row.get(category_idx).map(str::trim).unwrap_or_default();

        let mut record = Record::new(entity, category);
        for (idx, column) in &day_columns {
            if let Some(field) = row.get(*idx) {
                record = record.with_cell(column.label.clone(), CellValue::from_field(field));
            }
        }
        records.push(record);
    }

    debug!(
        preamble,
        dropped,
        records = records.len(),
        day_columns = day_columns.len(),
        "parsed sheet table"
    );

    Ok(RawTable {
        columns: day_columns.into_iter().map(|(_, c)| c).collect(),
        records,
    })
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn csv_error(err: csv::Error) -> DashboardError {
    DashboardError::Csv(err.to_string())
}

/// `(column index, day-column)` for every header label that names a day.
fn classify_day_columns(labels: &[String]) -> Vec<(usize, DayColumn)> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut columns = Vec::new();
    for (idx, label) in labels.iter().enumerate() {
        let Some(column) = DayColumn::parse(label) else {
            continue;
        };
        if !seen.insert(column.label.clone()) {
            warn!("duplicate day column \"{}\" at index {}; ignored", label, idx);
            continue;
        }
        columns.push((idx, column));
    }
    columns
}

// ── Tests ─────────────────────────────────────────────────────────────────────
