//! Category aggregation over a selection of day-columns.
//!
//! Two tie-break rules are part of the contract, not accidents:
//! categories come out in the order they are first seen in the input, and
//! records sharing a category key are summed, never deduplicated.

use std::collections::HashMap;

use volume_core::models::{normalize_key, AggregatedRow, DayColumn, Record, SummaryTable};
use volume_core::normalize::Normalizer;

// ── CategoryAggregator ────────────────────────────────────────────────────────

/// Stateless helper that folds records into a [`SummaryTable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryAggregator {
    normalizer: Normalizer,
}

impl CategoryAggregator {
    pub fn new(normalizer: Normalizer) -> Self {
        Self { normalizer }
    }

    /// Group `records` by category key (first-seen order) and sum every
    /// selected day-column.
    ///
    /// A record lacking one of `columns` contributes 0 for it. Empty input
    /// gives a table with no category rows and an all-zero total row.
    pub fn aggregate(&self, records: &[Record], columns: &[DayColumn]) -> SummaryTable {
        let mut rows: Vec<AggregatedRow> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for record in records {
            let slot = *index.entry(record.category_key()).or_insert_with(|| {
                rows.push(AggregatedRow::zeroed(record.category().trim(), columns.len()));
                rows.len() - 1
            });
            self.accumulate(&mut rows[slot], record, columns);
        }

        SummaryTable::new(columns.to_vec(), rows)
    }

    /// Like [`CategoryAggregator::aggregate`], but the rows are exactly
    /// `categories`, in that order.
    ///
    /// Categories with no matching record yield all-zero rows; records whose
    /// category is not listed are ignored. Listing the same key twice keeps
    /// the first occurrence.
    pub fn aggregate_fixed(
        &self,
        records: &[Record],
        columns: &[DayColumn],
        categories: &[String],
    ) -> SummaryTable {
        let mut rows: Vec<AggregatedRow> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for label in categories {
            let key = normalize_key(label);
            if index.contains_key(&key) {
                continue;
            }
            index.insert(key, rows.len());
            rows.push(AggregatedRow::zeroed(label.trim(), columns.len()));
        }

        for record in records {
            if let Some(&slot) = index.get(&record.category_key()) {
                self.accumulate(&mut rows[slot], record, columns);
            }
        }

        SummaryTable::new(columns.to_vec(), rows)
    }

    /// Sum of normalized cells across `records` and `columns`.
    pub fn sum(&self, records: &[Record], columns: &[DayColumn]) -> f64 {
        records
            .iter()
            .flat_map(|r| columns.iter().map(move |c| (r, c)))
            .map(|(r, c)| r.cell(&c.label).map_or(0.0, |v| self.normalizer.normalize(v)))
            .sum()
    }

    // ── Private ───────────────────────────────────────────────────────────────

    fn accumulate(&self, row: &mut AggregatedRow, record: &Record, columns: &[DayColumn]) {
        for (acc, column) in row.values.iter_mut().zip(columns) {
            if let Some(cell) = record.cell(&column.label) {
                *acc += self.normalizer.normalize(cell);
            }
        }
    }
}

/// Aggregate with the default normalizer.
pub fn aggregate(records: &[Record], columns: &[DayColumn]) -> SummaryTable {
    CategoryAggregator::default().aggregate(records, columns)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
