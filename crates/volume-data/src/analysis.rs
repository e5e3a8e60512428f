//! Report-level analysis over a parsed sheet table.
//!
//! Builds what the two dashboard views show: the home summary (one row per
//! company, one column per metric) and the per-company report (a volume
//! table plus the fixed-order labor table) for one calendar month.

use std::collections::HashSet;

use tracing::debug;
use volume_core::models::{normalize_key, DayColumn, MetricSpec, RawTable, Record, SummaryTable};
use volume_core::normalize::Normalizer;

use crate::aggregator::CategoryAggregator;

// ── Month / entity selection ──────────────────────────────────────────────────

/// Day-columns belonging to `year`-`month`, in header order.
pub fn month_columns(columns: &[DayColumn], year: i32, month: u32) -> Vec<DayColumn> {
    columns
        .iter()
        .filter(|c| c.key.in_month(year, month))
        .cloned()
        .collect()
}

/// Entity labels in first-seen order, deduplicated by normalized key.
pub fn entities(table: &RawTable) -> Vec<String> {
    let mut seen = HashSet::new();
    table
        .records
        .iter()
        .filter(|r| seen.insert(r.entity_key()))
        .map(|r| r.entity().trim().to_string())
        .collect()
}

/// Records of one entity, matched by normalized key.
pub fn filter_entity(records: &[Record], entity: &str) -> Vec<Record> {
    let key = normalize_key(entity);
    records
        .iter()
        .filter(|r| r.entity_key() == key)
        .cloned()
        .collect()
}

// ── Home summary ──────────────────────────────────────────────────────────────

/// Metric totals of one entity for the selected month.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySummary {
    pub entity: String,
    /// One value per metric, aligned with [`HomeSummary::metrics`].
    pub values: Vec<f64>,
}

/// Home view: every entity against every metric.
#[derive(Debug, Clone, PartialEq)]
pub struct HomeSummary {
    pub metrics: Vec<MetricSpec>,
    pub rows: Vec<EntitySummary>,
}

impl HomeSummary {
    /// Column sums across all entities, aligned with `metrics`.
    pub fn totals(&self) -> Vec<f64> {
        let mut totals = vec![0.0; self.metrics.len()];
        for row in &self.rows {
            for (acc, value) in totals.iter_mut().zip(&row.values) {
                *acc += value;
            }
        }
        totals
    }
}

/// Sum of one metric over `records` and `columns`.
pub fn metric_total(
    aggregator: &CategoryAggregator,
    records: &[Record],
    columns: &[DayColumn],
    metric: &MetricSpec,
) -> f64 {
    let matching: Vec<Record> = records
        .iter()
        .filter(|r| metric.matches(r.category()))
        .cloned()
        .collect();
    aggregator.sum(&matching, columns)
}

/// One [`EntitySummary`] per entity (first-seen order).
pub fn summarize_entities(
    table: &RawTable,
    columns: &[DayColumn],
    metrics: &[MetricSpec],
    normalizer: Normalizer,
) -> HomeSummary {
    let aggregator = CategoryAggregator::new(normalizer);
    let rows = entities(table)
        .into_iter()
        .map(|entity| {
            let records = filter_entity(&table.records, &entity);
            let values = metrics
                .iter()
                .map(|m| metric_total(&aggregator, &records, columns, m))
                .collect();
            EntitySummary { entity, values }
        })
        .collect::<Vec<_>>();

    debug!(
        entities = rows.len(),
        metrics = metrics.len(),
        days = columns.len(),
        "home summary built"
    );

    HomeSummary {
        metrics: metrics.to_vec(),
        rows,
    }
}

// ── Entity report ─────────────────────────────────────────────────────────────

/// Per-company view for one month.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityReport {
    pub entity: String,
    /// Every category outside the labor set, first-seen order.
    pub volume: SummaryTable,
    /// The labor categories, in their fixed order.
    pub labor: SummaryTable,
}

/// Build the report of `entity` over `columns`.
pub fn entity_report(
    table: &RawTable,
    entity: &str,
    columns: &[DayColumn],
    labor_categories: &[String],
    normalizer: Normalizer,
) -> EntityReport {
    let aggregator = CategoryAggregator::new(normalizer);
    let records = filter_entity(&table.records, entity);

    let labor_keys: HashSet<String> = labor_categories.iter().map(|c| normalize_key(c)).collect();
    let (labor, volume): (Vec<Record>, Vec<Record>) = records
        .into_iter()
        .partition(|r| labor_keys.contains(&r.category_key()));

    EntityReport {
        entity: entity.trim().to_string(),
        volume: aggregator.aggregate(&volume, columns),
        labor: aggregator.aggregate_fixed(&labor, columns, labor_categories),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
