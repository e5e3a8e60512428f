use std::collections::HashMap;
use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::DashboardError;

/// Label of the synthetic row appended after every category row.
pub const TOTAL_ROW_LABEL: &str = "Daily total";

// ── CellValue ─────────────────────────────────────────────────────────────────

/// A raw, untyped value as it appears in the source sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum CellValue {
    /// Already-numeric value.
    Number(f64),
    /// Operator-entered text; may contain separators, units or nothing useful.
    Text(String),
    /// Blank cell.
    #[default]
    Empty,
}

impl CellValue {
    /// Wrap a raw CSV field. Whitespace-only fields become [`CellValue::Empty`].
    pub fn from_field(field: &str) -> Self {
        if field.trim().is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(field.to_string())
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<Option<&str>> for CellValue {
    fn from(value: Option<&str>) -> Self {
        value.map(CellValue::from).unwrap_or(CellValue::Empty)
    }
}

// ── Key normalization ─────────────────────────────────────────────────────────

/// Matching key for entity and category labels.
///
/// Removes every whitespace character and lower-cases the rest, so that
/// `" 남 "`, `"남"` and `"Male Count"` / `"malecount"` compare equal.
///
/// # Examples
///
/// ```
/// use volume_core::models::normalize_key;
///
/// assert_eq!(normalize_key("  ACME  Logistics "), "acmelogistics");
/// assert_eq!(normalize_key("지 게 차"), "지게차");
/// ```
pub fn normalize_key(label: &str) -> String {
    label
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

// ── DayColumn ─────────────────────────────────────────────────────────────────

/// Calendar identity of a day-column header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayKey {
    /// Full calendar date header, e.g. `2026-01-05`.
    Date(NaiveDate),
    /// Bare day numeral header (`1`..`31`); the month comes from the report.
    DayOfMonth(u32),
}

impl DayKey {
    /// Day of month, regardless of header style.
    pub fn day(&self) -> u32 {
        match self {
            DayKey::Date(date) => date.day(),
            DayKey::DayOfMonth(day) => *day,
        }
    }

    /// Whether this column belongs to the given calendar month.
    ///
    /// A bare numeral belongs to any month that has that many days.
    pub fn in_month(&self, year: i32, month: u32) -> bool {
        match self {
            DayKey::Date(date) => date.year() == year && date.month() == month,
            DayKey::DayOfMonth(day) => NaiveDate::from_ymd_opt(year, month, *day).is_some(),
        }
    }
}

/// One calendar-day bucket of the source table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DayColumn {
    /// Header label exactly as found in the sheet (trimmed).
    pub label: String,
    pub key: DayKey,
}

fn date_header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{4})[-/.]\s*(\d{1,2})[-/.]\s*(\d{1,2})\.?(?:\s.*)?$").expect("regex is valid")
    })
}

fn day_header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,2})\s*일?$").expect("regex is valid"))
}

impl DayColumn {
    /// Classify a header label as a day-column.
    ///
    /// Accepts full dates (`2026-01-05`, `2026/1/5`, `2026. 1. 5`, optionally
    /// followed by a time part) and day numerals (`5`, `05`, `5일`).
    /// Returns `None` for anything else, including impossible dates.
    ///
    /// # Examples
    ///
    /// ```
    /// use volume_core::models::{DayColumn, DayKey};
    ///
    /// let col = DayColumn::parse("2026-01-05").unwrap();
    /// assert_eq!(col.key.day(), 5);
    /// assert_eq!(DayColumn::parse("12일").unwrap().key, DayKey::DayOfMonth(12));
    /// assert!(DayColumn::parse("구분").is_none());
    /// assert!(DayColumn::parse("2026-02-30").is_none());
    /// ```
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();

        if let Some(caps) = date_header_re().captures(label) {
            let year: i32 = caps[1].parse().ok()?;
            let month: u32 = caps[2].parse().ok()?;
            let day: u32 = caps[3].parse().ok()?;
            let date = NaiveDate::from_ymd_opt(year, month, day)?;
            return Some(Self {
                label: label.to_string(),
                key: DayKey::Date(date),
            });
        }

        let caps = day_header_re().captures(label)?;
        let day: u32 = caps[1].parse().ok()?;
        if !(1..=31).contains(&day) {
            return None;
        }
        Some(Self {
            label: label.to_string(),
            key: DayKey::DayOfMonth(day),
        })
    }
}

// ── Record ────────────────────────────────────────────────────────────────────

/// One data row of the source table. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    entity: String,
    category: String,
    cells: HashMap<String, CellValue>,
}

impl Record {
    /// Start a record with no day cells.
    pub fn new(entity: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            category: category.into(),
            cells: HashMap::new(),
        }
    }

    /// Builder-style: attach the cell for `day_label`.
    pub fn with_cell(mut self, day_label: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.cells.insert(day_label.into(), value.into());
        self
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Cell for a day-column label, `None` when the record never had it.
    pub fn cell(&self, day_label: &str) -> Option<&CellValue> {
        self.cells.get(day_label)
    }

    pub fn entity_key(&self) -> String {
        normalize_key(&self.entity)
    }

    pub fn category_key(&self) -> String {
        normalize_key(&self.category)
    }
}

/// Parsed source table: the day-columns in header order and every data row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub columns: Vec<DayColumn>,
    pub records: Vec<Record>,
}

// ── AggregatedRow / SummaryTable ──────────────────────────────────────────────

/// One category's per-day sums, aligned with [`SummaryTable::columns`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedRow {
    pub label: String,
    pub values: Vec<f64>,
}

impl AggregatedRow {
    /// All-zero row spanning `width` day-columns.
    pub fn zeroed(label: impl Into<String>, width: usize) -> Self {
        Self {
            label: label.into(),
            values: vec![0.0; width],
        }
    }

    /// Sum of the day values, recomputed on every call.
    pub fn month_total(&self) -> f64 {
        self.values.iter().sum()
    }
}

/// The trailing row of a [`SummaryTable`]: column-wise day sums plus the
/// table's grand total.
///
/// The month total is the sum of the category month totals, not the sum of
/// `values`, so it always equals [`SummaryTable::grand_total`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalRow {
    pub label: String,
    pub values: Vec<f64>,
    month_total: f64,
}

impl TotalRow {
    pub fn month_total(&self) -> f64 {
        self.month_total
    }
}

/// One display row of [`SummaryTable::rows`].
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryRow<'a> {
    Category(&'a AggregatedRow),
    Total(TotalRow),
}

impl SummaryRow<'_> {
    pub fn label(&self) -> &str {
        match self {
            SummaryRow::Category(row) => &row.label,
            SummaryRow::Total(row) => &row.label,
        }
    }

    pub fn values(&self) -> &[f64] {
        match self {
            SummaryRow::Category(row) => &row.values,
            SummaryRow::Total(row) => &row.values,
        }
    }

    pub fn month_total(&self) -> f64 {
        match self {
            SummaryRow::Category(row) => row.month_total(),
            SummaryRow::Total(row) => row.month_total(),
        }
    }
}

/// Category rows for one selection of day-columns plus the trailing total.
///
/// The trailing row is never stored: [`SummaryTable::total_row`] derives it
/// from the category rows each time it is asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryTable {
    columns: Vec<DayColumn>,
    categories: Vec<AggregatedRow>,
}

impl SummaryTable {
    /// Build a table from category rows; rows are padded or cut to the
    /// column count so every row is aligned.
    pub fn new(columns: Vec<DayColumn>, mut categories: Vec<AggregatedRow>) -> Self {
        let width = columns.len();
        for row in &mut categories {
            row.values.resize(width, 0.0);
        }
        Self {
            columns,
            categories,
        }
    }

    pub fn columns(&self) -> &[DayColumn] {
        &self.columns
    }

    /// Category rows in output order, without the trailing row.
    pub fn categories(&self) -> &[AggregatedRow] {
        &self.categories
    }

    /// Look up a category row by label, using [`normalize_key`] matching.
    pub fn category(&self, label: &str) -> Option<&AggregatedRow> {
        let key = normalize_key(label);
        self.categories
            .iter()
            .find(|row| normalize_key(&row.label) == key)
    }

    /// Column-wise sum of every category row, closed by the grand total.
    pub fn total_row(&self) -> TotalRow {
        let mut values = vec![0.0; self.columns.len()];
        for row in &self.categories {
            for (acc, value) in values.iter_mut().zip(&row.values) {
                *acc += value;
            }
        }
        TotalRow {
            label: TOTAL_ROW_LABEL.to_string(),
            values,
            month_total: self.grand_total(),
        }
    }

    /// Sum of the category month totals.
    pub fn grand_total(&self) -> f64 {
        self.categories.iter().map(AggregatedRow::month_total).sum()
    }

    /// Every row for display: categories first, trailing total last.
    pub fn rows(&self) -> Vec<SummaryRow<'_>> {
        self.categories
            .iter()
            .map(SummaryRow::Category)
            .chain(std::iter::once(SummaryRow::Total(self.total_row())))
            .collect()
    }

    /// `true` when there are no category rows.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

// ── MetricSpec ────────────────────────────────────────────────────────────────

/// A home-summary column: rows whose category contains any keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSpec {
    pub label: String,
    pub keywords: Vec<String>,
}

impl MetricSpec {
    pub fn new(label: impl Into<String>, keywords: &[&str]) -> Self {
        Self {
            label: label.into(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Substring match against the whitespace-free, lower-cased category.
    pub fn matches(&self, category: &str) -> bool {
        let key = normalize_key(category);
        self.keywords
            .iter()
            .map(|k| normalize_key(k))
            .any(|k| !k.is_empty() && key.contains(&k))
    }

    /// Built-in metrics: outbound, inbound and headcount.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("출고", &["출고"]),
            Self::new("입고", &["입고"]),
            Self::new("인원", &["남", "여", "지게차"]),
        ]
    }
}

impl std::str::FromStr for MetricSpec {
    type Err = DashboardError;

    /// Parse `LABEL=kw1,kw2`. A bare `LABEL` uses itself as the only keyword.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (label, keywords) = match s.split_once('=') {
            Some((label, rest)) => (label.trim(), rest),
            None => (s.trim(), s),
        };
        let keywords: Vec<String> = keywords
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();
        if label.is_empty() || keywords.is_empty() {
            return Err(DashboardError::InvalidMetric(s.to_string()));
        }
        Ok(Self {
            label: label.to_string(),
            keywords,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn day(label: &str) -> DayColumn {
        DayColumn::parse(label).expect("valid day header")
    }

    // ── normalize_key ─────────────────────────────────────────────────────────

    #[test]
    fn test_normalize_key_strips_inner_whitespace() {
        assert_eq!(normalize_key(" 남 자 "), "남자");
        assert_eq!(normalize_key("Acme\tCo"), "acmeco");
    }

    #[test]
    fn test_normalize_key_case_insensitive() {
        assert_eq!(normalize_key("ACME"), normalize_key("acme"));
    }

    // ── DayColumn::parse ──────────────────────────────────────────────────────

    #[test]
    fn test_parse_full_date_variants() {
        let expected = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        for label in ["2026-01-05", "2026/1/5", "2026. 1. 5", "2026-01-05 00:00:00"] {
            assert_eq!(day(label).key, DayKey::Date(expected), "label {label}");
        }
    }

    #[test]
    fn test_parse_day_numeral_variants() {
        assert_eq!(day("7").key, DayKey::DayOfMonth(7));
        assert_eq!(day("07").key, DayKey::DayOfMonth(7));
        assert_eq!(day("31일").key, DayKey::DayOfMonth(31));
    }

    #[test]
    fn test_parse_rejects_non_day_labels() {
        assert!(DayColumn::parse("화주사").is_none());
        assert!(DayColumn::parse("0").is_none());
        assert!(DayColumn::parse("32").is_none());
        assert!(DayColumn::parse("2026-13-01").is_none());
        assert!(DayColumn::parse("월 합계").is_none());
    }

    #[test]
    fn test_parse_keeps_trimmed_label() {
        assert_eq!(day("  2026-03-01 ").label, "2026-03-01");
    }

    // ── DayKey::in_month ──────────────────────────────────────────────────────

    #[test]
    fn test_date_key_in_month() {
        let key = day("2026-02-14").key;
        assert!(key.in_month(2026, 2));
        assert!(!key.in_month(2026, 3));
        assert!(!key.in_month(2025, 2));
    }

    #[test]
    fn test_day_numeral_respects_month_length() {
        let key = DayKey::DayOfMonth(30);
        assert!(key.in_month(2026, 1));
        assert!(!key.in_month(2026, 2));
    }

    // ── CellValue ─────────────────────────────────────────────────────────────

    #[test]
    fn test_cell_from_field() {
        assert_eq!(CellValue::from_field("   "), CellValue::Empty);
        assert_eq!(CellValue::from_field(" 12 "), CellValue::Text(" 12 ".to_string()));
        assert_eq!(CellValue::from(None::<&str>), CellValue::Empty);
    }

    // ── Record ────────────────────────────────────────────────────────────────

    #[test]
    fn test_record_missing_cell_is_none() {
        let rec = Record::new("Acme", "출고").with_cell("1", "5");
        assert_eq!(rec.cell("1"), Some(&CellValue::Text("5".to_string())));
        assert!(rec.cell("2").is_none());
        assert_eq!(rec.entity_key(), "acme");
    }

    // ── SummaryTable ──────────────────────────────────────────────────────────

    #[test]
    fn test_summary_total_row_is_column_sum() {
        let table = SummaryTable::new(
            vec![day("1"), day("2")],
            vec![
                AggregatedRow {
                    label: "A".to_string(),
                    values: vec![1.0, 2.0],
                },
                AggregatedRow {
                    label: "B".to_string(),
                    values: vec![10.0, 20.0],
                },
            ],
        );
        let total = table.total_row();
        assert_eq!(total.label, TOTAL_ROW_LABEL);
        assert_eq!(total.values, vec![11.0, 22.0]);
        assert_eq!(total.month_total(), 33.0);
        assert_eq!(table.grand_total(), 33.0);
    }

    #[test]
    fn test_summary_rows_end_with_total() {
        let table = SummaryTable::new(
            vec![day("1")],
            vec![AggregatedRow::zeroed("A", 1), AggregatedRow::zeroed("B", 1)],
        );
        let rows = table.rows();
        let labels: Vec<&str> = rows.iter().map(SummaryRow::label).collect();
        assert_eq!(labels, vec!["A", "B", TOTAL_ROW_LABEL]);
        assert!(matches!(rows.last(), Some(SummaryRow::Total(_))));
    }

    #[test]
    fn test_summary_pads_short_rows() {
        let table = SummaryTable::new(
            vec![day("1"), day("2"), day("3")],
            vec![AggregatedRow {
                label: "A".to_string(),
                values: vec![4.0],
            }],
        );
        assert_eq!(table.categories()[0].values, vec![4.0, 0.0, 0.0]);
    }

    #[test]
    fn test_summary_category_lookup_uses_key() {
        let table = SummaryTable::new(vec![], vec![AggregatedRow::zeroed("지게차", 0)]);
        assert!(table.category(" 지 게 차").is_some());
        assert!(table.category("남").is_none());
    }

    // ── MetricSpec ────────────────────────────────────────────────────────────

    #[test]
    fn test_metric_parse_label_and_keywords() {
        let m: MetricSpec = "인원 = 남, 여 ,지게차".parse().unwrap();
        assert_eq!(m.label, "인원");
        assert_eq!(m.keywords, vec!["남", "여", "지게차"]);
    }

    #[test]
    fn test_metric_parse_bare_label() {
        let m: MetricSpec = "출고".parse().unwrap();
        assert_eq!(m.keywords, vec!["출고"]);
    }

    #[test]
    fn test_metric_parse_rejects_empty() {
        assert!("=".parse::<MetricSpec>().is_err());
        assert!("label=".parse::<MetricSpec>().is_err());
        assert!("=a,b".parse::<MetricSpec>().is_err());
    }

    #[test]
    fn test_metric_matches_ignores_spaces_and_case() {
        let m = MetricSpec::new("출고", &["출 고"]);
        assert!(m.matches("B2C 출고 수량"));
        assert!(!m.matches("입고"));
        let m = MetricSpec::new("Out", &["out"]);
        assert!(m.matches("OUTBOUND"));
    }

    #[test]
    fn test_empty_summary_has_zero_total() {
        let table = SummaryTable::new(vec![day("1"), day("2")], vec![]);
        assert!(table.is_empty());
        assert_eq!(table.total_row().values, vec![0.0, 0.0]);
        assert_eq!(table.rows().len(), 1);
    }

    #[test]
    fn test_total_row_month_total_is_grand_total() {
        let table = SummaryTable::new(
            vec![day("1"), day("2")],
            vec![
                AggregatedRow {
                    label: "A".to_string(),
                    values: vec![0.1, 0.1],
                },
                AggregatedRow {
                    label: "B".to_string(),
                    values: vec![0.2, 0.3],
                },
            ],
        );
        assert_eq!(
            table.total_row().month_total().to_bits(),
            table.grand_total().to_bits()
        );
    }
}
