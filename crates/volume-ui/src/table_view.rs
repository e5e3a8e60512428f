//! Table widgets for the home and per-company views.
//!
//! Summary tables are drawn transposed: one row per day-column, one column
//! per category, a daily-total column on the right and a highlighted
//! `Month total` row at the bottom. Column widths are measured with
//! `unicode-width` so Hangul labels line up.

use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use volume_core::formatting::format_quantity;
use volume_core::models::{SummaryTable, TOTAL_ROW_LABEL};
use volume_data::analysis::HomeSummary;

use crate::themes::Theme;

/// Label of the bottom row of a transposed summary table.
pub const MONTH_TOTAL_LABEL: &str = "Month total";

/// Label of the bottom row of the home table.
pub const ALL_ENTITIES_LABEL: &str = "All companies";

const MIN_COLUMN_WIDTH: u16 = 4;

// ── Grid model ────────────────────────────────────────────────────────────────

/// Fully formatted cells of a table, ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub header: Vec<String>,
    pub body: Vec<Vec<String>>,
    pub footer: Vec<String>,
}

impl Grid {
    /// Display width of every column: the widest cell, at least
    /// `MIN_COLUMN_WIDTH`.
    pub fn column_widths(&self) -> Vec<u16> {
        let mut widths = vec![MIN_COLUMN_WIDTH; self.header.len()];
        let all_rows = std::iter::once(&self.header)
            .chain(self.body.iter())
            .chain(std::iter::once(&self.footer));
        for row in all_rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                let cell_width = u16::try_from(UnicodeWidthStr::width(cell.as_str())).unwrap_or(u16::MAX);
                *w = (*w).max(cell_width);
            }
        }
        widths
    }
}

/// Transpose a [`SummaryTable`] into one row per day-column.
pub fn summary_grid(table: &SummaryTable) -> Grid {
    let categories = table.categories();
    let total = table.total_row();

    let mut header = Vec::with_capacity(categories.len() + 2);
    header.push("Day".to_string());
    header.extend(categories.iter().map(|c| c.label.clone()));
    header.push(TOTAL_ROW_LABEL.to_string());

    let body = table
        .columns()
        .iter()
        .enumerate()
        .map(|(d, column)| {
            let mut row = Vec::with_capacity(header.len());
            row.push(column.label.clone());
            row.extend(categories.iter().map(|c| format_quantity(c.values[d])));
            row.push(format_quantity(total.values[d]));
            row
        })
        .collect();

    let mut footer = Vec::with_capacity(header.len());
    footer.push(MONTH_TOTAL_LABEL.to_string());
    footer.extend(categories.iter().map(|c| format_quantity(c.month_total())));
    footer.push(format_quantity(total.month_total()));

    Grid {
        header,
        body,
        footer,
    }
}

/// One row per company, one column per metric, totals at the bottom.
pub fn home_grid(summary: &HomeSummary) -> Grid {
    let mut header = vec!["Company".to_string()];
    header.extend(summary.metrics.iter().map(|m| m.label.clone()));

    let body = summary
        .rows
        .iter()
        .map(|row| {
            std::iter::once(row.entity.clone())
                .chain(row.values.iter().map(|v| format_quantity(*v)))
                .collect()
        })
        .collect();

    let footer = std::iter::once(ALL_ENTITIES_LABEL.to_string())
        .chain(summary.totals().into_iter().map(format_quantity))
        .collect();

    Grid {
        header,
        body,
        footer,
    }
}

// ── Rendering ─────────────────────────────────────────────────────────────────

/// Render `grid` as a bordered table titled `title`.
///
/// `selected` highlights one body row (the home view cursor).
pub fn render_grid(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    grid: &Grid,
    selected: Option<usize>,
    theme: &Theme,
) {
    let header = Row::new(
        grid.header
            .iter()
            .map(|h| Cell::from(h.clone()).style(theme.grid_header)),
    )
    .height(1);

    let mut rows: Vec<Row> = grid
        .body
        .iter()
        .enumerate()
        .map(|(i, cells)| {
            let style = if selected == Some(i) {
                theme.cursor
            } else {
                theme.row_style(i)
            };
            Row::new(cells.iter().map(|c| Cell::from(c.clone()))).style(style)
        })
        .collect();
    rows.push(Row::new(grid.footer.iter().map(|c| Cell::from(c.clone()))).style(theme.month_total));

    let widths: Vec<Constraint> = grid
        .column_widths()
        .into_iter()
        .map(Constraint::Length)
        .collect();

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(2)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border)
                .title(format!(" {} ", title)),
        )
        .style(theme.body);

    frame.render_widget(table, area);
}

/// Home table.
pub fn render_home_table(
    frame: &mut Frame,
    area: Rect,
    summary: &HomeSummary,
    selected: Option<usize>,
    theme: &Theme,
) {
    render_grid(frame, area, "Companies", &home_grid(summary), selected, theme);
}

/// One transposed summary table.
pub fn render_summary_table(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    table: &SummaryTable,
    theme: &Theme,
) {
    render_grid(frame, area, title, &summary_grid(table), None, theme);
}

/// Placeholder shown before the first table arrives or when the month has
/// no day-columns.
pub fn render_no_data(frame: &mut Frame, area: Rect, message: &str, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(message.to_string(), theme.notice)),
        Line::from(""),
        Line::from(Span::styled(
            "Use ←/→ to change month, 'r' to refresh.",
            theme.muted,
        )),
        Line::from(Span::styled("Press 'q' or Ctrl+C to exit", theme.muted)),
    ];
    frame.render_widget(
        Paragraph::new(ratatui::text::Text::from(text)).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Volume Board "),
        ),
        area,
    );
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use volume_core::models::{AggregatedRow, DayColumn, MetricSpec};
    use volume_data::analysis::EntitySummary;

    fn summary() -> SummaryTable {
        let columns: Vec<DayColumn> = ["2026-01-01", "2026-01-02"]
            .iter()
            .filter_map(|l| DayColumn::parse(l))
            .collect();
        SummaryTable::new(
            columns,
            vec![
                AggregatedRow {
                    label: "B2C 출고".to_string(),
                    values: vec![1200.0, 800.0],
                },
                AggregatedRow {
                    label: "입고".to_string(),
                    values: vec![0.0, 5.0],
                },
            ],
        )
    }

    fn home() -> HomeSummary {
        HomeSummary {
            metrics: MetricSpec::defaults(),
            rows: vec![
                EntitySummary {
                    entity: "에이스".to_string(),
                    values: vec![2000.0, 5.0, 13.0],
                },
                EntitySummary {
                    entity: "베타".to_string(),
                    values: vec![30.0, 0.0, 2.0],
                },
            ],
        }
    }

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    // ── summary_grid ──────────────────────────────────────────────────────────

    #[test]
    fn test_summary_grid_is_transposed() {
        let grid = summary_grid(&summary());
        assert_eq!(grid.header, vec!["Day", "B2C 출고", "입고", TOTAL_ROW_LABEL]);
        assert_eq!(grid.body.len(), 2);
        assert_eq!(grid.body[0], vec!["2026-01-01", "1,200", "-", "1,200"]);
        assert_eq!(grid.body[1], vec!["2026-01-02", "800", "5", "805"]);
        assert_eq!(grid.footer, vec![MONTH_TOTAL_LABEL, "2,000", "5", "2,005"]);
    }

    #[test]
    fn test_summary_grid_without_categories() {
        let columns = vec![DayColumn::parse("1").unwrap()];
        let grid = summary_grid(&SummaryTable::new(columns, vec![]));
        assert_eq!(grid.header, vec!["Day", TOTAL_ROW_LABEL]);
        assert_eq!(grid.body, vec![vec!["1".to_string(), "-".to_string()]]);
        assert_eq!(grid.footer, vec![MONTH_TOTAL_LABEL, "-"]);
    }

    // ── home_grid ─────────────────────────────────────────────────────────────

    #[test]
    fn test_home_grid_rows_and_totals() {
        let grid = home_grid(&home());
        assert_eq!(grid.header, vec!["Company", "출고", "입고", "인원"]);
        assert_eq!(grid.body[1], vec!["베타", "30", "-", "2"]);
        assert_eq!(grid.footer, vec![ALL_ENTITIES_LABEL, "2,030", "5", "15"]);
    }

    // ── column_widths ─────────────────────────────────────────────────────────

    #[test]
    fn test_column_widths_count_wide_glyphs() {
        let grid = Grid {
            header: vec!["구분".to_string(), "x".to_string()],
            body: vec![vec!["화주사명".to_string(), "123456".to_string()]],
            footer: vec!["a".to_string(), "b".to_string()],
        };
        // Hangul syllables are two columns wide.
        assert_eq!(grid.column_widths(), vec![8, 6]);
    }

    #[test]
    fn test_column_widths_minimum() {
        let grid = Grid {
            header: vec!["d".to_string()],
            body: vec![],
            footer: vec!["-".to_string()],
        };
        assert_eq!(grid.column_widths(), vec![MIN_COLUMN_WIDTH]);
    }

    // ── Render ────────────────────────────────────────────────────────────────

    #[test]
    fn test_render_summary_table_shows_month_total() {
        let mut terminal = Terminal::new(TestBackend::new(100, 12)).unwrap();
        let theme = Theme::dark();
        let table = summary();

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_summary_table(frame, area, "Volume", &table, &theme);
            })
            .unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains(MONTH_TOTAL_LABEL));
        assert!(text.contains("2,005"));
        assert!(text.contains("2026-01-02"));
    }

    #[test]
    fn test_render_home_table_with_selection() {
        let mut terminal = Terminal::new(TestBackend::new(80, 10)).unwrap();
        let theme = Theme::light();
        let summary = home();

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_home_table(frame, area, &summary, Some(1), &theme);
            })
            .unwrap();

        assert!(buffer_text(&terminal).contains("2,030"));
    }

    #[test]
    fn test_render_tiny_area_does_not_panic() {
        let mut terminal = Terminal::new(TestBackend::new(10, 3)).unwrap();
        let theme = Theme::classic();
        let table = summary();
        terminal
            .draw(|frame| {
                let area = frame.area();
                render_summary_table(frame, area, "Volume", &table, &theme);
            })
            .unwrap();
    }

    #[test]
    fn test_render_no_data_does_not_panic() {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let theme = Theme::dark();
        terminal
            .draw(|frame| {
                let area = frame.area();
                render_no_data(frame, area, "No data for 2026-07", &theme);
            })
            .unwrap();
        assert!(buffer_text(&terminal).contains("No data for 2026-07"));
    }
}
