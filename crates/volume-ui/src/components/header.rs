use chrono::{DateTime, Local};
use ratatui::text::{Line, Span};

use crate::themes::Theme;

/// Decoration placed either side of the application title.
pub const ACCENT: &str = "▪ ▫ ▪";

/// Board header rendering four lines:
///
/// 1. Application title with accents.
/// 2. A 60-column `=` separator.
/// 3. `[ 2026-01 | source | updated 09:30:00 ]`, plus an error marker when
///    the last refresh failed.
/// 4. An empty line.
pub struct Header<'a> {
    pub year: i32,
    pub month: u32,
    /// Where the table comes from (sheet or file name).
    pub source: &'a str,
    /// Time of the last successful fetch.
    pub fetched_at: Option<DateTime<Local>>,
    /// Message of the last failed refresh.
    pub error: Option<&'a str>,
    pub theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(year: i32, month: u32, source: &'a str, theme: &'a Theme) -> Self {
        Self {
            year,
            month,
            source,
            fetched_at: None,
            error: None,
            theme,
        }
    }

    pub fn fetched_at(mut self, at: Option<DateTime<Local>>) -> Self {
        self.fetched_at = at;
        self
    }

    pub fn error(mut self, error: Option<&'a str>) -> Self {
        self.error = error;
        self
    }

    /// Render the header as exactly four lines.
    pub fn to_lines(&self) -> Vec<Line<'a>> {
        let separator = "=".repeat(60);
        let updated = self
            .fetched_at
            .map(|t| format!("updated {}", t.format("%H:%M:%S")))
            .unwrap_or_else(|| "waiting for data".to_string());

        let mut info = vec![
            Span::styled("[ ", self.theme.status_label),
            Span::styled(format!("{:04}-{:02}", self.year, self.month), self.theme.status_value),
            Span::styled(" | ", self.theme.status_label),
            Span::styled(self.source.to_string(), self.theme.status_value),
            Span::styled(" | ", self.theme.status_label),
            Span::styled(updated, self.theme.muted),
            Span::styled(" ]", self.theme.status_label),
        ];
        if let Some(err) = self.error {
            info.push(Span::styled(format!("  ! {err}"), self.theme.stale));
        }

        vec![
            Line::from(vec![
                Span::styled(ACCENT, self.theme.title_accent),
                Span::styled(" DAILY VOLUME BOARD ", self.theme.title),
                Span::styled(ACCENT, self.theme.title_accent),
            ]),
            Line::from(Span::styled(separator, self.theme.rule)),
            Line::from(info),
            Line::from(""),
        ]
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_header_to_lines_count() {
        let theme = Theme::dark();
        let lines = Header::new(2026, 1, "sheet", &theme).to_lines();
        assert_eq!(lines.len(), 4, "header must produce exactly 4 lines");
        assert!(text(&lines[3]).is_empty());
    }

    #[test]
    fn test_header_title_line_content() {
        let theme = Theme::dark();
        let lines = Header::new(2026, 1, "sheet", &theme).to_lines();
        let title = text(&lines[0]);
        assert!(title.contains("DAILY VOLUME BOARD"), "got: {title}");
        assert!(title.starts_with(ACCENT));
    }

    #[test]
    fn test_header_separator_line() {
        let theme = Theme::dark();
        let lines = Header::new(2026, 1, "sheet", &theme).to_lines();
        let sep = text(&lines[1]);
        assert_eq!(sep.chars().count(), 60);
        assert!(sep.chars().all(|c| c == '='));
    }

    #[test]
    fn test_header_info_line_month_and_source() {
        let theme = Theme::dark();
        let lines = Header::new(2026, 3, "sheet \"구글 데이터\"", &theme).to_lines();
        let info = text(&lines[2]);
        assert!(info.contains("2026-03"), "got: {info}");
        assert!(info.contains("구글 데이터"), "got: {info}");
        assert!(info.contains("waiting for data"), "got: {info}");
    }

    #[test]
    fn test_header_shows_refresh_time() {
        let theme = Theme::dark();
        let at = Local.with_ymd_and_hms(2026, 3, 4, 9, 30, 5).single();
        let lines = Header::new(2026, 3, "x.csv", &theme).fetched_at(at).to_lines();
        assert!(text(&lines[2]).contains("updated 09:30:05"));
    }

    #[test]
    fn test_header_error_marker() {
        let theme = Theme::dark();
        let plain = Header::new(2026, 3, "x.csv", &theme).to_lines();
        assert_eq!(plain[2].spans.len(), 7);

        let failed = Header::new(2026, 3, "x.csv", &theme)
            .error(Some("HTTP 500"))
            .to_lines();
        assert_eq!(failed[2].spans.len(), 8);
        assert!(text(&failed[2]).ends_with("! HTTP 500"));
    }
}
