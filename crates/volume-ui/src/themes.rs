use ratatui::style::{Color, Modifier, Style};

/// Terminal background, as far as `COLORFGBG` tells us.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackgroundType {
    Dark,
    Light,
}

/// Read the background slot of `COLORFGBG` (`"fg;bg"`, or `"fg;default;bg"`).
/// ANSI 0..=6 counts as dark. Missing or unparseable means dark.
pub fn detect_background() -> BackgroundType {
    std::env::var("COLORFGBG")
        .ok()
        .and_then(|val| val.rsplit(';').next().and_then(|bg| bg.parse::<u8>().ok()))
        .map_or(BackgroundType::Dark, |bg| {
            if bg <= 6 {
                BackgroundType::Dark
            } else {
                BackgroundType::Light
            }
        })
}

/// The handful of colours a theme is derived from.
#[derive(Debug, Clone, Copy)]
struct Palette {
    accent: Color,
    highlight: Color,
    ink: Color,
    soft: Color,
    faint: Color,
    cursor_fg: Color,
    alert: Color,
    caution: Color,
    bold: bool,
}

/// Styles for each part of the board: title bar, status line, sidebar and
/// the day grids.
#[derive(Debug, Clone)]
pub struct Theme {
    // title bar
    pub title: Style,
    pub title_accent: Style,
    pub rule: Style,

    // status line
    pub status_label: Style,
    pub status_value: Style,
    pub muted: Style,
    /// Marker shown when the snapshot carries a fetch error.
    pub stale: Style,
    /// Empty-month and waiting notices.
    pub notice: Style,

    // sidebar and panes
    pub body: Style,
    pub cursor: Style,
    pub border: Style,

    // day grids
    pub grid_header: Style,
    pub day_row: Style,
    pub day_row_alt: Style,
    pub month_total: Style,
}

impl Theme {
    fn from_palette(p: Palette) -> Self {
        let strong = |style: Style| {
            if p.bold {
                style.add_modifier(Modifier::BOLD)
            } else {
                style
            }
        };

        Self {
            title: strong(Style::default().fg(p.accent)),
            title_accent: Style::default().fg(p.highlight),
            rule: Style::default().fg(p.faint),

            status_label: Style::default().fg(p.soft),
            status_value: strong(Style::default().fg(p.ink)),
            muted: Style::default().fg(p.faint),
            stale: strong(Style::default().fg(p.alert)),
            notice: Style::default().fg(p.caution),

            body: Style::default().fg(p.ink),
            cursor: strong(Style::default().fg(p.cursor_fg).bg(p.accent)),
            border: Style::default().fg(p.faint),

            grid_header: strong(Style::default().fg(p.accent)),
            day_row: Style::default().fg(p.ink),
            day_row_alt: Style::default().fg(p.soft),
            month_total: strong(Style::default().fg(p.highlight)),
        }
    }

    /// Default theme for dark terminals.
    pub fn dark() -> Self {
        Self::from_palette(Palette {
            accent: Color::Cyan,
            highlight: Color::Yellow,
            ink: Color::White,
            soft: Color::Gray,
            faint: Color::DarkGray,
            cursor_fg: Color::Black,
            alert: Color::Red,
            caution: Color::Yellow,
            bold: true,
        })
    }

    pub fn light() -> Self {
        Self::from_palette(Palette {
            accent: Color::Blue,
            highlight: Color::Magenta,
            ink: Color::Black,
            soft: Color::DarkGray,
            faint: Color::Gray,
            cursor_fg: Color::White,
            alert: Color::Red,
            caution: Color::Magenta,
            bold: true,
        })
    }

    /// Plain 8-colour ANSI, no bold.
    pub fn classic() -> Self {
        Self::from_palette(Palette {
            accent: Color::White,
            highlight: Color::Green,
            ink: Color::White,
            soft: Color::White,
            faint: Color::DarkGray,
            cursor_fg: Color::Black,
            alert: Color::Red,
            caution: Color::Yellow,
            bold: false,
        })
    }

    pub fn auto_detect() -> Self {
        match detect_background() {
            BackgroundType::Light => Self::light(),
            BackgroundType::Dark => Self::dark(),
        }
    }

    /// `light`, `dark` or `classic`; anything else auto-detects.
    pub fn from_name(name: &str) -> Self {
        match name {
            "light" => Self::light(),
            "dark" => Self::dark(),
            "classic" => Self::classic(),
            _ => Self::auto_detect(),
        }
    }

    /// Zebra striping for day rows.
    pub fn row_style(&self, index: usize) -> Style {
        if index % 2 == 0 {
            self.day_row
        } else {
            self.day_row_alt
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
