//! Cell normalization: any raw sheet cell → a finite `f64`.
//!
//! Operator-entered cells carry thousands separators, placeholder tokens,
//! appended units and stray notes. Normalization never fails; anything that
//! does not yield a number counts as zero.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::CellValue;

/// Case-insensitive tokens that mean "no data".
pub const PLACEHOLDERS: &[&str] = &["", "-", "none", "nan"];

/// How a minus sign directly in front of the first numeric run is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignPolicy {
    /// Only the digit run is read; `"-5"` → `5.0`.
    #[default]
    Unsigned,
    /// A `-` immediately before the run negates it; `"-5"` → `-5.0`.
    Signed,
}

/// First maximal run of ASCII digits with at most one decimal point.
fn first_numeric_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[0-9]+(?:\.[0-9]*)?|\.[0-9]+").expect("regex is valid"))
}

/// Converts cells to numbers under a fixed [`SignPolicy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    pub sign: SignPolicy,
}

impl Normalizer {
    pub fn new(sign: SignPolicy) -> Self {
        Self { sign }
    }

    /// Normalize one cell. Total: never panics, never returns NaN or ±∞.
    pub fn normalize(&self, cell: &CellValue) -> f64 {
        match cell {
            CellValue::Empty => 0.0,
            CellValue::Number(n) if !n.is_finite() => 0.0,
            CellValue::Number(n) => match self.sign {
                SignPolicy::Unsigned => n.abs(),
                SignPolicy::Signed => *n,
            },
            CellValue::Text(text) => self.normalize_text(text),
        }
    }

    /// Normalize a textual cell.
    pub fn normalize_text(&self, text: &str) -> f64 {
        let trimmed = text.trim();
        if is_placeholder(trimmed) {
            return 0.0;
        }

        let cleaned = trimmed.replace(',', "");
        let Some(run) = first_numeric_run().find(&cleaned) else {
            return 0.0;
        };

        let value: f64 = match run.as_str().parse() {
            Ok(v) => v,
            Err(_) => return 0.0,
        };
        if !value.is_finite() {
            return 0.0;
        }

        let negated = self.sign == SignPolicy::Signed && cleaned[..run.start()].ends_with('-');
        if negated {
            -value
        } else {
            value
        }
    }
}

/// `true` for blank cells and the "no data" tokens, ignoring case.
pub fn is_placeholder(trimmed: &str) -> bool {
    PLACEHOLDERS
        .iter()
        .any(|token| trimmed.eq_ignore_ascii_case(token))
}

/// Normalize with the default ([`SignPolicy::Unsigned`]) policy.
///
/// # Examples
///
/// ```
/// use volume_core::models::CellValue;
/// use volume_core::normalize::normalize;
///
/// assert_eq!(normalize(&CellValue::from("1,234")), 1234.0);
/// assert_eq!(normalize(&CellValue::from("12명 (확정)")), 12.0);
/// assert_eq!(normalize(&CellValue::from("None")), 0.0);
/// assert_eq!(normalize(&CellValue::Empty), 0.0);
/// ```
pub fn normalize(cell: &CellValue) -> f64 {
    Normalizer::default().normalize(cell)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
