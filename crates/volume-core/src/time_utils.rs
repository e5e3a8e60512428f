use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;
use tracing::warn;

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

/// Parse an IANA name, falling back to UTC with a warning.
pub fn resolve_timezone(tz_name: &str) -> Tz {
    tz_name.parse::<Tz>().unwrap_or_else(|_| {
        warn!("unrecognised timezone \"{}\", falling back to UTC", tz_name);
        Tz::UTC
    })
}

/// `true` when `tz_name` is a known IANA timezone.
pub fn validate_timezone(tz_name: &str) -> bool {
    tz_name.parse::<Tz>().is_ok()
}

// ── Report month helpers ──────────────────────────────────────────────────────

/// `(year, month)` of `now` as seen from `tz_name`.
pub fn year_month_at(now: DateTime<Utc>, tz_name: &str) -> (i32, u32) {
    let local = now.with_timezone(&resolve_timezone(tz_name));
    (local.year(), local.month())
}

/// `(year, month)` of the current instant in `tz_name`.
pub fn current_year_month(tz_name: &str) -> (i32, u32) {
    year_month_at(Utc::now(), tz_name)
}

/// Step a `(year, month)` pair by `delta` months, wrapping across years.
///
/// # Examples
///
/// ```
/// use volume_core::time_utils::shift_month;
///
/// assert_eq!(shift_month(2026, 1, -1), (2025, 12));
/// assert_eq!(shift_month(2026, 12, 1), (2027, 1));
/// ```
pub fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + (month as i32 - 1) + delta;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
