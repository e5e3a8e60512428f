/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use volume_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let negative = value < 0.0;
    let abs_value = value.abs();

    // Nudge by an epsilon at the target precision so exact midpoints round up.
    let factor = 10_f64.powi(decimals as i32);
    let epsilon = f64::EPSILON * abs_value * factor;
    let rounded = ((abs_value * factor) + epsilon).round() / factor;

    let integer_part = rounded.trunc() as u64;
    let frac_part = rounded - rounded.trunc();

    let grouped = group_thousands(&integer_part.to_string());

    let result = if decimals == 0 {
        grouped
    } else {
        let frac_str = format!("{:.prec$}", frac_part, prec = decimals as usize);
        // `frac_str` looks like "0.50"; keep ".50".
        format!("{}{}", grouped, &frac_str[1..])
    };

    if negative && result.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", result)
    } else {
        result
    }
}

/// Display form of an aggregated quantity.
///
/// Zero renders as a dash; whole numbers get thousands grouping; fractional
/// values keep one decimal place, or three below 0.05 so a small non-zero
/// quantity never reads as "0.0". Anything under 0.0005 shows as "<0.001".
/// This is a presentation rule only: the normalizer and aggregator always
/// work with a real `0.0`.
///
/// # Examples
///
/// ```
/// use volume_core::formatting::format_quantity;
///
/// assert_eq!(format_quantity(0.0), "-");
/// assert_eq!(format_quantity(1234.0), "1,234");
/// assert_eq!(format_quantity(2.5), "2.5");
/// assert_eq!(format_quantity(0.004), "0.004");
/// ```
pub fn format_quantity(value: f64) -> String {
    let magnitude = value.abs();
    if !value.is_finite() || magnitude < 1e-9 {
        return "-".to_string();
    }
    if magnitude < 0.0005 {
        return if value > 0.0 { "<0.001" } else { ">-0.001" }.to_string();
    }
    if value.fract().abs() < 1e-9 {
        format_number(value, 0)
    } else if magnitude < 0.05 {
        format_number(value, 3)
    } else {
        format_number(value, 1)
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
