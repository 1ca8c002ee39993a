//! Number formatting for story text.
//!
//! Currency amounts follow the `ru-RU` convention: digits grouped in threes
//! with a no-break space, a comma before the fraction, at most three
//! fraction digits and no trailing zeros. Area and rate are printed as plain
//! shortest decimals.

/// Thousands separator used by the `ru-RU` locale.
pub const GROUP_SEPARATOR: char = '\u{a0}';

/// Format an amount with `ru-RU` grouping, e.g. `4139500` → `4 139 500`.
///
/// Non-finite values format as `0`.
pub fn format_grouped(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }

    let rounded = format!("{:.3}", value.abs());
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut out = String::new();
    let is_zero = int_part.chars().all(|c| c == '0') && frac_part.is_empty();
    if value.is_sign_negative() && !is_zero {
        out.push('-');
    }

    let digits: Vec<char> = int_part.chars().collect();
    for (i, ch) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(GROUP_SEPARATOR);
        }
        out.push(*ch);
    }

    if !frac_part.is_empty() {
        out.push(',');
        out.push_str(frac_part);
    }
    out
}

/// Shortest decimal form: `51.29`, `15`, `0`.
pub fn format_plain(value: f64) -> String {
    if !value.is_finite() || value == 0.0 {
        return "0".to_string();
    }
    value.to_string()
}
