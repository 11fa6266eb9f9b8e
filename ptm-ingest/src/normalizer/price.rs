//! Monetary amount cleanup
//!
//! Legacy exports mix `$` signs, spaces, both decimal conventions and the
//! occasional `!` typed in place of `1`.

use super::RawValue;

/// Canonical amount for a raw value; `None` when it cannot be read
///
/// Numbers pass through unchanged. Non-finite values are rejected.
pub fn clean_price(value: Option<&RawValue>) -> Option<f64> {
    match value? {
        RawValue::Integer(n) => Some(*n as f64),
        RawValue::Number(n) => n.is_finite().then_some(*n),
        RawValue::Text(text) => clean_price_str(text),
    }
}

/// Canonical amount for a text field
///
/// Steps run in this order:
/// 1. trim; empty means `None`
/// 2. `!` becomes `1`
/// 3. spaces and `$` are removed
/// 4. separators: with both `.` and `,`, whichever comes last is the decimal
///    point and the other is dropped; a lone `,` is a decimal point
/// 5. parse
pub fn clean_price_str(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let cleaned = trimmed.replace('!', "1").replace([' ', '$'], "");

    let canonical = match (cleaned.rfind('.'), cleaned.rfind(',')) {
        (Some(dot), Some(comma)) if dot > comma => cleaned.replace(',', ""),
        (Some(_), Some(_)) => cleaned.replace('.', "").replace(',', "."),
        (None, Some(_)) => cleaned.replace(',', "."),
        _ => cleaned,
    };

    canonical.parse::<f64>().ok().filter(|amount| amount.is_finite())
}
