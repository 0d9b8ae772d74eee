// Parsing, statistics and number formatting helpers.
//
// CSV cells arrive as loose strings; everything past the loader works with
// typed values and calls into the formatting helpers only for presentation.
use num_format::{Locale, ToFormattedString};

use crate::error::DataError;

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in CSV exports.
///
/// - Trims whitespace.
/// - Strips thousands separators like `","` before parsing.
/// - Accepts scientific notation (`4.5e13`), which spreadsheet exports use
///   for large currency amounts.
/// - Returns `None` for empty cells, text, and non-finite results.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let s = s.replace(',', "");
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => None,
    }
}

pub fn parse_i32_safe(s: Option<&str>) -> Option<i32> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<i32>().ok()
}

/// Arithmetic mean, or `None` for an empty slice so callers pick their own
/// fallback instead of silently getting zero.
pub fn mean(v: &[f64]) -> Option<f64> {
    if v.is_empty() {
        return None;
    }
    let sum: f64 = v.iter().copied().sum();
    Some(sum / v.len() as f64)
}

/// `numerator / denominator`, or `None` when the denominator is zero or the
/// quotient is not finite.
pub fn safe_ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    let q = numerator / denominator;
    q.is_finite().then_some(q)
}

/// Passes `value` through, or names `quantity` in a `DataError` when it has
/// overflowed to infinity or become NaN.
pub fn ensure_finite(quantity: &'static str, value: f64) -> Result<f64, DataError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DataError::NonFinite { quantity, value })
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals with locale-aware thousands separators (`1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: u64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

/// `52.0` → `"52.0%"`.
pub fn format_pct(percentage: f64) -> String {
    format!("{}%", format_number(percentage, 1))
}

pub fn format_payback(years: Option<u32>) -> String {
    match years {
        Some(1) => "1 year".to_string(),
        Some(y) => format!("{} years", y),
        None => "not reached".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentages_keep_one_decimal() {
        assert_eq!(format_pct(52.0), "52.0%");
        assert_eq!(format_pct(1234.56), "1,234.6%");
    }

    #[test]
    fn ensure_finite_names_the_quantity() {
        assert_eq!(ensure_finite("total", 1.5), Ok(1.5));
        assert!(matches!(
            ensure_finite("total", f64::INFINITY),
            Err(DataError::NonFinite { quantity: "total", .. })
        ));
        assert!(ensure_finite("total", f64::NAN).is_err());
    }

    #[test]
    fn parse_f64_handles_separators_and_exponents() {
        assert_eq!(parse_f64_safe(Some(" 1,234.5 ")), Some(1234.5));
        assert_eq!(parse_f64_safe(Some("4.5e13")), Some(4.5e13));
        assert_eq!(parse_f64_safe(Some("")), None);
        assert_eq!(parse_f64_safe(Some("n/a")), None);
        assert_eq!(parse_f64_safe(Some("inf")), None);
        assert_eq!(parse_f64_safe(None), None);
    }

    #[test]
    fn mean_of_empty_slice_is_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[2.0, 2.5, 1.5]), Some(2.0));
    }

    #[test]
    fn safe_ratio_rejects_zero_denominator() {
        assert_eq!(safe_ratio(10.0, 0.0), None);
        assert_eq!(safe_ratio(10.0, 4.0), Some(2.5));
    }

    #[test]
    fn format_number_inserts_separators() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-1500.0, 0), "-1,500");
        assert_eq!(format_number(0.0, 1), "0.0");
        assert_eq!(format_int(47_000_000u64), "47,000,000");
    }

    #[test]
    fn payback_labels() {
        assert_eq!(format_payback(Some(1)), "1 year");
        assert_eq!(format_payback(Some(3)), "3 years");
        assert_eq!(format_payback(None), "not reached");
    }
}
