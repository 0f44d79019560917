use std::sync::OnceLock;

use regex::Regex;

use crate::error::ParseError;
use crate::models::Cell;

fn leading_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?(?:\d+(?:\.\d*)?|\.\d+)").expect("valid amount regex"))
}

/// Parse an amount written with either US (`1,234.56`) or European/Latin
/// (`1.234,56`) separators. Currency symbols and spaces are ignored.
pub fn parse_amount(raw: &str) -> Result<f64, ParseError> {
    if raw.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();
    let normalized = normalize_separators(&leading_sign(&cleaned));
    leading_number()
        .find(&normalized)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParseError::Amount(raw.to_string()))
}

/// Lossy form of [`parse_amount`]: anything unparseable becomes `0`.
pub fn amount_or_zero(raw: &str) -> f64 {
    parse_amount(raw).unwrap_or(0.0)
}

/// Signed amount from a sheet cell. Numeric cells are taken as-is.
pub fn amount_from_cell(cell: &Cell) -> Result<f64, ParseError> {
    match cell {
        Cell::Number(n) if n.is_finite() => Ok(*n),
        Cell::Number(n) => Err(ParseError::Amount(n.to_string())),
        Cell::Text(s) => parse_amount(s),
        Cell::Empty => Err(ParseError::Empty),
    }
}

/// Move a trailing minus (`25.000-`, common in Latin American exports) to the
/// front so grouping and sign read the same as `-25.000`.
fn leading_sign(s: &str) -> String {
    let body = s.trim_end_matches('-');
    if body.len() == s.len() || body.starts_with('-') {
        body.to_string()
    } else {
        format!("-{body}")
    }
}

/// Rewrite `s` (digits, `.`, `,` and `-` only) so that `.` is the sole
/// decimal separator and no grouping marks remain.
fn normalize_separators(s: &str) -> String {
    let last_dot = s.rfind('.');
    let last_comma = s.rfind(',');

    match (last_dot, last_comma) {
        (Some(d), Some(c)) => {
            let (decimal, group) = if c > d { (',', '.') } else { ('.', ',') };
            keep_last_as_decimal(&s.replace(group, ""), decimal)
        }
        (None, Some(_)) => {
            if s.matches(',').count() > 1 {
                s.replace(',', "")
            } else {
                s.replace(',', ".")
            }
        }
        (Some(d), None) => {
            if s.matches('.').count() > 1 || is_single_group(s, d) {
                s.replace('.', "")
            } else {
                s.to_string()
            }
        }
        (None, None) => s.to_string(),
    }
}

/// `25.000` and `-1.500` read as thousands groups; `0.500` stays a fraction.
fn is_single_group(s: &str, dot: usize) -> bool {
    let int_part = s[..dot].trim_start_matches('-');
    let frac_part = &s[dot + 1..];
    frac_part.len() == 3
        && frac_part.chars().all(|c| c.is_ascii_digit())
        && !int_part.is_empty()
        && int_part.chars().all(|c| c.is_ascii_digit())
        && !int_part.trim_start_matches('0').is_empty()
}

fn keep_last_as_decimal(s: &str, decimal: char) -> String {
    let Some(pos) = s.rfind(decimal) else {
        return s.to_string();
    };
    let mut out: String = s[..pos].chars().filter(|&c| c != decimal).collect();
    out.push('.');
    out.push_str(&s[pos + decimal.len_utf8()..]);
    out
}
