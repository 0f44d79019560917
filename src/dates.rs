use std::sync::OnceLock;

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::error::ParseError;
use crate::models::Cell;

fn day_month_year() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{1,2})[/-](\d{1,2})[/-](\d{2,4})$").expect("valid date regex")
    })
}

fn day_month() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,2})[/-](\d{1,2})$").expect("valid date regex"))
}

const FALLBACK_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y"];
const FALLBACK_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Serial numbers past this are far beyond any statement date.
const MAX_SERIAL: f64 = 2_958_466.0; // 9999-12-31

/// Convert a spreadsheet serial date. The epoch is 1899-12-30, which absorbs
/// the 1900 leap-year bug; the fractional part (time of day) is dropped.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(0.0..=MAX_SERIAL).contains(&serial) {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_days(Days::new(serial.floor() as u64))
}

/// Normalize a date cell to `YYYY-MM-DD`. Numeric cells are serial dates;
/// text is read day-first, with `document_year` completing `DD/MM` dates.
pub fn normalize_date(cell: &Cell, document_year: i32) -> Result<String, ParseError> {
    match cell {
        Cell::Number(n) => excel_serial_to_date(*n)
            .map(iso)
            .ok_or_else(|| ParseError::Date(n.to_string())),
        Cell::Text(s) => normalize_date_str(s, document_year),
        Cell::Empty => Err(ParseError::Empty),
    }
}

pub fn normalize_date_str(raw: &str, document_year: i32) -> Result<String, ParseError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(ParseError::Empty);
    }
    let invalid = || ParseError::Date(raw.to_string());

    if let Some(caps) = day_month_year().captures(s) {
        let day: u32 = caps[1].parse().map_err(|_| invalid())?;
        let month: u32 = caps[2].parse().map_err(|_| invalid())?;
        let mut year: i32 = caps[3].parse().map_err(|_| invalid())?;
        if year < 100 {
            year += 2000;
        }
        return NaiveDate::from_ymd_opt(year, month, day).map(iso).ok_or_else(invalid);
    }

    if let Some(caps) = day_month().captures(s) {
        let day: u32 = caps[1].parse().map_err(|_| invalid())?;
        let month: u32 = caps[2].parse().map_err(|_| invalid())?;
        return NaiveDate::from_ymd_opt(document_year, month, day)
            .map(iso)
            .ok_or_else(invalid);
    }

    parse_generic(s).map(iso).ok_or_else(invalid)
}

fn parse_generic(s: &str) -> Option<NaiveDate> {
    for fmt in FALLBACK_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }
    for fmt in FALLBACK_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// True when `s` is a canonical `YYYY-MM-DD` calendar date.
pub fn is_iso_date(s: &str) -> bool {
    s.len() == 10 && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}
