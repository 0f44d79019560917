//! Header row detection and document-year inference.
//!
//! Bank exports often start with a few metadata rows (account holder, period,
//! generation date) before the real column labels. The header is the first row
//! that mentions a date or description column; the rows above it are searched
//! for the statement year, which completes dates written as `DD/MM`.

use std::sync::OnceLock;

use chrono::{Datelike, Local};
use regex::Regex;
use tracing::debug;

use crate::categorizer::fold;
use crate::dates::excel_serial_to_date;
use crate::models::{Cell, HeaderInfo};

pub const DEFAULT_SCAN_ROWS: usize = 20;

const HEADER_MARKERS: &[&str] = &["fecha", "date", "descripcion", "description"];

/// Serial numbers in this open range fall roughly between 2017 and 2064.
const SERIAL_YEAR_RANGE: (f64, f64) = (43000.0, 60000.0);
const PLAUSIBLE_YEARS: std::ops::RangeInclusive<i32> = 2000..=2100;

fn year_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"20\d{2}").expect("valid year regex"))
}

/// Locate the header row, falling back to the current calendar year when the
/// metadata rows do not state one.
pub fn locate_header(rows: &[Vec<Cell>], max_scan: usize) -> HeaderInfo {
    locate_header_with_default(rows, max_scan, Local::now().year())
}

pub fn locate_header_with_default(rows: &[Vec<Cell>], max_scan: usize, default_year: i32) -> HeaderInfo {
    let found = rows.iter().take(max_scan).position(|row| is_header_row(row));
    let header_row_index = found.unwrap_or(0);
    if found.is_none() {
        debug!(max_scan, "no header markers found, using first row");
    }

    let headers = rows
        .get(header_row_index)
        .map(|row| header_labels(row))
        .unwrap_or_default();

    let document_year = infer_year(&rows[..header_row_index.min(rows.len())]).unwrap_or(default_year);
    debug!(header_row_index, document_year, columns = headers.len(), "header located");

    HeaderInfo {
        header_row_index,
        headers,
        document_year,
    }
}

fn is_header_row(row: &[Cell]) -> bool {
    row.iter().any(|cell| {
        let text = fold(&cell.text());
        HEADER_MARKERS.iter().any(|m| text.contains(m))
    })
}

/// Header labels; blank cells get a positional name so they stay addressable.
fn header_labels(row: &[Cell]) -> Vec<String> {
    row.iter()
        .enumerate()
        .map(|(i, cell)| {
            let label = cell.text();
            if label.is_empty() {
                format!("Column {}", i + 1)
            } else {
                label
            }
        })
        .collect()
}

/// Year stated in the metadata rows. Per row, a textual `20xx` wins over a
/// serial date cell; the first row that yields either ends the search.
fn infer_year(metadata: &[Vec<Cell>]) -> Option<i32> {
    for row in metadata {
        let joined = row.iter().map(Cell::text).collect::<Vec<_>>().join(" ");
        if let Some(m) = year_token().find(&joined) {
            if let Ok(year) = m.as_str().parse() {
                return Some(year);
            }
        }

        let serial_year = row.iter().find_map(|cell| match cell {
            Cell::Number(n) if *n > SERIAL_YEAR_RANGE.0 && *n < SERIAL_YEAR_RANGE.1 => {
                excel_serial_to_date(*n)
                    .map(|d| d.year())
                    .filter(|y| PLAUSIBLE_YEARS.contains(y))
            }
            _ => None,
        });
        if serial_year.is_some() {
            return serial_year;
        }
    }
    None
}
