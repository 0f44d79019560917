//! Sheet readers: turn a CSV or spreadsheet file into a grid of cells.

use std::path::Path;

use tracing::debug;

use crate::error::{ExtractoError, Result};
use crate::models::Cell;

pub type Grid = Vec<Vec<Cell>>;

/// Read the first sheet (or `sheet`, when given) of a CSV/XLSX/XLS/ODS file.
///
/// Blank rows are kept, so grid index `i` is file row `i + 1`.
pub fn read_grid(file_path: &Path, sheet: Option<&str>) -> Result<Grid> {
    let ext = file_path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let grid = match ext.as_str() {
        "csv" | "txt" => read_csv(file_path)?,
        #[cfg(feature = "xlsx")]
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook(file_path, sheet)?,
        _ => return Err(ExtractoError::UnsupportedFile(file_path.display().to_string())),
    };
    #[cfg(not(feature = "xlsx"))]
    let _ = sheet;

    debug!(file = %file_path.display(), rows = grid.len(), "sheet loaded");
    Ok(grid)
}

/// Headerless, ragged CSV. Invalid UTF-8 is replaced rather than rejected,
/// since bank exports are often Latin-1.
pub fn read_csv(file_path: &Path) -> Result<Grid> {
    let data = std::fs::read(file_path)?;
    parse_csv_bytes(&data)
}

pub fn parse_csv_bytes(data: &[u8]) -> Result<Grid> {
    let delimiter = sniff_delimiter(data);
    let data = keep_empty_lines(data, delimiter);
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(data.as_slice());

    let mut grid: Grid = Vec::new();
    for result in rdr.byte_records() {
        let record = result?;
        grid.push(
            record
                .iter()
                .map(|field| Cell::from(String::from_utf8_lossy(field).as_ref()))
                .collect(),
        );
    }
    Ok(grid)
}

/// The csv reader drops empty lines. Give each one outside a quoted field a
/// lone delimiter so it comes back as a blank row.
fn keep_empty_lines(data: &[u8], delimiter: u8) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut in_quotes = false;
    let mut line_start = true;
    for (i, &b) in data.iter().enumerate() {
        let empty_line = b == b'\n' || (b == b'\r' && data.get(i + 1) == Some(&b'\n'));
        if line_start && !in_quotes && empty_line {
            out.push(delimiter);
        }
        if b == b'"' {
            in_quotes = !in_quotes;
        }
        line_start = b == b'\n';
        out.push(b);
    }
    out
}

const SNIFF_LINES: usize = 10;

/// Pick `,`, `;` or tab: the candidate found on the most sampled lines wins,
/// then the one with more occurrences. Title rows above the header carry no
/// delimiter at all and so do not sway the vote.
fn sniff_delimiter(data: &[u8]) -> u8 {
    let text = String::from_utf8_lossy(&data[..data.len().min(8192)]);
    let sample: Vec<&str> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();

    let mut best = (b',', 0usize, 0usize);
    for candidate in [b',', b';', b'\t'] {
        let counts = sample.iter().map(|line| line.bytes().filter(|&b| b == candidate).count());
        let lines = counts.clone().filter(|&n| n > 0).count();
        let total: usize = counts.sum();
        if (lines, total) > (best.1, best.2) {
            best = (candidate, lines, total);
        }
    }
    best.0
}

#[cfg(feature = "xlsx")]
fn read_workbook(file_path: &Path, sheet: Option<&str>) -> Result<Grid> {
    use calamine::{Data, Reader};

    let mut workbook = calamine::open_workbook_auto(file_path)
        .map_err(|e| ExtractoError::UnreadableFile(format!("{}: {e}", file_path.display())))?;

    let names = workbook.sheet_names();
    let name = match sheet {
        Some(wanted) => names
            .iter()
            .find(|n| n.as_str() == wanted)
            .cloned()
            .ok_or_else(|| ExtractoError::UnknownSheet(wanted.to_string()))?,
        None => names.first().cloned().ok_or(ExtractoError::EmptySheet)?,
    };

    let range = workbook.worksheet_range(&name)?;
    // The range starts at the first used row; keep the rows above it.
    let offset = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let mut grid: Grid = vec![Vec::new(); offset];
    for row in range.rows() {
        grid.push(
            row.iter()
                .map(|cell| match cell {
                    Data::Int(i) => Cell::Number(*i as f64),
                    Data::Float(f) => Cell::Number(*f),
                    Data::DateTime(dt) => Cell::Number(dt.as_f64()),
                    Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
                        Cell::from(s.as_str())
                    }
                    Data::Bool(b) => Cell::Text(b.to_string()),
                    Data::Error(_) | Data::Empty => Cell::Empty,
                })
                .collect(),
        );
    }
    Ok(grid)
}
