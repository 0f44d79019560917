//! Import session: a sheet goes in, deduplicated candidate transactions come
//! out, and `save_to_ledger` hands them to the SQLite ledger.

use std::collections::BTreeMap;
use std::path::Path;

use rusqlite::Connection;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::categorizer::CategoryDictionary;
use crate::dedupe::dedupe;
use crate::error::{ExtractoError, Result};
use crate::header::locate_header;
use crate::mapping::ColumnMapping;
use crate::models::{CandidateTransaction, Cell, HeaderInfo};
use crate::normalizer::normalize_row;
use crate::sheet::{read_grid, Grid};

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Serialize)]
pub struct ImportReport {
    pub candidates: Vec<CandidateTransaction>,
    /// Data rows below the header that were looked at.
    pub rows_read: usize,
    /// Rejected rows keyed by cause (`amount`, `description`, `date`).
    pub rejected: BTreeMap<&'static str, usize>,
    /// Rows dropped because an identical candidate came earlier in the file.
    pub duplicates: usize,
}

impl ImportReport {
    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }
}

#[derive(Debug)]
pub struct ImportSession {
    rows: Grid,
    header: HeaderInfo,
}

impl ImportSession {
    pub fn open(file_path: &Path, sheet: Option<&str>, max_scan: usize) -> Result<Self> {
        let rows = read_grid(file_path, sheet)?;
        Self::from_grid(rows, max_scan)
    }

    pub fn from_grid(rows: Grid, max_scan: usize) -> Result<Self> {
        if rows.iter().all(|row| row.iter().all(Cell::is_blank)) {
            return Err(ExtractoError::EmptySheet);
        }
        let header = locate_header(&rows, max_scan);
        Ok(Self { rows, header })
    }

    /// Replace the inferred document year, e.g. from `--year`.
    pub fn with_document_year(mut self, year: i32) -> Self {
        self.header.document_year = year;
        self
    }

    pub fn header(&self) -> &HeaderInfo {
        &self.header
    }

    /// Non-blank rows below the header, paired with their 1-based file row.
    pub fn data_rows(&self) -> impl Iterator<Item = (usize, &[Cell])> {
        self.rows
            .iter()
            .enumerate()
            .skip(self.header.header_row_index + 1)
            .filter(|(_, row)| !row.iter().all(Cell::is_blank))
            .map(|(i, row)| (i + 1, row.as_slice()))
    }

    pub fn normalize(&self, mapping: &ColumnMapping, dictionary: &CategoryDictionary) -> Result<ImportReport> {
        let resolved = mapping.resolve(&self.header.headers)?;
        let mut report = ImportReport::default();
        let mut accepted = Vec::new();

        for (line, row) in self.data_rows() {
            report.rows_read += 1;
            let mapped = resolved.extract(row);
            match normalize_row(&mapped, dictionary, self.header.document_year) {
                Ok(txn) => accepted.push(txn),
                Err(rejection) => {
                    debug!(row = line, reason = rejection.reason(), error = %rejection, "row rejected");
                    *report.rejected.entry(rejection.reason()).or_default() += 1;
                }
            }
        }

        let before = accepted.len();
        report.candidates = dedupe(accepted);
        report.duplicates = before - report.candidates.len();

        info!(
            rows = report.rows_read,
            candidates = report.candidates.len(),
            rejected = report.rejected_total(),
            duplicates = report.duplicates,
            "sheet normalized"
        );
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Ledger hand-off
// ---------------------------------------------------------------------------

#[derive(Debug, Default, PartialEq)]
pub struct SaveResult {
    pub imported: usize,
    pub skipped: usize,
    pub duplicate_file: bool,
}

pub fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

fn is_duplicate_row(conn: &Connection, txn: &CandidateTransaction) -> Result<bool> {
    let mut stmt = conn.prepare_cached(
        "SELECT 1 FROM transactions WHERE date = ?1 AND description = ?2 AND amount = ?3 AND type = ?4",
    )?;
    Ok(stmt.exists(rusqlite::params![txn.date, txn.description, txn.amount, txn.kind.as_str()])?)
}

/// Store candidates from `file_path`. A file whose checksum was already
/// imported is refused as a whole; rows already in the ledger are skipped.
pub fn save_to_ledger(
    conn: &Connection,
    file_path: &Path,
    candidates: &[CandidateTransaction],
) -> Result<SaveResult> {
    let checksum = compute_checksum(file_path)?;
    {
        let mut stmt = conn.prepare("SELECT 1 FROM imports WHERE checksum = ?1")?;
        if stmt.exists([&checksum])? {
            info!(file = %file_path.display(), "file already imported");
            return Ok(SaveResult {
                duplicate_file: true,
                ..SaveResult::default()
            });
        }
    }

    let tx = conn.unchecked_transaction()?;
    let min_date = candidates.iter().map(|t| t.date.as_str()).min();
    let max_date = candidates.iter().map(|t| t.date.as_str()).max();
    tx.execute(
        "INSERT INTO imports (filename, record_count, date_range_start, date_range_end, checksum) VALUES (?1, 0, ?2, ?3, ?4)",
        rusqlite::params![
            file_path.file_name().and_then(|n| n.to_str()).unwrap_or(""),
            min_date,
            max_date,
            checksum,
        ],
    )?;
    let import_id = tx.last_insert_rowid();

    let mut result = SaveResult::default();
    for txn in candidates {
        if is_duplicate_row(&tx, txn)? {
            debug!(date = %txn.date, description = %txn.description, "already in ledger");
            result.skipped += 1;
            continue;
        }
        tx.execute(
            "INSERT INTO transactions (type, description, amount, category, date, import_id) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![txn.kind.as_str(), txn.description, txn.amount, txn.category, txn.date, import_id],
        )?;
        result.imported += 1;
    }

    tx.execute(
        "UPDATE imports SET record_count = ?1 WHERE id = ?2",
        rusqlite::params![result.imported as i64, import_id],
    )?;
    tx.commit()?;

    info!(imported = result.imported, skipped = result.skipped, "ledger updated");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, init_db};
    use crate::header::DEFAULT_SCAN_ROWS;
    use crate::models::TxnType;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    fn write_statement(dir: &Path, name: &str, rows: &[(&str, &str, &str)]) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut content = String::from("Banco de Prueba\nPeriodo: enero 2024\nFecha,Descripcion,Monto\n");
        for (date, desc, amt) in rows {
            content.push_str(&format!("{date},{desc},\"{amt}\"\n"));
        }
        std::fs::write(&path, &content).unwrap();
        path
    }

    fn mapping() -> ColumnMapping {
        ColumnMapping::new("Fecha", "Descripcion", "Monto")
    }

    fn normalize_file(path: &Path) -> ImportReport {
        ImportSession::open(path, None, DEFAULT_SCAN_ROWS)
            .unwrap()
            .normalize(&mapping(), &CategoryDictionary::builtin())
            .unwrap()
    }

    #[test]
    fn test_session_locates_header_and_year() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_statement(dir.path(), "stmt.csv", &[("10/01", "Uber viaje", "-25.000")]);
        let session = ImportSession::open(&path, None, DEFAULT_SCAN_ROWS).unwrap();
        assert_eq!(session.header().header_row_index, 2);
        assert_eq!(session.header().document_year, 2024);
        assert_eq!(session.data_rows().count(), 1);
    }

    #[test]
    fn test_end_to_end_candidate() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_statement(dir.path(), "stmt.csv", &[("10/01", "Uber viaje", "-25.000")]);
        let report = normalize_file(&path);
        assert_eq!(
            report.candidates,
            vec![CandidateTransaction {
                description: "Uber viaje".to_string(),
                amount: 25000.0,
                date: "2024-01-10".to_string(),
                kind: TxnType::Expense,
                category: "Transporte".to_string(),
            }]
        );
    }

    #[test]
    fn test_report_counts_rejections_and_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_statement(dir.path(), "stmt.csv", &[
            ("10/01", "Uber viaje", "-25.000"),
            ("10/01", "Uber viaje", "-25.000"),
            ("11/01", "Sin monto", "0"),
            ("12/01", "", "-5.000"),
            ("someday", "Rappi", "-9.000"),
            ("13/01", "Netflix", "38.900"),
        ]);
        let report = normalize_file(&path);
        assert_eq!(report.rows_read, 6);
        assert_eq!(report.candidates.len(), 2);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.rejected.get("amount"), Some(&1));
        assert_eq!(report.rejected.get("description"), Some(&1));
        assert_eq!(report.rejected.get("date"), Some(&1));
        assert_eq!(report.rejected_total(), 3);
    }

    #[test]
    fn test_year_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_statement(dir.path(), "stmt.csv", &[("10/01", "Uber", "-1")]);
        let report = ImportSession::open(&path, None, DEFAULT_SCAN_ROWS)
            .unwrap()
            .with_document_year(2019)
            .normalize(&mapping(), &CategoryDictionary::builtin())
            .unwrap();
        assert_eq!(report.candidates[0].date, "2019-01-10");
    }

    #[test]
    fn test_unknown_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_statement(dir.path(), "stmt.csv", &[("10/01", "Uber", "-1")]);
        let session = ImportSession::open(&path, None, DEFAULT_SCAN_ROWS).unwrap();
        let err = session
            .normalize(&ColumnMapping::new("Fecha", "Detalle", "Monto"), &CategoryDictionary::builtin())
            .unwrap_err();
        assert!(matches!(err, ExtractoError::UnknownColumn { field: "description", .. }));
    }

    #[test]
    fn test_empty_sheet_is_an_error() {
        assert!(matches!(
            ImportSession::from_grid(Vec::new(), DEFAULT_SCAN_ROWS),
            Err(ExtractoError::EmptySheet)
        ));
        let blank = vec![Vec::new(), vec![Cell::Empty, Cell::from("  ")]];
        assert!(matches!(
            ImportSession::from_grid(blank, DEFAULT_SCAN_ROWS),
            Err(ExtractoError::EmptySheet)
        ));
    }

    #[test]
    fn test_blank_rows_count_as_file_rows_but_are_not_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.csv");
        std::fs::write(
            &path,
            "Banco de Prueba\n\nPeriodo 2024\n,,\nFecha,Descripcion,Monto\n10/01,Uber,-1.000\n\n,,\n11/01,Rappi,-2.000\n",
        )
        .unwrap();
        let session = ImportSession::open(&path, None, DEFAULT_SCAN_ROWS).unwrap();
        assert_eq!(session.header().header_row_index, 4);
        let lines: Vec<usize> = session.data_rows().map(|(line, _)| line).collect();
        assert_eq!(lines, vec![6, 9]);

        let report = session.normalize(&mapping(), &CategoryDictionary::builtin()).unwrap();
        assert_eq!(report.rows_read, 2);
        assert_eq!(report.candidates.len(), 2);
        assert_eq!(report.rejected_total(), 0);
    }

    #[test]
    fn test_scan_window_counts_blank_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late_header.csv");
        std::fs::write(&path, "Banco\n\n\n\nFecha,Descripcion,Monto\n10/01,Uber,-1\n").unwrap();
        let session = ImportSession::open(&path, None, 3).unwrap();
        assert_eq!(session.header().header_row_index, 0);
        let session = ImportSession::open(&path, None, 5).unwrap();
        assert_eq!(session.header().header_row_index, 4);
    }

    #[test]
    fn test_save_inserts_transactions() {
        let (dir, conn) = test_db();
        let path = write_statement(dir.path(), "stmt.csv", &[
            ("10/01", "Uber viaje", "-25.000"),
            ("30/01", "Pago nomina", "3.500.000"),
        ]);
        let report = normalize_file(&path);
        let result = save_to_ledger(&conn, &path, &report.candidates).unwrap();
        assert_eq!(result, SaveResult { imported: 2, skipped: 0, duplicate_file: false });

        let (kind, category): (String, String) = conn
            .query_row("SELECT type, category FROM transactions WHERE description = 'Pago nomina'", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap();
        assert_eq!(kind, "income");
        assert_eq!(category, "Salario");
    }

    #[test]
    fn test_save_detects_file_duplicate() {
        let (dir, conn) = test_db();
        let path = write_statement(dir.path(), "stmt.csv", &[("10/01", "Uber viaje", "-25.000")]);
        let report = normalize_file(&path);
        let r1 = save_to_ledger(&conn, &path, &report.candidates).unwrap();
        assert_eq!(r1.imported, 1);
        let r2 = save_to_ledger(&conn, &path, &report.candidates).unwrap();
        assert!(r2.duplicate_file);
        assert_eq!(r2.imported, 0);
    }

    #[test]
    fn test_save_skips_rows_already_in_ledger() {
        let (dir, conn) = test_db();
        let first = write_statement(dir.path(), "enero.csv", &[
            ("10/01", "Uber viaje", "-25.000"),
            ("11/01", "Rappi", "-18.000"),
        ]);
        save_to_ledger(&conn, &first, &normalize_file(&first).candidates).unwrap();

        let second = write_statement(dir.path(), "enero_v2.csv", &[
            ("11/01", "Rappi", "-18.000"),
            ("12/01", "Cine", "-15.000"),
        ]);
        let r2 = save_to_ledger(&conn, &second, &normalize_file(&second).candidates).unwrap();
        assert_eq!(r2.imported, 1);
        assert_eq!(r2.skipped, 1);
    }

    #[test]
    fn test_save_records_batch() {
        let (dir, conn) = test_db();
        let path = write_statement(dir.path(), "stmt.csv", &[
            ("15/01", "Uber", "-1.000"),
            ("03/01", "Rappi", "-2.000"),
        ]);
        save_to_ledger(&conn, &path, &normalize_file(&path).candidates).unwrap();
        let (count, start, end): (i64, String, String) = conn
            .query_row(
                "SELECT record_count, date_range_start, date_range_end FROM imports LIMIT 1",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(start, "2024-01-03");
        assert_eq!(end, "2024-01-15");
    }
}
