use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    import_date TEXT DEFAULT (datetime('now')),
    record_count INTEGER,
    date_range_start TEXT,
    date_range_end TEXT,
    checksum TEXT
);

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY,
    type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
    description TEXT NOT NULL,
    amount REAL NOT NULL CHECK (amount > 0),
    category TEXT NOT NULL,
    date TEXT NOT NULL,
    import_id INTEGER,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (import_id) REFERENCES imports(id)
);

CREATE INDEX IF NOT EXISTS idx_transactions_identity
    ON transactions (date, description, amount, type);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Row count and the income/expense totals currently in the ledger.
pub fn ledger_totals(conn: &Connection) -> Result<(i64, f64, f64)> {
    let totals = conn.query_row(
        "SELECT count(*),
                COALESCE(SUM(CASE WHEN type = 'income' THEN amount END), 0),
                COALESCE(SUM(CASE WHEN type = 'expense' THEN amount END), 0)
         FROM transactions",
        [],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;
    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &["transactions", "imports"] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        init_db(&conn).unwrap();
    }

    #[test]
    fn test_transactions_reject_non_positive_amounts() {
        let (_dir, conn) = test_db();
        let res = conn.execute(
            "INSERT INTO transactions (type, description, amount, category, date) VALUES ('expense', 'x', -5, 'Otros', '2024-01-01')",
            [],
        );
        assert!(res.is_err());
    }

    #[test]
    fn test_transactions_reject_unknown_type() {
        let (_dir, conn) = test_db();
        let res = conn.execute(
            "INSERT INTO transactions (type, description, amount, category, date) VALUES ('transfer', 'x', 5, 'Otros', '2024-01-01')",
            [],
        );
        assert!(res.is_err());
    }

    #[test]
    fn test_ledger_totals() {
        let (_dir, conn) = test_db();
        assert_eq!(ledger_totals(&conn).unwrap(), (0, 0.0, 0.0));
        conn.execute_batch(
            "INSERT INTO transactions (type, description, amount, category, date) VALUES ('income', 'Nomina', 1000, 'Salario', '2024-01-30');
             INSERT INTO transactions (type, description, amount, category, date) VALUES ('expense', 'Uber', 25, 'Transporte', '2024-01-10');
             INSERT INTO transactions (type, description, amount, category, date) VALUES ('expense', 'Exito', 75, 'Mercado', '2024-01-11');",
        )
        .unwrap();
        assert_eq!(ledger_totals(&conn).unwrap(), (3, 1000.0, 100.0));
    }
}
