use std::fmt;

use serde::{Deserialize, Serialize};

/// A single spreadsheet cell as handed over by the sheet reader.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    /// True for `Empty` and for text that is only whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
            Cell::Empty => true,
        }
    }

    /// Trimmed text content; numbers are rendered in their shortest form.
    pub fn text(&self) -> String {
        match self {
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) => n.to_string(),
            Cell::Empty => String::new(),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxnType {
    Income,
    Expense,
}

impl TxnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl fmt::Display for TxnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized, not-yet-persisted transaction produced by the import pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateTransaction {
    pub description: String,
    /// Always positive; the direction lives in `kind`.
    pub amount: f64,
    /// `YYYY-MM-DD`
    pub date: String,
    #[serde(rename = "type")]
    pub kind: TxnType,
    pub category: String,
}

/// Header row located in a sheet, plus the year stated in the metadata above it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderInfo {
    pub header_row_index: usize,
    pub headers: Vec<String>,
    pub document_year: i32,
}
