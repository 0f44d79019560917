use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractoError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "xlsx")]
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("Could not read file: {0}")]
    UnreadableFile(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFile(String),

    #[error("Unknown sheet: {0}")]
    UnknownSheet(String),

    #[error("The file appears to be empty")]
    EmptySheet,

    #[error("Column '{column}' not found (mapped to {field})")]
    UnknownColumn { field: &'static str, column: String },

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ExtractoError>;

/// Why a single cell could not be turned into a field value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("empty value")]
    Empty,

    #[error("not a number: {0:?}")]
    Amount(String),

    #[error("not a date: {0:?}")]
    Date(String),
}
