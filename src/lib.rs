//! Spreadsheet bank-statement import: find the header, parse locale-dependent
//! amounts and dates, categorize descriptions and drop repeated rows.

pub mod amount;
pub mod categorizer;
pub mod dates;
pub mod db;
pub mod dedupe;
pub mod error;
pub mod fmt;
pub mod header;
pub mod importer;
pub mod mapping;
pub mod models;
pub mod normalizer;
pub mod settings;
pub mod sheet;
