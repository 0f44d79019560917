//! Column mapping: which sheet header feeds which transaction field.
//!
//! A `ColumnMapping` names headers. It is resolved once against the located
//! header row into column indices, after which rows are read as `MappedRow`
//! values keyed by field rather than by header text.

use serde::{Deserialize, Serialize};

use crate::error::{ExtractoError, Result};
use crate::models::Cell;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub date: String,
    pub description: String,
    pub amount: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl ColumnMapping {
    pub fn new(date: &str, description: &str, amount: &str) -> Self {
        Self {
            date: date.to_string(),
            description: description.to_string(),
            amount: amount.to_string(),
            category: None,
            kind: None,
        }
    }

    pub fn with_category(mut self, header: &str) -> Self {
        self.category = Some(header.to_string());
        self
    }

    pub fn with_type(mut self, header: &str) -> Self {
        self.kind = Some(header.to_string());
        self
    }

    /// Resolve header names to column positions. Header comparison ignores
    /// surrounding whitespace; the first matching column wins.
    pub fn resolve(&self, headers: &[String]) -> Result<ResolvedMapping> {
        let find = |field: &'static str, name: &str| -> Result<usize> {
            position(headers, name).ok_or_else(|| ExtractoError::UnknownColumn {
                field,
                column: name.to_string(),
            })
        };
        let optional = |field: &'static str, name: &Option<String>| -> Result<Option<usize>> {
            match name.as_deref().map(str::trim) {
                None | Some("") => Ok(None),
                Some(n) => find(field, n).map(Some),
            }
        };

        Ok(ResolvedMapping {
            date: find("date", &self.date)?,
            description: find("description", &self.description)?,
            amount: find("amount", &self.amount)?,
            category: optional("category", &self.category)?,
            kind: optional("type", &self.kind)?,
        })
    }
}

fn position(headers: &[String], name: &str) -> Option<usize> {
    let name = name.trim();
    headers.iter().position(|h| h.trim() == name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedMapping {
    pub date: usize,
    pub description: usize,
    pub amount: usize,
    pub category: Option<usize>,
    pub kind: Option<usize>,
}

impl ResolvedMapping {
    /// Pull the mapped cells out of a raw row. Short rows yield `Cell::Empty`.
    pub fn extract(&self, row: &[Cell]) -> MappedRow {
        let cell = |idx: usize| row.get(idx).cloned().unwrap_or(Cell::Empty);
        MappedRow {
            date: cell(self.date),
            description: cell(self.description),
            amount: cell(self.amount),
            category: self.category.map(cell),
            kind: self.kind.map(cell),
        }
    }
}

/// One sheet row reduced to the fields the pipeline understands.
/// `category` and `kind` are `None` when the column is not mapped at all.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedRow {
    pub date: Cell,
    pub description: Cell,
    pub amount: Cell,
    pub category: Option<Cell>,
    pub kind: Option<Cell>,
}

impl MappedRow {
    pub fn new(date: impl Into<Cell>, description: impl Into<Cell>, amount: impl Into<Cell>) -> Self {
        Self {
            date: date.into(),
            description: description.into(),
            amount: amount.into(),
            category: None,
            kind: None,
        }
    }

    pub fn with_category(mut self, cell: impl Into<Cell>) -> Self {
        self.category = Some(cell.into());
        self
    }

    pub fn with_type(mut self, cell: impl Into<Cell>) -> Self {
        self.kind = Some(cell.into());
        self
    }
}
