use thiserror::Error;

use crate::amount::amount_from_cell;
use crate::categorizer::{fold, CategoryDictionary};
use crate::dates::normalize_date;
use crate::error::ParseError;
use crate::mapping::MappedRow;
use crate::models::{CandidateTransaction, Cell, TxnType};

const INCOME_MARKERS: &[&str] = &["ingreso", "income", "abono", "deposito"];
const EXPENSE_MARKERS: &[&str] = &["gasto", "egreso", "compra", "retiro", "payment"];

/// Why a row did not become a candidate transaction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Rejection {
    #[error("amount: {0}")]
    Amount(ParseError),

    #[error("amount is zero")]
    ZeroAmount,

    #[error("description is empty")]
    EmptyDescription,

    #[error("date: {0}")]
    Date(ParseError),
}

impl Rejection {
    /// Short stable label for counting rejections by cause.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Amount(_) | Self::ZeroAmount => "amount",
            Self::EmptyDescription => "description",
            Self::Date(_) => "date",
        }
    }
}

/// Turn one mapped row into a candidate transaction.
///
/// The sign of the amount gives a first guess at the type; a category that
/// implies spending turns a positive amount into an expense (banks that export
/// debits as positive numbers), and an explicit type column overrides both.
pub fn normalize_row(
    row: &MappedRow,
    dictionary: &CategoryDictionary,
    document_year: i32,
) -> Result<CandidateTransaction, Rejection> {
    let signed = amount_from_cell(&row.amount).map_err(Rejection::Amount)?;
    let amount = signed.abs();
    if amount == 0.0 {
        return Err(Rejection::ZeroAmount);
    }

    let description = row.description.text();
    if description.is_empty() {
        return Err(Rejection::EmptyDescription);
    }

    let date = normalize_date(&row.date, document_year).map_err(Rejection::Date)?;

    let mut kind = if signed < 0.0 { TxnType::Expense } else { TxnType::Income };

    let category = match row.category.as_ref().filter(|c| !c.is_blank()) {
        Some(cell) => dictionary.normalize_category(&cell.text()),
        None => dictionary.categorize(&description),
    };

    let explicit = row.kind.as_ref().filter(|c| !c.is_blank());
    match explicit {
        None => {
            if kind == TxnType::Income && dictionary.infer_type(&category) == TxnType::Expense {
                kind = TxnType::Expense;
            }
        }
        Some(cell) => {
            if let Some(stated) = type_from_label(cell) {
                kind = stated;
            }
        }
    }

    Ok(CandidateTransaction {
        description,
        amount,
        date,
        kind,
        category,
    })
}

/// Read a type column value such as "Abono" or "Compra con tarjeta".
pub fn type_from_label(cell: &Cell) -> Option<TxnType> {
    let label = fold(&cell.text());
    if INCOME_MARKERS.iter().any(|m| label.contains(m)) {
        Some(TxnType::Income)
    } else if EXPENSE_MARKERS.iter().any(|m| label.contains(m)) {
        Some(TxnType::Expense)
    } else {
        None
    }
}
