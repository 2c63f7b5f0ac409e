// ⚠️ Input Errors - rejections raised by the entry form and the editable grid
//
// Everything else in the crate travels as anyhow::Error; these are the cases
// the user can fix by typing something else.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EntryError {
    #[error("amount must be at least 0.01 (got {0:.2})")]
    AmountTooSmall(f64),

    #[error("invalid amount: {0:?}")]
    InvalidAmount(String),

    #[error("invalid date: {0:?} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("unknown category: {0:?}")]
    UnknownCategory(String),

    #[error("unknown transaction type: {0:?}")]
    UnknownType(String),

    #[error("unknown month: {0:?}")]
    UnknownMonth(String),

    #[error("no row at position {0}")]
    NoSuchRow(usize),
}
