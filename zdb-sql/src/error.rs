use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unexpected token {found:?} at {line}:{column}")]
    UnexpectedToken {
        found: String,
        line: usize,
        column: usize,
    },
    #[error("invalid syntax: {0}")]
    InvalidSyntax(String),
    #[error("integer literal out of range: {literal}")]
    IntegerOverflow { literal: String },
    #[error("column index {index} not present in row")]
    ColumnNotFound { index: usize },
    #[error(transparent)]
    Storage(#[from] zdb_storage::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
