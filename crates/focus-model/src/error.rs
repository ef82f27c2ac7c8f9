use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("duplicate column in table: {0}")]
    DuplicateColumn(String),
    #[error("column {column} has {actual} rows, expected {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        actual: usize,
    },
    #[error("duplicate mapping target: {0}")]
    DuplicateTarget(String),
    #[error("invalid operand: {0}")]
    InvalidOperand(String),
    #[error("{0}")]
    Message(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
