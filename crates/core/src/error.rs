//! Error types for rvnmet

use thiserror::Error;

/// Main error type for rvnmet operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid projection '{id}': {reason}")]
    InvalidProjection { id: String, reason: String },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Column '{0}' is not numeric")]
    NotNumeric(String),

    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("Column length mismatch for '{column}': expected {expected}, got {actual}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("Parse error at line {line}, column '{column}': cannot read '{value}' ({reason})")]
    Parse {
        line: usize,
        column: String,
        value: String,
        reason: String,
    },
}

/// Result type alias for rvnmet operations
pub type Result<T> = std::result::Result<T, Error>;
