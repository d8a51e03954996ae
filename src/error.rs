//! Error types for the bracken-matrix library.

use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum BrackenError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot derive a sample id from file name '{name}': missing '.' delimiter")]
    BadFileName { name: String },

    #[error("Malformed row at {file}:{line}: expected at least {expected} fields, found {found}")]
    RowLayout {
        file: String,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Invalid {field} value '{value}' at {file}:{line}")]
    InvalidNumber {
        field: &'static str,
        value: String,
        file: String,
        line: usize,
    },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, BrackenError>;
