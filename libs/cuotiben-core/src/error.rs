//! Error types for cuotiben-core.

use thiserror::Error;

/// Result type alias using ValidationError.
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Errors raised when checking AI-produced payloads before they are stored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: expected 4 options, found {found}")]
    WrongOptionCount { field: &'static str, found: usize },

    #[error("{field}: correct index {index} is out of range")]
    CorrectIndexOutOfRange { field: &'static str, index: u8 },

    #[error("{field}: target character is empty")]
    EmptyTargetChar { field: &'static str },

    #[error("{field}: line index {index} is out of range for {lines} lines")]
    LineIndexOutOfRange {
        field: &'static str,
        index: usize,
        lines: usize,
    },

    #[error("{field}: compared words are empty")]
    EmptyComparedWords { field: &'static str },

    #[error("missing {0}")]
    MissingField(&'static str),
}
