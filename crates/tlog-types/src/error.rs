//! Error types for decoding log data in tlog-types.

use thiserror::Error;

/// Errors that can occur when decoding log records, headers, or dates.
///
/// Record and header decoding from fixed-size arrays never fails; these
/// errors come from slice-based decoding and from date handling.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The input slice is shorter than the fixed layout requires.
    #[error("Insufficient bytes: expected {expected}, got {actual}")]
    InsufficientBytes { expected: usize, actual: usize },

    /// A year/month/day triple or date string is not a calendar date.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Any other malformed input.
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type alias using tlog-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
