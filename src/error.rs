//! Error types for scanning, tree building and value-graph conversion.
//!
//! Every operation in this crate is fail-fast: the first error ends the whole
//! top-level call (a scan, a `new`, a `fill`, a marshal) and is handed back to
//! the caller. Nothing is retried.
//!
//! ## Error Categories
//!
//! - **Scanner errors**: [`Error::InvalidCodePoint`] and [`Error::MismatchedIndent`]
//!   are fatal for the scan that produced them, with line/column information
//! - **Shape errors**: [`Error::UnsupportedShape`] when a value kind outside
//!   integer, string, sequence, record or reference is met
//! - **Scalar errors**: [`Error::MalformedScalar`] when leaf text does not parse
//!   as the destination kind
//! - **Graph errors**: [`Error::UnknownLabel`] and [`Error::DepthLimit`]
//!
//! ## Examples
//!
//! ```rust
//! use serde_teff::{tokenize, Error};
//!
//! let result = tokenize("a\n    b\n  c\n");
//! assert!(matches!(result, Err(Error::MismatchedIndent { line: 3, .. })));
//! ```

use crate::model::Label;
use std::fmt;
use thiserror::Error;

/// Represents all possible errors produced by this crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// A decoding-failure marker or a disallowed control character was read.
    #[error("Invalid code point {ch:?} at line {line}, column {col}")]
    InvalidCodePoint { line: usize, col: usize, ch: char },

    /// The indentation of a line matches no open nesting level.
    #[error("Mismatched indent at line {line}: {indent:?} matches no open indentation level")]
    MismatchedIndent { line: usize, indent: String },

    /// Indented text with no parent line to nest under.
    #[error("Unexpected indent at line {line}: no parent line to nest under")]
    UnexpectedIndent { line: usize },

    /// A value kind the converter cannot represent.
    #[error("Unsupported shape: {0}")]
    UnsupportedShape(String),

    /// Leaf text that cannot be parsed as the destination scalar kind.
    #[error("Malformed scalar: expected {expected}, found {found:?}")]
    MalformedScalar { expected: String, found: String },

    /// A back-reference to a label that was never registered.
    #[error("Unknown label {0}")]
    UnknownLabel(Label),

    /// Recursion went deeper than the configured limit.
    #[error("Nesting deeper than {limit} levels")]
    DepthLimit { limit: usize },

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates an invalid code point error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_teff::Error;
    ///
    /// let err = Error::invalid_code_point(3, 7, '\u{1}');
    /// assert!(err.to_string().contains("line 3, column 7"));
    /// ```
    pub fn invalid_code_point(line: usize, col: usize, ch: char) -> Self {
        Error::InvalidCodePoint { line, col, ch }
    }

    /// Creates a mismatched indent error for the measured indent string.
    pub fn mismatched_indent(line: usize, indent: &str) -> Self {
        Error::MismatchedIndent {
            line,
            indent: indent.to_string(),
        }
    }

    /// Creates an unsupported shape error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_teff::Error;
    ///
    /// let err = Error::unsupported_shape("f64");
    /// assert_eq!(err.to_string(), "Unsupported shape: f64");
    /// ```
    pub fn unsupported_shape(msg: &str) -> Self {
        Error::UnsupportedShape(msg.to_string())
    }

    /// Creates a malformed scalar error.
    pub fn malformed_scalar(expected: &str, found: &str) -> Self {
        Error::MalformedScalar {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for reading/writing failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// Returns `true` for the errors that terminate a scan.
    #[must_use]
    pub const fn is_fatal_scan(&self) -> bool {
        matches!(
            self,
            Error::InvalidCodePoint { .. } | Error::MismatchedIndent { .. }
        )
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_positions() {
        let err = Error::mismatched_indent(4, " ");
        assert_eq!(
            err.to_string(),
            "Mismatched indent at line 4: \" \" matches no open indentation level"
        );
        assert!(err.is_fatal_scan());
    }

    #[test]
    fn test_non_fatal_kinds() {
        assert!(!Error::unsupported_shape("f64").is_fatal_scan());
        assert!(!Error::malformed_scalar("integer", "x").is_fatal_scan());
    }
}
