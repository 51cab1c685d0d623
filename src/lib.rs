//! # serde_teff
//!
//! Serialization over a plain, indentation-structured text notation, in the
//! spirit of Python or YAML layout: nesting is expressed by how far a line is
//! indented, not by brackets.
//!
//! The crate has two independent layers:
//!
//! - **Scanning** ([`scan`], [`tree`]): the [`Scanner`] turns text into a flat
//!   stream of [`Token`]s with explicit `Indent`/`Unindent` tokens, validating
//!   whitespace and code points on the way. [`tree::parse`] builds the nested
//!   [`tree::TextNode`]s from that stream and [`tree::render`] writes them back.
//! - **Tree model** ([`model`]): [`model::new`] flattens a value graph (integers,
//!   strings, sequences, records and references, including shared and cyclic
//!   ones) into an ordered tree of labelled [`model::Node`]s, and [`model::fill`]
//!   rebuilds the graph, restoring shared references from labels.
//!
//! [`to_string`] and [`from_str`] combine scanning with a thin serde adapter
//! ([`marshal`]) for integers, strings and flat sequences of them.
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_teff::{from_str, to_string};
//!
//! let text = to_string(&vec!["alpha", "beta gamma"]).unwrap();
//! assert_eq!(text, "alpha\nbeta gamma\n");
//!
//! let back: Vec<String> = from_str(&text).unwrap();
//! assert_eq!(back, vec!["alpha", "beta gamma"]);
//! ```
//!
//! ### Tokens
//!
//! ```rust
//! use serde_teff::{tokenize, Token};
//!
//! let tokens = tokenize("a\n  b\n\n# note\n").unwrap();
//! assert_eq!(
//!     tokens,
//!     vec![
//!         Token::line("a"),
//!         Token::indent(),
//!         Token::line("b"),
//!         Token::unindent(),
//!         Token::annotation(" note"),
//!         Token::end_of_input(),
//!     ]
//! );
//! ```
//!
//! ### Shared structure
//!
//! ```rust
//! use serde_teff::model::{self, Graph, Label, Leaf, Value};
//!
//! let mut graph = Graph::new(Value::Ref(None));
//! let shared = graph.alloc(Value::from("twice"));
//! graph.root = Value::Seq(vec![Value::Ref(Some(shared)), Value::Ref(Some(shared))]);
//!
//! let list = model::new(&graph).unwrap();
//! assert_eq!(list[0].label, Some(Label::new(1)));
//! assert_eq!(list[1].leaf_value(), Some(&Leaf::Ref(Label::new(1))));
//! ```
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events and spans (model conversions at `debug`,
//! label bookkeeping at `trace`, scan failures at `debug`). It never installs a
//! subscriber.

pub mod error;
pub mod marshal;
pub mod model;
pub mod options;
pub mod scan;
pub mod tree;

pub use error::{Error, Result};
pub use options::{ModelOptions, RenderOptions, ScanOptions};
pub use scan::{tokenize, tokenize_with_options, Scanner, Token, TokenKind};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;

/// Serialize an integer, string or sequence of them to text.
///
/// # Examples
///
/// ```rust
/// use serde_teff::to_string;
///
/// assert_eq!(to_string(&42).unwrap(), "42\n");
/// assert_eq!(to_string(&None::<i32>).unwrap(), "nil\n");
/// ```
///
/// # Errors
///
/// Returns [`Error::UnsupportedShape`] for records, nested sequences, floats,
/// booleans and the like.
pub fn to_string<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    to_string_with_options(value, &RenderOptions::default())
}

/// Serialize to text with a custom prefix and indentation.
///
/// # Errors
///
/// See [`to_string`].
pub fn to_string_with_options<T>(value: &T, options: &RenderOptions) -> Result<String>
where
    T: ?Sized + Serialize,
{
    let list = marshal::to_list(value, options)?;
    Ok(tree::render(&list, options))
}

/// Serialize to a writer.
///
/// # Examples
///
/// ```rust
/// use serde_teff::to_writer;
///
/// let mut buffer = Vec::new();
/// to_writer(&mut buffer, &vec![1, 2]).unwrap();
/// assert_eq!(buffer, b"1\n2\n");
/// ```
///
/// # Errors
///
/// Returns serialization errors, or [`Error::Io`] if writing fails.
pub fn to_writer<W, T>(mut writer: W, value: &T) -> Result<()>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    let text = to_string(value)?;
    writer
        .write_all(text.as_bytes())
        .map_err(|e| Error::io(&e.to_string()))
}

/// Deserialize from text.
///
/// # Examples
///
/// ```rust
/// use serde_teff::from_str;
///
/// let numbers: Vec<i64> = from_str("1\n2\n  # ignored\n3\n").unwrap();
/// assert_eq!(numbers, vec![1, 2, 3]);
///
/// let nothing: Option<String> = from_str("nil").unwrap();
/// assert_eq!(nothing, None);
/// ```
///
/// # Errors
///
/// Returns scanning errors ([`Error::InvalidCodePoint`],
/// [`Error::MismatchedIndent`], [`Error::UnexpectedIndent`]) and
/// [`Error::MalformedScalar`] for text that does not fit the requested type.
pub fn from_str<T>(s: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    let list = tree::parse(s)?;
    marshal::from_list(&list)
}

/// Deserialize from bytes. Invalid UTF-8 is reported as
/// [`Error::InvalidCodePoint`] at the position of the first bad sequence.
///
/// # Errors
///
/// See [`from_str`].
pub fn from_slice<T>(v: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    from_str(&String::from_utf8_lossy(v))
}

/// Deserialize from a reader.
///
/// # Errors
///
/// Returns [`Error::Io`] if reading fails, then see [`from_str`].
pub fn from_reader<R, T>(mut reader: R) -> Result<T>
where
    R: io::Read,
    T: DeserializeOwned,
{
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| Error::io(&e.to_string()))?;
    from_slice(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_strings() {
        let words = vec![
            "plain".to_string(),
            String::new(),
            "  padded  ".to_string(),
            "#hash".to_string(),
            "line\nbreak".to_string(),
            "\"quoted\"".to_string(),
            "nil".to_string(),
        ];
        let text = to_string(&words).unwrap();
        let back: Vec<String> = from_str(&text).unwrap();
        assert_eq!(back, words);
    }

    #[test]
    fn test_round_trip_integers() {
        let numbers = vec![0i64, -1, i64::MAX, i64::MIN];
        let back: Vec<i64> = from_str(&to_string(&numbers).unwrap()).unwrap();
        assert_eq!(back, numbers);
    }

    #[test]
    fn test_prefix_is_not_stripped() {
        let options = RenderOptions::new().with_prefix("\t");
        let text = to_string_with_options(&7, &options).unwrap();
        assert_eq!(text, "\t7\n");
        assert_eq!(from_str::<i32>(&text), Err(Error::UnexpectedIndent { line: 1 }));
    }

    #[test]
    fn test_from_slice_invalid_utf8() {
        let err = from_slice::<String>(b"ok\n\xff\n").unwrap_err();
        assert_eq!(err, Error::invalid_code_point(2, 1, char::REPLACEMENT_CHARACTER));
    }

    #[test]
    fn test_from_reader() {
        let cursor = io::Cursor::new(b"5\n6\n".to_vec());
        let numbers: Vec<u8> = from_reader(cursor).unwrap();
        assert_eq!(numbers, vec![5, 6]);
    }
}
