//! Indentation-sensitive scanning.
//!
//! This module provides the [`Scanner`], which turns a character stream into a
//! flat sequence of [`Token`]s: one token per content line, plus explicit
//! [`TokenKind::Indent`] / [`TokenKind::Unindent`] tokens whenever the nesting
//! depth changes.
//!
//! ## Overview
//!
//! - **Indent stack**: the scanner keeps the whitespace prefix of every open
//!   nesting level, outermost (`""`) first. A line indented by a strict
//!   extension of the current prefix opens one level; a line indented by a
//!   prefix further down the stack closes every level above it.
//! - **Blank lines**: lines holding only spaces and tabs produce no tokens and
//!   never touch the indent stack.
//! - **Annotations**: a line whose content starts with the annotation marker
//!   (`#` by default) becomes an [`TokenKind::Annotation`] with the marker
//!   stripped.
//! - **Validation**: control characters `0x00..=0x19` other than tab, CR and LF,
//!   and the replacement character `U+FFFD`, are fatal.
//!
//! Content is never unquoted or unescaped here; that belongs to [`crate::tree`].
//!
//! ## Usage
//!
//! ```rust
//! use serde_teff::{Scanner, TokenKind};
//!
//! let mut scanner = Scanner::from_str("root\n  child\n");
//! let mut kinds = Vec::new();
//! while scanner.advance() {
//!     kinds.push(scanner.current().kind);
//! }
//! assert!(scanner.error().is_none());
//! assert_eq!(
//!     kinds,
//!     vec![
//!         TokenKind::LineContent,
//!         TokenKind::Indent,
//!         TokenKind::LineContent,
//!         TokenKind::Unindent,
//!         TokenKind::EndOfInput,
//!     ]
//! );
//! ```

use crate::{Error, Result, ScanOptions};
use std::collections::VecDeque;
use std::str::Chars;

/// The kind of a [`Token`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Sentinel held by a scanner before its first [`Scanner::advance`].
    #[doc(hidden)]
    StartOfInput,
    /// A line starting with the annotation marker; the text excludes the marker.
    Annotation,
    /// A content line, verbatim up to the line break.
    LineContent,
    /// One nesting level was opened.
    Indent,
    /// One nesting level was closed.
    Unindent,
    /// The input is exhausted and every level has been closed.
    EndOfInput,
}

/// A single token. `text` is empty unless the kind is `Annotation` or `LineContent`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    /// An `Annotation` token carrying `text` with the marker already stripped.
    #[must_use]
    pub fn annotation(text: &str) -> Self {
        Token {
            kind: TokenKind::Annotation,
            text: text.to_string(),
        }
    }

    /// A `LineContent` token.
    #[must_use]
    pub fn line(text: &str) -> Self {
        Token {
            kind: TokenKind::LineContent,
            text: text.to_string(),
        }
    }

    /// An `Indent` token.
    #[must_use]
    pub fn indent() -> Self {
        Self::bare(TokenKind::Indent)
    }

    /// An `Unindent` token.
    #[must_use]
    pub fn unindent() -> Self {
        Self::bare(TokenKind::Unindent)
    }

    /// The `EndOfInput` token.
    #[must_use]
    pub fn end_of_input() -> Self {
        Self::bare(TokenKind::EndOfInput)
    }

    const fn bare(kind: TokenKind) -> Self {
        Token {
            kind,
            text: String::new(),
        }
    }
}

/// A character source with one character of push-back.
///
/// Every character is validated as it is first read; a pushed-back character
/// is handed out again without being re-validated or re-counted.
struct Source<I> {
    chars: I,
    pushed: Option<char>,
    line: usize,
    col: usize,
}

impl<I: Iterator<Item = char>> Source<I> {
    fn new(chars: I) -> Self {
        Source {
            chars,
            pushed: None,
            line: 1,
            col: 0,
        }
    }

    fn next(&mut self) -> Result<Option<char>> {
        if let Some(ch) = self.pushed.take() {
            return Ok(Some(ch));
        }
        let Some(ch) = self.chars.next() else {
            return Ok(None);
        };
        if ch == '\n' {
            self.line += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }
        if is_allowed(ch) {
            Ok(Some(ch))
        } else {
            Err(Error::invalid_code_point(self.line, self.col, ch))
        }
    }

    fn unread(&mut self, ch: char) {
        debug_assert!(self.pushed.is_none(), "only one character of push-back");
        self.pushed = Some(ch);
    }
}

#[inline]
fn is_allowed(ch: char) -> bool {
    match ch {
        '\t' | ' ' | '\r' | '\n' => true,
        char::REPLACEMENT_CHARACTER => false,
        '\u{0}'..='\u{19}' => false,
        _ => true,
    }
}

#[inline]
const fn is_line_break(ch: char) -> bool {
    matches!(ch, '\r' | '\n')
}

/// How a measured indent relates to the indent stack.
#[derive(Debug, PartialEq, Eq)]
enum Level {
    Same,
    Deeper,
    /// Close this many levels.
    Shallower(usize),
}

/// The indentation-sensitive scanner.
///
/// Drive it with [`Scanner::advance`] and read tokens with [`Scanner::current`],
/// or use it as an [`Iterator`] of `Result<Token>`. Once a fatal error has been
/// recorded no further tokens are produced and [`Scanner::error`] reports it.
/// Running out of input is not an error.
pub struct Scanner<I> {
    source: Source<I>,
    options: ScanOptions,
    indents: Vec<String>,
    pending: VecDeque<Token>,
    current: Token,
    line: usize,
    error: Option<Error>,
    finished: bool,
    reported: bool,
}

impl<'a> Scanner<Chars<'a>> {
    /// Creates a scanner over a string slice with default options.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(input: &'a str) -> Self {
        Scanner::new(input.chars())
    }
}

impl<I: Iterator<Item = char>> Scanner<I> {
    /// Creates a scanner over `chars` with default options.
    pub fn new(chars: I) -> Self {
        Scanner::with_options(chars, ScanOptions::default())
    }

    /// Creates a scanner over `chars`.
    pub fn with_options(chars: I, options: ScanOptions) -> Self {
        Scanner {
            source: Source::new(chars),
            options,
            indents: vec![String::new()],
            pending: VecDeque::new(),
            current: Token::bare(TokenKind::StartOfInput),
            line: 0,
            error: None,
            finished: false,
            reported: false,
        }
    }

    /// Moves to the next token, returning `false` once none is left.
    ///
    /// Queued tokens are handed out first; when the queue is empty one line is
    /// scanned, which may queue several tokens at once (a dedent burst).
    pub fn advance(&mut self) -> bool {
        if let Some(token) = self.pending.pop_front() {
            self.current = token;
            return true;
        }
        if self.finished {
            return false;
        }
        if let Err(err) = self.scan_line() {
            tracing::debug!(error = %err, "scan terminated");
            // the failing line's tokens never reach the caller
            self.pending.clear();
            self.error = Some(err);
            self.finished = true;
            return false;
        }
        match self.pending.pop_front() {
            Some(token) => {
                self.current = token;
                true
            }
            None => false,
        }
    }

    /// The token most recently produced by [`Scanner::advance`].
    #[must_use]
    pub fn current(&self) -> &Token {
        &self.current
    }

    /// The fatal error that stopped the scan, if any.
    #[must_use]
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// The 1-based line number of the most recently scanned line.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// The currently open indentation prefixes, outermost first.
    #[must_use]
    pub fn indents(&self) -> &[String] {
        &self.indents
    }

    fn scan_line(&mut self) -> Result<()> {
        let Some(indent) = self.scan_indent()? else {
            self.finish();
            return Ok(());
        };
        self.line = self.source.line;
        match self.locate(&indent) {
            Some(Level::Same) => {}
            Some(Level::Deeper) => {
                self.indents.push(indent);
                self.pending.push_back(Token::indent());
            }
            Some(Level::Shallower(levels)) => {
                self.indents.truncate(self.indents.len() - levels);
                for _ in 0..levels {
                    self.pending.push_back(Token::unindent());
                }
            }
            None => return Err(Error::mismatched_indent(self.line, &indent)),
        }
        self.scan_content()
    }

    /// Measures the indentation of the next non-blank line.
    ///
    /// Returns `None` at end of input. On success the first content character
    /// has been pushed back.
    fn scan_indent(&mut self) -> Result<Option<String>> {
        loop {
            let mut indent = String::new();
            loop {
                match self.source.next()? {
                    Some(ch @ (' ' | '\t')) => indent.push(ch),
                    Some(ch) => {
                        self.source.unread(ch);
                        break;
                    }
                    None => return Ok(None),
                }
            }
            match self.source.next()? {
                Some(ch) if is_line_break(ch) => continue,
                Some(ch) => {
                    self.source.unread(ch);
                    return Ok(Some(indent));
                }
                None => return Ok(None),
            }
        }
    }

    fn locate(&self, indent: &str) -> Option<Level> {
        let top = self.indents.last().map_or("", String::as_str);
        if indent == top {
            Some(Level::Same)
        } else if indent.starts_with(top) {
            Some(Level::Deeper)
        } else {
            self.indents
                .iter()
                .rev()
                .position(|open| open == indent)
                .map(Level::Shallower)
        }
    }

    fn scan_content(&mut self) -> Result<()> {
        let mut text = String::new();
        while let Some(ch) = self.source.next()? {
            if is_line_break(ch) {
                self.source.unread(ch);
                break;
            }
            text.push(ch);
        }
        let token = match text.strip_prefix(self.options.annotation_marker) {
            Some(rest) => Token::annotation(rest),
            None => Token {
                kind: TokenKind::LineContent,
                text,
            },
        };
        self.pending.push_back(token);
        Ok(())
    }

    fn finish(&mut self) {
        for _ in 1..self.indents.len() {
            self.pending.push_back(Token::unindent());
        }
        self.indents.truncate(1);
        self.pending.push_back(Token::end_of_input());
        self.finished = true;
    }
}

impl<I: Iterator<Item = char>> Iterator for Scanner<I> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.advance() {
            return Some(Ok(self.current.clone()));
        }
        if self.reported {
            return None;
        }
        self.reported = true;
        self.error.clone().map(Err)
    }
}

/// Scans a whole string, collecting every token up to and including `EndOfInput`.
///
/// # Errors
///
/// Returns the first fatal scan error.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    Scanner::from_str(input).collect()
}

/// Like [`tokenize`], with custom options.
///
/// # Errors
///
/// Returns the first fatal scan error.
pub fn tokenize_with_options(input: &str, options: &ScanOptions) -> Result<Vec<Token>> {
    Scanner::with_options(input.chars(), options.clone()).collect()
}
