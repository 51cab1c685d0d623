//! The text tree: nested lines built from the scanner's token stream.
//!
//! A [`TextNode`] is one line of text and the lines nested under it. Parsing
//! consumes [`Token`](crate::Token)s, using `Indent`/`Unindent` as push/pop
//! signals around each content line; consecutive lines at the same depth are
//! siblings. Annotation lines are comments and do not appear in the tree.
//!
//! Rendering is the reverse: one line per node, indented once per depth.
//!
//! Node values are opaque text at this layer. The [`quote`] / [`unquote`]
//! helpers are for callers (such as [`crate::marshal`]) that store arbitrary
//! strings in a tree and need them to survive the trip through a single line.
//!
//! ```rust
//! use serde_teff::tree::{parse, render, TextNode};
//! use serde_teff::RenderOptions;
//!
//! let list = parse("fruit\n  apple\n  pear\nveg\n").unwrap();
//! assert_eq!(list[0].children.len(), 2);
//! assert_eq!(list[1], TextNode::new("veg"));
//!
//! let text = render(&list, &RenderOptions::new().with_indent("  "));
//! assert_eq!(text, "fruit\n  apple\n  pear\nveg\n");
//! ```

use crate::{Error, RenderOptions, Result, ScanOptions, Scanner, TokenKind};
use serde::{Deserialize, Serialize};

/// One line of text and its nested lines.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextNode {
    pub value: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: TextList,
}

/// An ordered sequence of sibling lines.
pub type TextList = Vec<TextNode>;

impl TextNode {
    #[must_use]
    pub fn new(value: &str) -> Self {
        TextNode {
            value: value.to_string(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_children(value: &str, children: TextList) -> Self {
        TextNode {
            value: value.to_string(),
            children,
        }
    }
}

/// Parses text into a tree with default scan options.
///
/// # Errors
///
/// Returns the scanner's fatal errors, or [`Error::UnexpectedIndent`] when an
/// indented line has no line above it to nest under.
pub fn parse(input: &str) -> Result<TextList> {
    parse_with_options(input, &ScanOptions::default())
}

/// Parses text into a tree.
///
/// # Errors
///
/// See [`parse`].
pub fn parse_with_options(input: &str, options: &ScanOptions) -> Result<TextList> {
    let mut scanner = Scanner::with_options(input.chars(), options.clone());
    // one open list per depth; the last node of each list owns the next one
    let mut open: Vec<TextList> = vec![Vec::new()];

    while scanner.advance() {
        let token = scanner.current();
        match token.kind {
            TokenKind::LineContent => {
                if let Some(list) = open.last_mut() {
                    list.push(TextNode::new(&token.text));
                }
            }
            TokenKind::Indent => {
                let has_parent = open.last().is_some_and(|list| !list.is_empty());
                if !has_parent {
                    return Err(Error::UnexpectedIndent {
                        line: scanner.line(),
                    });
                }
                // an annotation between two child blocks closes and reopens the level
                let siblings = open
                    .last_mut()
                    .and_then(|list| list.last_mut())
                    .map(|parent| std::mem::take(&mut parent.children))
                    .unwrap_or_default();
                open.push(siblings);
            }
            TokenKind::Unindent => {
                let children = open
                    .pop()
                    .ok_or_else(|| Error::custom("unbalanced unindent"))?;
                let parent = open
                    .last_mut()
                    .and_then(|list| list.last_mut())
                    .ok_or_else(|| Error::custom("unbalanced unindent"))?;
                parent.children = children;
            }
            TokenKind::Annotation | TokenKind::StartOfInput => {}
            TokenKind::EndOfInput => break,
        }
    }

    if let Some(err) = scanner.error() {
        return Err(err.clone());
    }
    open.pop().ok_or_else(|| Error::custom("unbalanced indentation"))
}

/// Renders a tree as indented text, one line per node.
#[must_use]
pub fn render(list: &[TextNode], options: &RenderOptions) -> String {
    let mut output = String::with_capacity(64);
    write_list(&mut output, list, options, 0);
    output
}

fn write_list(output: &mut String, list: &[TextNode], options: &RenderOptions, depth: usize) {
    for node in list {
        output.push_str(&options.prefix);
        for _ in 0..depth {
            output.push_str(&options.indent);
        }
        output.push_str(&node.value);
        output.push('\n');
        write_list(output, &node.children, options, depth + 1);
    }
}

/// Returns `true` if `s` would not survive a trip through one line unquoted.
///
/// That is the case for the empty string (a blank line is invisible), leading
/// or trailing blanks (leading ones would read as indentation), text starting
/// with a quote or with the annotation marker, and any control or replacement
/// character.
#[must_use]
pub fn needs_quotes(s: &str, annotation_marker: char) -> bool {
    s.is_empty()
        || s.starts_with(&[' ', '\t'][..])
        || s.ends_with(&[' ', '\t'][..])
        || s.starts_with('"')
        || s.starts_with(annotation_marker)
        || s
            .chars()
            .any(|ch| ch.is_control() || ch == char::REPLACEMENT_CHARACTER)
}

/// Wraps `s` in double quotes, escaping quotes, backslashes and control characters.
#[must_use]
pub fn quote(s: &str) -> String {
    let mut output = String::with_capacity(s.len() + 2);
    output.push('"');
    for ch in s.chars() {
        match ch {
            '"' => output.push_str("\\\""),
            '\\' => output.push_str("\\\\"),
            '\n' => output.push_str("\\n"),
            '\r' => output.push_str("\\r"),
            '\t' => output.push_str("\\t"),
            '\u{0008}' => output.push_str("\\b"),
            '\u{000C}' => output.push_str("\\f"),
            '\0' => output.push_str("\\0"),
            ch if ch.is_control() || ch == char::REPLACEMENT_CHARACTER => {
                output.push_str(&format!("\\u{:04x}", u32::from(ch)));
            }
            ch => output.push(ch),
        }
    }
    output.push('"');
    output
}

/// Reverses [`quote`]. Returns `None` if `s` is not a well-formed quoted literal.
#[must_use]
pub fn unquote(s: &str) -> Option<String> {
    let inner = s.strip_prefix('"')?.strip_suffix('"')?;
    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '"' => return None,
            '\\' => match chars.next()? {
                '"' => result.push('"'),
                '\\' => result.push('\\'),
                'n' => result.push('\n'),
                'r' => result.push('\r'),
                't' => result.push('\t'),
                'b' => result.push('\u{0008}'),
                'f' => result.push('\u{000C}'),
                '0' => result.push('\0'),
                'u' => {
                    let hex: String = chars.by_ref().take(4).collect();
                    if hex.len() != 4 {
                        return None;
                    }
                    let code_point = u32::from_str_radix(&hex, 16).ok()?;
                    result.push(char::from_u32(code_point)?);
                }
                _ => return None,
            },
            other => result.push(other),
        }
    }
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_siblings_and_children() {
        let list = parse("a\n  b\n    c\n  d\ne\n").unwrap();
        assert_eq!(
            list,
            vec![
                TextNode::with_children(
                    "a",
                    vec![
                        TextNode::with_children("b", vec![TextNode::new("c")]),
                        TextNode::new("d"),
                    ]
                ),
                TextNode::new("e"),
            ]
        );
    }

    #[test]
    fn test_parse_skips_annotations() {
        let list = parse("#header\na\n  # inner\n  b\n").unwrap();
        assert_eq!(
            list,
            vec![TextNode::with_children("a", vec![TextNode::new("b")])]
        );
    }

    #[test]
    fn test_parse_annotation_between_child_blocks() {
        let list = parse("a\n  b\n# note\n  d\n").unwrap();
        assert_eq!(
            list,
            vec![TextNode::with_children(
                "a",
                vec![TextNode::new("b"), TextNode::new("d")]
            )]
        );
    }

    #[test]
    fn test_parse_unexpected_indent() {
        assert_eq!(
            parse("  a\n").unwrap_err(),
            Error::UnexpectedIndent { line: 1 }
        );
        assert_eq!(
            parse("#only a comment\n  a\n").unwrap_err(),
            Error::UnexpectedIndent { line: 2 }
        );
    }

    #[test]
    fn test_parse_propagates_scan_errors() {
        assert!(matches!(
            parse("a\n  b\n c\n"),
            Err(Error::MismatchedIndent { line: 3, .. })
        ));
        assert!(matches!(
            parse("a\u{2}"),
            Err(Error::InvalidCodePoint { .. })
        ));
    }

    #[test]
    fn test_render_with_prefix() {
        let list = vec![TextNode::with_children("a", vec![TextNode::new("b")])];
        let options = RenderOptions::new().with_prefix("//").with_indent("\t");
        assert_eq!(render(&list, &options), "//a\n//\tb\n");
    }

    #[test]
    fn test_render_then_parse() {
        let list = vec![
            TextNode::with_children(
                "x",
                vec![TextNode::with_children("y", vec![TextNode::new("z")])],
            ),
            TextNode::new("w"),
        ];
        let text = render(&list, &RenderOptions::default());
        assert_eq!(text, "x\n\ty\n\t\tz\nw\n");
        assert_eq!(parse(&text).unwrap(), list);
    }

    #[test]
    fn test_needs_quotes() {
        assert!(needs_quotes("", '#'));
        assert!(needs_quotes(" lead", '#'));
        assert!(needs_quotes("trail\t", '#'));
        assert!(needs_quotes("#marker", '#'));
        assert!(needs_quotes("\"q", '#'));
        assert!(needs_quotes("two\nlines", '#'));
        assert!(needs_quotes("bell\u{7}", '#'));
        assert!(!needs_quotes("plain words", '#'));
        assert!(!needs_quotes("a \"quoted\" word", '#'));
        assert!(!needs_quotes("ünïcödé", '#'));
    }

    #[test]
    fn test_quote_unquote() {
        for s in ["", "a\"b", "back\\slash", "tab\there", "nl\n", "\u{1}\u{fffd}"] {
            let quoted = quote(s);
            assert!(!quoted.chars().any(|ch| ch.is_control()));
            assert_eq!(unquote(&quoted).as_deref(), Some(s));
        }
    }

    #[test]
    fn test_unquote_rejects_malformed() {
        assert_eq!(unquote("plain"), None);
        assert_eq!(unquote("\"open"), None);
        assert_eq!(unquote("\"a\"b\""), None);
        assert_eq!(unquote("\"bad \\q\""), None);
        assert_eq!(unquote("\"short \\u12\""), None);
        assert_eq!(unquote("\""), None);
    }
}
