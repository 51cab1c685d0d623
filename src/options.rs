//! Configuration options for scanning, rendering and tree-model conversion.
//!
//! - [`ScanOptions`]: how the scanner classifies lines
//! - [`RenderOptions`]: prefix and indentation used when rendering text
//! - [`ModelOptions`]: recursion bound for the tree-model builder and filler
//!
//! ## Examples
//!
//! ```rust
//! use serde_teff::{to_string_with_options, RenderOptions};
//!
//! let options = RenderOptions::new().with_indent("  ");
//! let text = to_string_with_options(&vec![1, 2], &options).unwrap();
//! assert_eq!(text, "1\n2\n");
//! ```

/// The default annotation marker.
pub const DEFAULT_ANNOTATION_MARKER: char = '#';

/// The default recursion bound for [`ModelOptions`].
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Options controlling the scanner.
///
/// # Examples
///
/// ```rust
/// use serde_teff::ScanOptions;
///
/// let options = ScanOptions::new().with_annotation_marker(';');
/// assert_eq!(options.annotation_marker, ';');
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanOptions {
    /// Lines starting with this character become `Annotation` tokens.
    pub annotation_marker: char,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            annotation_marker: DEFAULT_ANNOTATION_MARKER,
        }
    }
}

impl ScanOptions {
    /// Creates default options (`#` marks an annotation line).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the character that marks an annotation line.
    #[must_use]
    pub fn with_annotation_marker(mut self, marker: char) -> Self {
        self.annotation_marker = marker;
        self
    }
}

/// Options controlling text rendering.
///
/// Every rendered line starts with `prefix`, followed by `indent` repeated once
/// per nesting level. The defaults are an empty prefix and a tab indent.
///
/// # Examples
///
/// ```rust
/// use serde_teff::RenderOptions;
///
/// let options = RenderOptions::new().with_prefix("> ").with_indent("    ");
/// assert_eq!(options.prefix, "> ");
/// assert_eq!(options.indent, "    ");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    pub prefix: String,
    pub indent: String,
    /// Passed to quoting so that content starting with the marker is quoted.
    pub annotation_marker: char,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            prefix: String::new(),
            indent: "\t".to_string(),
            annotation_marker: DEFAULT_ANNOTATION_MARKER,
        }
    }
}

impl RenderOptions {
    /// Creates default options (no prefix, tab indentation).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the prefix written before every line.
    #[must_use]
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    /// Sets the string written once per nesting level.
    #[must_use]
    pub fn with_indent(mut self, indent: &str) -> Self {
        self.indent = indent.to_string();
        self
    }

    /// Sets the annotation marker that rendered content must not start with.
    #[must_use]
    pub fn with_annotation_marker(mut self, marker: char) -> Self {
        self.annotation_marker = marker;
        self
    }
}

/// Options for [`crate::model::new_with_options`] and [`crate::model::fill_with_options`].
///
/// # Examples
///
/// ```rust
/// use serde_teff::ModelOptions;
///
/// let options = ModelOptions::new().with_max_depth(16);
/// assert_eq!(options.max_depth, 16);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelOptions {
    /// Maximum nesting of sequences, records and references visited by one call.
    pub max_depth: usize,
}

impl Default for ModelOptions {
    fn default() -> Self {
        ModelOptions {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ModelOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
