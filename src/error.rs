//! Error types for template parsing.
//!
//! Uses thiserror for derive macros. Every variant is fatal to the parse
//! call that raised it and carries the 1-based line number of the offending
//! tag, computed by counting newlines up to the tag's offset.
//!
//! Rendering has no error taxonomy of its own: unresolved field names render
//! as empty strings, and value-shape mismatches are settled by the
//! renderer's type dispatch. The only errors a render call can surface are
//! parse errors from lazily parsed section bodies, lambda output, and
//! partials.

use thiserror::Error;

/// Fatal template parse errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// A `{{/name}}` close tag appeared with no section open.
    #[error("line {line}: closing tag '{name}' found, but not in a section")]
    UnmatchedCloseSection {
        /// Name in the close tag.
        name: String,
        /// 1-based source line of the close tag.
        line: usize,
    },

    /// A close tag named a section other than the innermost open one.
    #[error("line {line}: closing tag closes '{found}'; expected '{expected}'")]
    MismatchedCloseSection {
        /// Name in the close tag.
        found: String,
        /// Name of the innermost open section.
        expected: String,
        /// 1-based source line of the close tag.
        line: usize,
    },

    /// A `{{=...=}}` body did not split into exactly two tokens.
    #[error("line {line}: Set Delimiters tags must have exactly two values")]
    InvalidDelimiterSpec {
        /// 1-based source line of the tag.
        line: usize,
    },

    /// A tag marker outside the recognized set.
    #[error("line {line}: unknown tag type '{marker}'")]
    UnknownTagType {
        /// The unrecognized marker character(s).
        marker: String,
        /// 1-based source line of the tag.
        line: usize,
    },

    /// A `{{#name}}` or `{{^name}}` section was never closed.
    #[error("line {line}: section '{name}' is never closed")]
    UnclosedSection {
        /// Name of the open section.
        name: String,
        /// 1-based source line of the open tag.
        line: usize,
    },
}

/// Result type alias for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

/// 1-based line number of a byte offset within a template.
pub(crate) fn line_of(template: &str, offset: usize) -> usize {
    template[..offset.min(template.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count()
        + 1
}
