//! Parsed template representation.
//!
//! A template parses into a flat sequence of [`Node`]s. Section bodies are
//! deliberately *not* parsed into nested node lists: a [`RawTemplate`] holds
//! the verbatim body text plus the delimiters that were active when the
//! section opened, and the renderer lazily parses it (through the shared
//! cache) each time the section is actually rendered. A body may be rendered
//! zero times, once, or once per sequence element, and lambda sections can
//! substitute entirely new body text, so eager parsing would be wasted work.

use crate::pattern::Delimiters;

/// Verbatim template text paired with the delimiters it must be parsed under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawTemplate {
    /// Unparsed template source.
    pub source: String,
    /// Delimiter pair active where this text was captured.
    pub delimiters: Delimiters,
}

impl RawTemplate {
    pub(crate) fn new(source: &str, delimiters: &Delimiters) -> Self {
        Self {
            source: source.to_string(),
            delimiters: delimiters.clone(),
        }
    }
}

/// One node of a parsed template.
///
/// Comment tags are dropped at parse time and have no variant. Nodes are
/// plain data so a parsed template can be shared as `Arc<[Node]>` between
/// the cache and concurrent render calls.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal output.
    Text(String),

    /// `{{name}}` (escaped) or `{{{name}}}` / `{{&name}}` (raw) interpolation.
    Variable {
        /// Field name to resolve against the context stack.
        name: String,
        /// Whether to HTML-escape the resolved value.
        escape: bool,
    },

    /// `{{#name}}...{{/name}}`.
    Section {
        /// Field name controlling the section.
        name: String,
        /// Raw body, lazily parsed at render time.
        body: RawTemplate,
    },

    /// `{{^name}}...{{/name}}`.
    Inverted {
        /// Field name controlling the section.
        name: String,
        /// Raw body, lazily parsed at render time.
        body: RawTemplate,
    },

    /// `{{>name}}`.
    Partial {
        /// Partial name handed to the partial resolver.
        name: String,
        /// Leading whitespace captured when the tag was standalone; applied
        /// to every non-empty line of the partial's text.
        indent: String,
    },
}
