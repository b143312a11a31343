//! Tag delimiters and the compiled tag scanner.
//!
//! A [`TagMatcher`] wraps a single compiled regex built from a delimiter
//! pair. The parser compiles one matcher per active delimiter pair and
//! reuses it for every tag scanned under that pair; a `{{=...=}}` tag makes
//! the parser build a fresh matcher for the new pair.
//!
//! The delimiter strings are passed through [`regex::escape`] before being
//! embedded, so custom delimiters containing regex metacharacters (`<%`,
//! `[[`, `|`) behave as literal text. Tag bodies are matched lazily and the
//! pattern runs in `(?s)` mode, so a body may span multiple lines and stops
//! at the first closing delimiter.

use regex::Regex;

/// An open/close delimiter pair, `{{`/`}}` by default.
///
/// Part of the template-cache key: the same source text parsed under
/// different delimiters yields a different AST.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Delimiters {
    /// Opening delimiter, e.g. `{{`.
    pub open: String,
    /// Closing delimiter, e.g. `}}`.
    pub close: String,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            open: "{{".to_string(),
            close: "}}".to_string(),
        }
    }
}

impl Delimiters {
    /// Build a pair from two tokens of a Set Delimiters tag.
    pub fn new(open: &str, close: &str) -> Self {
        Self {
            open: open.to_string(),
            close: close.to_string(),
        }
    }
}

/// One tag occurrence located by [`TagMatcher::find_at`].
///
/// Offsets are absolute byte positions in the scanned template, which the
/// parser needs for standalone-tag detection and raw section-body slicing.
#[derive(Debug)]
pub(crate) struct TagMatch<'t> {
    /// Literal text between the scan offset and the tag's leading whitespace.
    pub lit: &'t str,
    /// Inline whitespace (spaces/tabs) immediately before the open delimiter.
    pub ws: &'t str,
    /// Tag-type marker: `=`, `!`, `{`, `&`, `#`, `^`, `/`, `>`, empty for an
    /// escaped variable, or one of the foreign-dialect sigils (`<`, `%`,
    /// `$`) that the parser rejects as unknown.
    pub marker: &'t str,
    /// Tag body with surrounding whitespace trimmed by the pattern.
    pub body: &'t str,
    /// Byte offset where the leading whitespace starts.
    pub ws_start: usize,
    /// Byte offset of the open delimiter.
    pub tag_start: usize,
    /// Byte offset just past the close delimiter.
    pub end: usize,
}

/// Compiled matcher for one delimiter pair.
pub(crate) struct TagMatcher {
    regex: Regex,
}

impl TagMatcher {
    /// Compile the tag pattern for a delimiter pair.
    ///
    /// The tag interior is an ordered alternation, because two tag shapes
    /// carry their own paired closer: `{{=...=}}` must end with `=` and
    /// `{{{...}}}` must end with `}` before the close delimiter, while every
    /// other shape ends at the close delimiter alone. Folding the closer into
    /// one optional class would let it swallow a character belonging to the
    /// tag body or the surrounding template.
    ///
    /// The marker class is wider than the set this engine supports: `<`, `%`
    /// and `$` are tag sigils in other Mustache dialects (parents, pragmas,
    /// blocks) and are captured here so the parser can reject them as
    /// unknown tag types instead of mistaking them for variable names.
    pub fn new(delimiters: &Delimiters) -> Self {
        let pattern = format!(
            r"(?s)(?P<lit>.*?)(?P<ws>[ \t]*)(?P<tag>{open}(?:=\s*(?P<eq>.*?)\s*={close}|\{{\s*(?P<brace>.*?)\s*\}}{close}|\s*(?P<marker>[!&#^/><%$]?)\s*(?P<body>.*?)\s*{close}))",
            open = regex::escape(&delimiters.open),
            close = regex::escape(&delimiters.close),
        );
        // The delimiters are escaped and the surrounding pattern is fixed,
        // so compilation cannot fail for any delimiter pair.
        let regex = Regex::new(&pattern).expect("escaped tag pattern is valid");
        Self { regex }
    }

    /// Find the next tag at or after `offset`, or `None` if the rest of the
    /// template contains no tag under these delimiters.
    pub fn find_at<'t>(&self, template: &'t str, offset: usize) -> Option<TagMatch<'t>> {
        let caps = self.regex.captures_at(template, offset)?;
        let ws = caps.name("ws")?;
        let tag = caps.name("tag")?;
        let (marker, body) = if let Some(eq) = caps.name("eq") {
            ("=", eq.as_str())
        } else if let Some(brace) = caps.name("brace") {
            ("{", brace.as_str())
        } else {
            (caps.name("marker")?.as_str(), caps.name("body")?.as_str())
        };
        Some(TagMatch {
            lit: caps.name("lit")?.as_str(),
            ws: ws.as_str(),
            marker,
            body,
            ws_start: ws.start(),
            tag_start: tag.start(),
            end: tag.end(),
        })
    }
}
