//! Template tokenizer and AST builder.
//!
//! [`parse`] turns template text into a cached `Arc<[Node]>`. The scan loop
//! walks the text one tag at a time with the active [`TagMatcher`],
//! interleaving literal `Text` nodes with tag nodes. Section tags re-enter
//! the scanner recursively: the recursion locates the matching close tag
//! (honoring nesting and delimiter changes along the way) and hands back the
//! *raw* body substring, which is stored unparsed in the `Section` node and
//! lazily parsed when rendered.
//!
//! # Standalone tags
//!
//! A tag is standalone when the character before its leading inline
//! whitespace is a newline (or start of input) and the character after its
//! close delimiter is a newline (or end of input), i.e. the tag is the only
//! non-whitespace content on its line. Standalone handling applies to every
//! tag type *except* interpolations (`{{x}}`, `{{{x}}}`, `{{&x}}`): the
//! leading whitespace is dropped (kept as the indent for partials) and the
//! trailing newline is consumed. Non-standalone whitespace is emitted as
//! literal text.
//!
//! # Delimiter scope
//!
//! A `{{=open close=}}` tag rebinds the delimiters for the remainder of the
//! current scan level. A change made inside a section body applies to the
//! rest of that body only; the enclosing level resumes with the pair it had
//! when it recursed.

use crate::ast::{Node, RawTemplate};
use crate::cache::TemplateCache;
use crate::error::{Result, TemplateError, line_of};
use crate::pattern::{Delimiters, TagMatcher};
use std::sync::Arc;

/// Parse `template` under `delimiters`, consulting and populating the cache.
///
/// Identical `(delimiters, template)` inputs are tokenized at most once per
/// cache; later calls return the shared parse.
pub(crate) fn parse(
    cache: &TemplateCache,
    template: &str,
    delimiters: &Delimiters,
) -> Result<Arc<[Node]>> {
    if let Some(nodes) = cache.get(delimiters, template) {
        return Ok(nodes);
    }

    let nodes: Arc<[Node]> = match scan(template, delimiters.clone(), 0, None)? {
        Scan::Finished(nodes) => nodes.into(),
        // Only reachable in section mode; see the `/` arm.
        Scan::SectionClosed { .. } => unreachable!("close tag outside a section is an error"),
    };
    cache.insert(delimiters, template, Arc::clone(&nodes));
    Ok(nodes)
}

/// Outcome of one scan level.
enum Scan<'t> {
    /// Input exhausted at the top level: the finished node sequence.
    Finished(Vec<Node>),
    /// The enclosing section's close tag was reached: the raw body substring
    /// and the offset to resume the enclosing scan at.
    SectionClosed { raw: &'t str, resume: usize },
}

/// Scan `template` from `start` under `delimiters`.
///
/// `section` carries the name of the section being closed when this level
/// was entered by a `{{#...}}`/`{{^...}}` tag; node output built while
/// locating the close tag is discarded in that case (the body is kept raw
/// and parsed on demand at render time).
fn scan<'t>(
    template: &'t str,
    mut delimiters: Delimiters,
    start: usize,
    section: Option<&str>,
) -> Result<Scan<'t>> {
    let mut matcher = TagMatcher::new(&delimiters);
    let mut nodes = Vec::new();
    let mut pos = start;

    while let Some(m) = matcher.find_at(template, pos) {
        let interpolation = matches!(m.marker, "" | "{" | "&");
        let at_line_start = m.ws_start == 0 || template.as_bytes()[m.ws_start - 1] == b'\n';
        let rest = &template[m.end..];
        let (at_line_end, newline_len) = if rest.is_empty() {
            (true, 0)
        } else if rest.starts_with("\r\n") {
            (true, 2)
        } else if rest.starts_with('\n') {
            (true, 1)
        } else {
            (false, 0)
        };
        let standalone = !interpolation && at_line_start && at_line_end;

        if standalone {
            if !m.lit.is_empty() {
                nodes.push(Node::Text(m.lit.to_string()));
            }
        } else {
            // Leading whitespace stays literal when the tag is not alone on
            // its line (or is an interpolation).
            let text = &template[pos..m.tag_start];
            if !text.is_empty() {
                nodes.push(Node::Text(text.to_string()));
            }
        }
        let after = m.end + if standalone { newline_len } else { 0 };

        match m.marker {
            "!" => {}
            "" => nodes.push(Node::Variable {
                name: m.body.to_string(),
                escape: true,
            }),
            "{" | "&" => nodes.push(Node::Variable {
                name: m.body.to_string(),
                escape: false,
            }),
            ">" => {
                let indent = if standalone { m.ws } else { "" };
                nodes.push(Node::Partial {
                    name: m.body.to_string(),
                    indent: indent.to_string(),
                });
            }
            "=" => {
                let mut tokens = m.body.split_whitespace();
                match (tokens.next(), tokens.next(), tokens.next()) {
                    (Some(open), Some(close), None) => {
                        delimiters = Delimiters::new(open, close);
                        matcher = TagMatcher::new(&delimiters);
                    }
                    _ => {
                        return Err(TemplateError::InvalidDelimiterSpec {
                            line: line_of(template, m.tag_start),
                        });
                    }
                }
            }
            "#" | "^" => {
                let name = m.body.to_string();
                match scan(template, delimiters.clone(), after, Some(name.as_str()))? {
                    Scan::SectionClosed { raw, resume } => {
                        let body = RawTemplate::new(raw, &delimiters);
                        nodes.push(if m.marker == "#" {
                            Node::Section { name, body }
                        } else {
                            Node::Inverted { name, body }
                        });
                        pos = resume;
                        continue;
                    }
                    Scan::Finished(_) => {
                        return Err(TemplateError::UnclosedSection {
                            name,
                            line: line_of(template, m.tag_start),
                        });
                    }
                }
            }
            "/" => {
                let line = line_of(template, m.tag_start);
                let Some(expected) = section else {
                    return Err(TemplateError::UnmatchedCloseSection {
                        name: m.body.to_string(),
                        line,
                    });
                };
                if m.body != expected {
                    return Err(TemplateError::MismatchedCloseSection {
                        found: m.body.to_string(),
                        expected: expected.to_string(),
                        line,
                    });
                }
                // The body runs up to the close tag; a standalone close tag
                // also surrenders its leading whitespace.
                let body_end = if standalone { m.ws_start } else { m.tag_start };
                return Ok(Scan::SectionClosed {
                    raw: &template[start..body_end],
                    resume: after,
                });
            }
            other => {
                return Err(TemplateError::UnknownTagType {
                    marker: other.to_string(),
                    line: line_of(template, m.tag_start),
                });
            }
        }
        pos = after;
    }

    if pos < template.len() {
        nodes.push(Node::Text(template[pos..].to_string()));
    }
    Ok(Scan::Finished(nodes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_fresh(template: &str) -> Result<Arc<[Node]>> {
        parse(&TemplateCache::new(), template, &Delimiters::default())
    }

    fn nodes(template: &str) -> Vec<Node> {
        parse_fresh(template).unwrap().to_vec()
    }

    fn text(s: &str) -> Node {
        Node::Text(s.to_string())
    }

    fn var(name: &str, escape: bool) -> Node {
        Node::Variable {
            name: name.to_string(),
            escape,
        }
    }

    #[test]
    fn plain_text_is_one_node() {
        assert_eq!(nodes("hello world"), vec![text("hello world")]);
    }

    #[test]
    fn empty_template_parses_to_nothing() {
        assert_eq!(nodes(""), vec![]);
    }

    #[test]
    fn variable_escape_flags() {
        assert_eq!(
            nodes("{{a}} {{{b}}} {{&c}}"),
            vec![
                var("a", true),
                text(" "),
                var("b", false),
                text(" "),
                var("c", false),
            ]
        );
    }

    #[test]
    fn comments_produce_no_node() {
        assert_eq!(nodes("a{{! ignore me }}b"), vec![text("a"), text("b")]);
    }

    #[test]
    fn standalone_comment_strips_its_line() {
        assert_eq!(nodes("a\n{{! note }}\nb"), vec![text("a\n"), text("b")]);
    }

    #[test]
    fn interpolation_is_never_standalone() {
        // A variable alone on its line keeps the surrounding whitespace.
        assert_eq!(
            nodes("a\n  {{v}}\nb"),
            vec![text("a\n  "), var("v", true), text("\nb")]
        );
    }

    #[test]
    fn section_body_is_kept_raw() {
        let parsed = nodes("{{#items}}{{name}}, {{/items}}");
        assert_eq!(
            parsed,
            vec![Node::Section {
                name: "items".to_string(),
                body: RawTemplate::new("{{name}}, ", &Delimiters::default()),
            }]
        );
    }

    #[test]
    fn nested_sections_capture_outer_raw_body() {
        let parsed = nodes("{{#a}}x{{#b}}y{{/b}}z{{/a}}");
        assert_eq!(
            parsed,
            vec![Node::Section {
                name: "a".to_string(),
                body: RawTemplate::new("x{{#b}}y{{/b}}z", &Delimiters::default()),
            }]
        );
    }

    #[test]
    fn inverted_section_node() {
        let parsed = nodes("{{^missing}}fallback{{/missing}}");
        assert_eq!(
            parsed,
            vec![Node::Inverted {
                name: "missing".to_string(),
                body: RawTemplate::new("fallback", &Delimiters::default()),
            }]
        );
    }

    #[test]
    fn standalone_section_tags_strip_their_lines() {
        let parsed = nodes("List:\n{{#a}}\n  - x\n{{/a}}\ndone");
        assert_eq!(
            parsed,
            vec![
                text("List:\n"),
                Node::Section {
                    name: "a".to_string(),
                    body: RawTemplate::new("  - x\n", &Delimiters::default()),
                },
                text("done"),
            ]
        );
    }

    #[test]
    fn delimiter_switch_applies_to_remainder() {
        assert_eq!(
            nodes("{{=<% %>=}}<%v%>{{v}}"),
            vec![var("v", true), text("{{v}}")]
        );
    }

    #[test]
    fn delimiter_switch_inside_section_is_contained() {
        // Inside {{#a}} the switch takes effect (the close tag uses the new
        // pair), but the enclosing level resumes with {{ }} and still parses
        // {{y}} as a variable.
        let parsed = nodes("{{#a}}{{=<% %>=}}<%x%><%/a%>{{y}}");
        assert_eq!(
            parsed,
            vec![
                Node::Section {
                    name: "a".to_string(),
                    body: RawTemplate::new("{{=<% %>=}}<%x%>", &Delimiters::default()),
                },
                var("y", true),
            ]
        );
    }

    #[test]
    fn section_under_custom_delimiters_captures_them() {
        let parsed = nodes("{{=<% %>=}}<%#a%>body<%/a%>");
        assert_eq!(
            parsed,
            vec![Node::Section {
                name: "a".to_string(),
                body: RawTemplate::new("body", &Delimiters::new("<%", "%>")),
            }]
        );
    }

    #[test]
    fn standalone_partial_captures_indent() {
        let parsed = nodes("x\n  {{>p}}\n");
        assert_eq!(
            parsed,
            vec![
                text("x\n"),
                Node::Partial {
                    name: "p".to_string(),
                    indent: "  ".to_string(),
                },
            ]
        );
    }

    #[test]
    fn inline_partial_has_no_indent() {
        let parsed = nodes("a {{>p}} b");
        assert_eq!(
            parsed,
            vec![
                text("a "),
                Node::Partial {
                    name: "p".to_string(),
                    indent: String::new(),
                },
                text(" b"),
            ]
        );
    }

    #[test]
    fn unmatched_close_section_is_fatal() {
        let err = parse_fresh("text\n{{/ghost}}").unwrap_err();
        assert_eq!(
            err,
            TemplateError::UnmatchedCloseSection {
                name: "ghost".to_string(),
                line: 2,
            }
        );
    }

    #[test]
    fn mismatched_close_section_is_fatal() {
        let err = parse_fresh("{{#a}}...{{/b}}").unwrap_err();
        assert_eq!(
            err,
            TemplateError::MismatchedCloseSection {
                found: "b".to_string(),
                expected: "a".to_string(),
                line: 1,
            }
        );
    }

    #[test]
    fn unclosed_section_is_fatal() {
        let err = parse_fresh("a\nb\n{{#open}}never closed").unwrap_err();
        assert_eq!(
            err,
            TemplateError::UnclosedSection {
                name: "open".to_string(),
                line: 3,
            }
        );
    }

    #[test]
    fn unknown_tag_type_is_fatal() {
        let err = parse_fresh("ok\n{{%pragma}}").unwrap_err();
        assert_eq!(
            err,
            TemplateError::UnknownTagType {
                marker: "%".to_string(),
                line: 2,
            }
        );
    }

    #[test]
    fn delimiter_spec_must_have_two_tokens() {
        let err = parse_fresh("{{=onlyone=}}").unwrap_err();
        assert_eq!(err, TemplateError::InvalidDelimiterSpec { line: 1 });

        let err = parse_fresh("{{=a b c=}}").unwrap_err();
        assert_eq!(err, TemplateError::InvalidDelimiterSpec { line: 1 });
    }

    #[test]
    fn reparse_hits_the_cache() {
        let cache = TemplateCache::new();
        let delims = Delimiters::default();
        let first = parse(&cache, "{{a}} {{b}}", &delims).unwrap();
        assert_eq!(cache.len(), 1);

        let second = parse(&cache, "{{a}} {{b}}", &delims).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn crlf_standalone_tags() {
        assert_eq!(
            nodes("a\r\n{{! note }}\r\nb"),
            vec![text("a\r\n"), text("b")]
        );
    }

    #[test]
    fn tag_at_end_of_input_counts_as_line_end() {
        assert_eq!(nodes("a\n{{! trailing }}"), vec![text("a\n")]);
    }
}
