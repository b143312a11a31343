//! Tree-walking renderer.
//!
//! [`generate`] walks a parsed node sequence left to right, resolving names
//! through [`lookup`](crate::context::lookup) and appending to one output
//! buffer. Section bodies, lambda output, and partial text re-enter the
//! parser here (through the shared cache), which is what makes recursive
//! templates and repeated sections cheap: each distinct piece of text is
//! tokenized once.
//!
//! Lambdas get a render callback that expands arbitrary text against the
//! context current at the call site. A lambda found in variable position is
//! additionally memoized: the expanded result is written back into the
//! owning mapping frame, so interpolating the same field again within the
//! render reuses the computed string.

use crate::ast::Node;
use crate::cache::TemplateCache;
use crate::context::lookup;
use crate::engine::PartialResolver;
use crate::error::Result;
use crate::parser::parse;
use crate::pattern::Delimiters;
use crate::value::Value;

/// Render `nodes` against the context stack, appending to `out`.
pub(crate) fn generate(
    nodes: &[Node],
    cache: &TemplateCache,
    partials: &dyn PartialResolver,
    stack: &mut Vec<Value>,
    out: &mut String,
) -> Result<()> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),

            Node::Variable { name, escape } => {
                let (owner, value) = lookup(name, stack);
                let text = match value {
                    Value::Lambda(lambda) => {
                        let raw = {
                            let mut render = |text: &str| {
                                expand(text, &Delimiters::default(), cache, partials, stack)
                            };
                            lambda.call(None, &mut render)
                        };
                        let expanded =
                            expand(&raw, &Delimiters::default(), cache, partials, stack)?;
                        if let Some(Value::Map(map)) = owner {
                            map.borrow_mut()
                                .insert(name.clone(), Value::Str(expanded.clone()));
                        }
                        expanded
                    }
                    other => scalar_text(&other),
                };
                if *escape {
                    escape_html(&text, out);
                } else {
                    out.push_str(&text);
                }
            }

            Node::Section { name, body } => {
                let (_, value) = lookup(name, stack);
                match value {
                    Value::Seq(items) => {
                        if items.is_empty() {
                            continue;
                        }
                        let nodes = parse(cache, &body.source, &body.delimiters)?;
                        for item in items {
                            stack.push(item);
                            let rendered = generate(&nodes, cache, partials, stack, out);
                            stack.pop();
                            rendered?;
                        }
                    }
                    Value::Lambda(lambda) => {
                        let raw = {
                            let mut render = |text: &str| {
                                expand(text, &body.delimiters, cache, partials, stack)
                            };
                            lambda.call(Some(&body.source), &mut render)
                        };
                        stack.push(Value::Lambda(lambda));
                        let rendered = expand(&raw, &body.delimiters, cache, partials, stack);
                        stack.pop();
                        out.push_str(&rendered?);
                    }
                    other if other.is_truthy() => {
                        let nodes = parse(cache, &body.source, &body.delimiters)?;
                        stack.push(other);
                        let rendered = generate(&nodes, cache, partials, stack, out);
                        stack.pop();
                        rendered?;
                    }
                    _ => {}
                }
            }

            Node::Inverted { name, body } => {
                let (_, value) = lookup(name, stack);
                // No frame is pushed: the body renders against the context
                // as-is, only when the value is absent, falsy, or empty.
                if !value.is_truthy() {
                    let nodes = parse(cache, &body.source, &body.delimiters)?;
                    generate(&nodes, cache, partials, stack, out)?;
                }
            }

            Node::Partial { name, indent } => {
                let text = partials.resolve(name);
                let text = if indent.is_empty() {
                    text
                } else {
                    reindent(&text, indent)
                };
                let nodes = parse(cache, &text, &Delimiters::default())?;
                generate(&nodes, cache, partials, stack, out)?;
            }
        }
    }
    Ok(())
}

/// Parse and render a text fragment against the current context stack.
fn expand(
    text: &str,
    delimiters: &Delimiters,
    cache: &TemplateCache,
    partials: &dyn PartialResolver,
    stack: &mut Vec<Value>,
) -> Result<String> {
    let nodes = parse(cache, text, delimiters)?;
    let mut out = String::new();
    generate(&nodes, cache, partials, stack, &mut out)?;
    Ok(out)
}

/// Interpolated form of a resolved value.
///
/// Containers and lambdas have no scalar form and interpolate as empty, the
/// same as an unresolved name.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Num(n) => n.to_string(),
        Value::Str(s) => s.clone(),
        Value::Seq(_) | Value::Map(_) | Value::Lambda(_) | Value::Object(_) => String::new(),
    }
}

/// Append `text` to `out`, replacing HTML-unsafe characters with entities.
fn escape_html(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
}

/// Prefix every non-empty line of a partial's text with the indent captured
/// from its standalone `{{>name}}` tag.
fn reindent(text: &str, indent: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        if line != "\n" && line != "\r\n" {
            out.push_str(indent);
        }
        out.push_str(line);
    }
    out
}
