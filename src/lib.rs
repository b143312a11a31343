//! Stencil: a logic-less Mustache template engine.
//!
//! Templates mix literal text with `{{...}}` tags: escaped (`{{name}}`) and
//! raw (`{{{name}}}`, `{{&name}}`) interpolation, sections (`{{#x}}...{{/x}}`),
//! inverted sections (`{{^x}}...{{/x}}`), partials (`{{>name}}`), comments
//! (`{{!...}}`), and delimiter changes (`{{=<% %>=}}`). Names resolve
//! against a stack of context frames, innermost first; values can be
//! scalars, sequences, mappings, accessor-backed objects, or lambdas.
//!
//! Parsed templates (including section bodies, lambda output, and partial
//! text) are cached per [`Engine`], so repeated renders and repeated
//! sections tokenize each distinct piece of text once.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//!
//! let out = stencil::render(
//!     "{{title}}:\n{{#items}}\n  - {{name}}\n{{/items}}\n",
//!     json!({
//!         "title": "Todo",
//!         "items": [{"name": "write"}, {"name": "ship"}],
//!     }),
//! )
//! .unwrap();
//! assert_eq!(out, "Todo:\n  - write\n  - ship\n");
//! ```

mod ast;
mod cache;
mod context;
mod engine;
mod error;
mod parser;
mod pattern;
mod renderer;
mod value;

pub use cache::TemplateCache;
pub use engine::{Engine, NoPartials, PartialResolver, render};
pub use error::{Result, TemplateError};
pub use pattern::Delimiters;
pub use value::{Lambda, MapRef, Object, Value};
