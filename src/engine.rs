//! Render entry point and the partial-resolver boundary.
//!
//! An [`Engine`] owns one [`TemplateCache`] and renders any number of
//! templates through it. The cache is explicit and injectable so tests (and
//! hosts that want isolation) can construct independent engines; sharing one
//! engine shares parsed templates across renders.
//!
//! How template and partial text reaches the engine is the caller's concern:
//! templates are passed as `&str`, and partials come through the
//! [`PartialResolver`] capability. File discovery, naming conventions, and
//! front-matter handling all live outside this crate.

use crate::cache::TemplateCache;
use crate::error::Result;
use crate::parser::parse;
use crate::pattern::Delimiters;
use crate::renderer::generate;
use crate::value::Value;
use std::collections::HashMap;

/// Maps a partial name to its raw template text.
///
/// Unknown names resolve to the empty string; a missing partial renders as
/// nothing rather than failing the render.
pub trait PartialResolver {
    /// Raw template text for `name`, or the empty string if unknown.
    fn resolve(&self, name: &str) -> String;
}

/// The resolver for templates that use no partials.
pub struct NoPartials;

impl PartialResolver for NoPartials {
    fn resolve(&self, _name: &str) -> String {
        String::new()
    }
}

impl PartialResolver for HashMap<String, String> {
    fn resolve(&self, name: &str) -> String {
        self.get(name).cloned().unwrap_or_default()
    }
}

impl<'a> PartialResolver for HashMap<&'a str, &'a str> {
    fn resolve(&self, name: &str) -> String {
        self.get(name).map(|s| s.to_string()).unwrap_or_default()
    }
}

/// Template engine: a render entry point over a shared parse cache.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use stencil::Engine;
///
/// let engine = Engine::new();
/// let out = engine
///     .render_str("Hello, {{name}}!", json!({"name": "world"}))
///     .unwrap();
/// assert_eq!(out, "Hello, world!");
/// ```
pub struct Engine {
    cache: TemplateCache,
}

impl Engine {
    /// Create an engine with an empty cache.
    pub fn new() -> Self {
        Self {
            cache: TemplateCache::new(),
        }
    }

    /// Create an engine over an existing cache.
    pub fn with_cache(cache: TemplateCache) -> Self {
        Self { cache }
    }

    /// The engine's template cache.
    pub fn cache(&self) -> &TemplateCache {
        &self.cache
    }

    /// Expand `template` against `data`, resolving `{{>name}}` tags through
    /// `partials`.
    ///
    /// `data` becomes the root context frame; anything convertible to
    /// [`Value`] works, including `serde_json::json!` literals. Fails only
    /// on parse errors (in the template itself or in text pulled in by
    /// sections, lambdas, and partials); unresolved names render as empty
    /// strings.
    pub fn render(
        &self,
        template: &str,
        data: impl Into<Value>,
        partials: &dyn PartialResolver,
    ) -> Result<String> {
        let nodes = parse(&self.cache, template, &Delimiters::default())?;
        let mut stack = vec![data.into()];
        let mut out = String::new();
        generate(&nodes, &self.cache, partials, &mut stack, &mut out)?;
        Ok(out)
    }

    /// [`render`](Engine::render) with no partials.
    pub fn render_str(&self, template: &str, data: impl Into<Value>) -> Result<String> {
        self.render(template, data, &NoPartials)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot render with a fresh engine (and therefore a fresh cache).
///
/// ```
/// use serde_json::json;
///
/// let out = stencil::render("{{greeting}}!", json!({"greeting": "hi"})).unwrap();
/// assert_eq!(out, "hi!");
/// ```
pub fn render(template: &str, data: impl Into<Value>) -> Result<String> {
    Engine::new().render_str(template, data)
}
