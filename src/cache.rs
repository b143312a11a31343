//! Shared template cache.
//!
//! Maps `(delimiter pair, exact source text)` to the parsed node sequence.
//! The parser consults it before tokenizing and populates it afterwards, so
//! identical template text is parsed at most once per distinct delimiter
//! pair. That includes the lazily parsed section bodies, lambda output, and
//! partial text that recursive renders feed back through the parser.
//!
//! Entries are never evicted; the cache is intentionally unbounded for the
//! lifetime of its owner. Hosts that render unbounded numbers of distinct
//! templates can call [`TemplateCache::clear`] at points of their choosing,
//! or simply drop the owning [`Engine`](crate::Engine) and build a new one.
//!
//! The interior mutex makes lookup-or-insert safe from concurrent render
//! calls sharing one engine; no ordering is guaranteed between unrelated
//! renders, and none is needed.

use crate::ast::Node;
use crate::pattern::Delimiters;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

type Key = (Delimiters, String);

/// Process-lifetime map from template source to parsed nodes.
#[derive(Default)]
pub struct TemplateCache {
    entries: Mutex<HashMap<Key, Arc<[Node]>>>,
}

impl TemplateCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached parses.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every cached parse.
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub(crate) fn get(&self, delimiters: &Delimiters, source: &str) -> Option<Arc<[Node]>> {
        self.lock()
            .get(&(delimiters.clone(), source.to_string()))
            .cloned()
    }

    pub(crate) fn insert(&self, delimiters: &Delimiters, source: &str, nodes: Arc<[Node]>) {
        self.lock()
            .insert((delimiters.clone(), source.to_string()), nodes);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Key, Arc<[Node]>>> {
        // A panic mid-insert cannot leave a partially written entry, so a
        // poisoned lock is still a usable map.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
