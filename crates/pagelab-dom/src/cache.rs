//! Memoizing element lookup
//!
//! Resolution hits the live document once per selector and remembers the
//! answer for the page lifetime. Negative results are remembered too: a
//! selector that failed once is never retried, matching the assumption that
//! page structure does not change under the engine (only the engine itself
//! mutates it, and it never creates or removes elements).

use crate::document::{Document, ElementHandle, Selector};
use dashmap::DashMap;
use std::sync::Arc;

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Memoized single-element entries (including negative ones)
    pub entries: usize,
    /// Memoized multi-element entries
    pub multi_entries: usize,
}

/// Selector → handle cache over a [`Document`]
#[derive(Clone)]
pub struct ElementCache {
    doc: Arc<dyn Document>,
    single: Arc<DashMap<String, Option<ElementHandle>>>,
    multi: Arc<DashMap<String, Vec<ElementHandle>>>,
}

impl ElementCache {
    /// Create a cache over a document
    #[must_use]
    pub fn new(doc: Arc<dyn Document>) -> Self {
        Self {
            doc,
            single: Arc::new(DashMap::new()),
            multi: Arc::new(DashMap::new()),
        }
    }

    /// The document this cache fronts
    #[inline]
    #[must_use]
    pub fn document(&self) -> &Arc<dyn Document> {
        &self.doc
    }

    /// Resolve a selector to at most one element
    ///
    /// The first call queries the document; every later call for the same
    /// selector returns the memoized answer, found or not. Absence is a
    /// valid outcome, not an error — callers null-check.
    #[must_use]
    pub fn resolve(&self, selector: &Selector) -> Option<ElementHandle> {
        let key = selector.cache_key();
        if let Some(entry) = self.single.get(&key) {
            return *entry;
        }

        let found = self.doc.query(selector);
        match found {
            Some(handle) => tracing::debug!(%selector, %handle, "element resolved"),
            None => tracing::warn!(%selector, "element not found; caching the miss"),
        }
        self.single.insert(key, found);
        found
    }

    /// Resolve a selector to every matching element, in document order
    ///
    /// Same memoization contract as [`resolve`](Self::resolve); an empty
    /// match list is remembered and never retried.
    #[must_use]
    pub fn resolve_all(&self, selector: &Selector) -> Vec<ElementHandle> {
        let key = selector.cache_key();
        if let Some(entry) = self.multi.get(&key) {
            return entry.clone();
        }

        let found = self.doc.query_all(selector);
        if found.is_empty() {
            tracing::warn!(%selector, "no elements found; caching the miss");
        } else {
            tracing::debug!(%selector, count = found.len(), "elements resolved");
        }
        self.multi.insert(key, found.clone());
        found
    }

    /// Current cache statistics
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.single.len(),
            multi_entries: self.multi.len(),
        }
    }
}

impl std::fmt::Debug for ElementCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementCache")
            .field("entries", &self.single.len())
            .field("multi_entries", &self.multi.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomError;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Minimal document with one known id, counting lookups
    struct OneElementDoc {
        lookups: AtomicUsize,
    }

    impl OneElementDoc {
        fn new() -> Self {
            Self {
                lookups: AtomicUsize::new(0),
            }
        }
    }

    impl Document for OneElementDoc {
        fn query(&self, selector: &Selector) -> Option<ElementHandle> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            match selector {
                Selector::Id(id) if id == "known" => Some(ElementHandle(7)),
                _ => None,
            }
        }

        fn query_all(&self, selector: &Selector) -> Vec<ElementHandle> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            match selector {
                Selector::Class(class) if class == "many" => {
                    vec![ElementHandle(1), ElementHandle(2)]
                }
                _ => Vec::new(),
            }
        }

        fn element_id(&self, _: ElementHandle) -> Result<Option<String>, DomError> {
            Ok(None)
        }

        fn matches(&self, _: ElementHandle, _: &Selector) -> Result<bool, DomError> {
            Ok(false)
        }

        fn text(&self, _: ElementHandle) -> Result<String, DomError> {
            Ok(String::new())
        }

        fn set_text(&self, _: ElementHandle, _: &str) -> Result<(), DomError> {
            Ok(())
        }

        fn attribute(&self, _: ElementHandle, _: &str) -> Result<Option<String>, DomError> {
            Ok(None)
        }

        fn set_attribute(&self, _: ElementHandle, _: &str, _: &str) -> Result<(), DomError> {
            Ok(())
        }

        fn visible(&self, _: ElementHandle) -> Result<bool, DomError> {
            Ok(true)
        }

        fn set_visible(&self, _: ElementHandle, _: bool) -> Result<(), DomError> {
            Ok(())
        }

        fn children(&self, _: ElementHandle) -> Result<Vec<ElementHandle>, DomError> {
            Ok(Vec::new())
        }

        fn set_children(&self, _: ElementHandle, _: &[ElementHandle]) -> Result<(), DomError> {
            Ok(())
        }

        fn path(&self) -> String {
            "/".to_string()
        }

        fn navigate(&self, _: &str) -> Result<(), DomError> {
            Err(DomError::NavigationUnsupported)
        }
    }

    #[test]
    fn resolve_memoizes_hits() {
        let doc = Arc::new(OneElementDoc::new());
        let cache = ElementCache::new(doc.clone());

        let first = cache.resolve(&Selector::id("known"));
        let second = cache.resolve(&Selector::id("known"));

        assert_eq!(first, Some(ElementHandle(7)));
        assert_eq!(first, second);
        assert_eq!(doc.lookups.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn resolve_memoizes_misses() {
        let doc = Arc::new(OneElementDoc::new());
        let cache = ElementCache::new(doc.clone());

        assert_eq!(cache.resolve(&Selector::id("absent")), None);
        assert_eq!(cache.resolve(&Selector::id("absent")), None);
        assert_eq!(doc.lookups.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn resolve_all_memoizes_empty_lists() {
        let doc = Arc::new(OneElementDoc::new());
        let cache = ElementCache::new(doc.clone());

        assert!(cache.resolve_all(&Selector::class("nope")).is_empty());
        assert!(cache.resolve_all(&Selector::class("nope")).is_empty());
        assert_eq!(doc.lookups.load(Ordering::SeqCst), 1);

        let many = cache.resolve_all(&Selector::class("many"));
        assert_eq!(many.len(), 2);
        assert_eq!(doc.lookups.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn id_and_class_selectors_do_not_collide() {
        let doc = Arc::new(OneElementDoc::new());
        let cache = ElementCache::new(doc);

        assert_eq!(
            Selector::id("cta").cache_key(),
            "#cta".to_string()
        );
        assert_eq!(Selector::class("cta").cache_key(), ".cta".to_string());
        let _ = cache.resolve(&Selector::id("cta"));
        let _ = cache.resolve_all(&Selector::class("cta"));
        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.multi_entries, 1);
    }
}
