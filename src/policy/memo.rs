//! Memoized materialized endpoints.
//!
//! # Design Decisions
//! - Keyed by template identity; an entry is only reused when the loader
//!   returned the exact same descriptor instance it was built from
//! - A new descriptor instance (page reload) replaces the entry
//! - Bounded: once full, entries whose template is no longer referenced
//!   anywhere else (retired by a reload) are evicted; if none are, new
//!   endpoints are built but not stored

use dashmap::DashMap;
use std::sync::Arc;

use crate::pages::descriptor::CompiledPageDescriptor;
use crate::routing::endpoint::RouteEndpoint;

struct MemoEntry {
    // Held so the key address cannot be reused by another template
    template: Arc<RouteEndpoint>,
    descriptor: Arc<CompiledPageDescriptor>,
    endpoint: Arc<RouteEndpoint>,
}

/// Cache of materialized endpoints.
pub struct EndpointMemo {
    entries: DashMap<usize, MemoEntry>,
    capacity: usize,
}

impl EndpointMemo {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity,
        }
    }

    fn key(template: &Arc<RouteEndpoint>) -> usize {
        Arc::as_ptr(template) as usize
    }

    /// Endpoint previously built from this template and descriptor.
    pub fn get(
        &self,
        template: &Arc<RouteEndpoint>,
        descriptor: &Arc<CompiledPageDescriptor>,
    ) -> Option<Arc<RouteEndpoint>> {
        let entry = self.entries.get(&Self::key(template))?;
        if Arc::ptr_eq(&entry.template, template) && Arc::ptr_eq(&entry.descriptor, descriptor) {
            Some(Arc::clone(&entry.endpoint))
        } else {
            None
        }
    }

    /// Remember an endpoint. Returns false if the memo is full.
    pub fn insert(
        &self,
        template: &Arc<RouteEndpoint>,
        descriptor: &Arc<CompiledPageDescriptor>,
        endpoint: &Arc<RouteEndpoint>,
    ) -> bool {
        let key = Self::key(template);
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.prune();
            if self.entries.len() >= self.capacity {
                return false;
            }
        }
        self.entries.insert(
            key,
            MemoEntry {
                template: Arc::clone(template),
                descriptor: Arc::clone(descriptor),
                endpoint: Arc::clone(endpoint),
            },
        );
        true
    }

    /// Drop entries for templates only the memo still holds. A request that
    /// matched against a route table swapped out mid-flight can store such
    /// an entry after `clear`. Returns the number removed.
    pub fn prune(&self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| Arc::strong_count(&entry.template) > 1);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::reference::PageReference;
    use crate::routing::endpoint::EndpointBuilder;

    fn template(path: &str) -> Arc<RouteEndpoint> {
        Arc::new(EndpointBuilder::page_template(PageReference::new(path), path, 0).build())
    }

    fn descriptor(path: &str) -> Arc<CompiledPageDescriptor> {
        Arc::new(CompiledPageDescriptor::new(PageReference::new(path)))
    }

    #[test]
    fn test_hit_requires_same_descriptor() {
        let memo = EndpointMemo::new(8);
        let t = template("/a");
        let d1 = descriptor("/a");
        let built = Arc::new(EndpointBuilder::deferred("/a", 0).build());

        assert!(memo.insert(&t, &d1, &built));
        assert!(Arc::ptr_eq(&memo.get(&t, &d1).unwrap(), &built));

        // Reloaded page: different instance, no hit
        let d2 = descriptor("/a");
        assert!(memo.get(&t, &d2).is_none());

        // Rebuilt entry replaces the old one
        let rebuilt = Arc::new(EndpointBuilder::deferred("/a", 0).build());
        assert!(memo.insert(&t, &d2, &rebuilt));
        assert_eq!(memo.len(), 1);
        assert!(memo.get(&t, &d1).is_none());
    }

    #[test]
    fn test_capacity() {
        let memo = EndpointMemo::new(1);
        let d = descriptor("/a");
        let built = Arc::new(EndpointBuilder::deferred("/a", 0).build());

        let (a, b) = (template("/a"), template("/b"));
        assert!(memo.insert(&a, &d, &built));
        assert!(!memo.insert(&b, &d, &built));
        // Replacing an existing key is allowed when full
        assert!(memo.insert(&a, &d, &built));
    }

    #[test]
    fn test_retired_template_evicted_when_full() {
        let memo = EndpointMemo::new(1);
        let d = descriptor("/a");
        let built = Arc::new(EndpointBuilder::deferred("/a", 0).build());

        // Entry stored for a template that is then dropped everywhere else
        let retired = template("/old");
        assert!(memo.insert(&retired, &d, &built));
        drop(retired);

        let live = template("/new");
        assert!(memo.insert(&live, &d, &built));
        assert_eq!(memo.len(), 1);
        assert!(Arc::ptr_eq(&memo.get(&live, &d).unwrap(), &built));
    }

    #[test]
    fn test_prune_keeps_live_templates() {
        let memo = EndpointMemo::new(4);
        let d = descriptor("/a");
        let built = Arc::new(EndpointBuilder::deferred("/a", 0).build());

        let live = template("/a");
        memo.insert(&live, &d, &built);
        memo.insert(&template("/gone"), &d, &built);
        assert_eq!(memo.len(), 2);

        assert_eq!(memo.prune(), 1);
        assert_eq!(memo.len(), 1);
        assert!(memo.get(&live, &d).is_some());
    }
}
