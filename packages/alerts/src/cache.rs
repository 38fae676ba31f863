//! Session-scoped store of hazard briefings.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Hazard id to insight text, shared between the manager and its insight
/// tasks. Entries are only ever added or overwritten.
#[derive(Debug, Clone, Default)]
pub struct InsightCache {
    inner: Arc<Mutex<BTreeMap<String, String>>>,
}

impl InsightCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The cached insight for `hazard_id`, if any.
    #[must_use]
    pub fn get(&self, hazard_id: &str) -> Option<String> {
        self.lock().get(hazard_id).cloned()
    }

    #[must_use]
    pub fn contains(&self, hazard_id: &str) -> bool {
        self.lock().contains_key(hazard_id)
    }

    /// Stores `text` for `hazard_id`. A later insert for the same id wins.
    pub fn insert(&self, hazard_id: impl Into<String>, text: impl Into<String>) {
        self.lock().insert(hazard_id.into(), text.into());
    }

    /// A point-in-time copy of every cached insight.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.lock().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_entries() {
        let cache = InsightCache::new();
        let shared = cache.clone();
        shared.insert("lag-ib-1", "Slow down.");

        assert!(cache.contains("lag-ib-1"));
        assert_eq!(cache.get("lag-ib-1").as_deref(), Some("Slow down."));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn last_write_wins() {
        let cache = InsightCache::new();
        cache.insert("ore-ben-1", "first");
        cache.insert("ore-ben-1", "second");
        assert_eq!(cache.snapshot().get("ore-ben-1").map(String::as_str), Some("second"));
    }
}
