//! Bounded cache of enrichment lookups keyed by content id.
//!
//! A missing key means "not fetched yet"; [`EnrichmentEntry::NoData`] records
//! a lookup that returned nothing or failed, so it is not retried for the
//! lifetime of the entry. Least-recently-used entries are evicted once
//! `capacity` is reached.

use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};

use lru::LruCache;
use tourmap_tourapi::PetPolicy;

#[derive(Debug, Clone, PartialEq)]
pub enum EnrichmentEntry {
    Found(PetPolicy),
    NoData,
}

impl EnrichmentEntry {
    #[must_use]
    pub fn policy(&self) -> Option<&PetPolicy> {
        match self {
            EnrichmentEntry::Found(policy) => Some(policy),
            EnrichmentEntry::NoData => None,
        }
    }
}

pub struct EnrichmentCache {
    entries: Mutex<LruCache<String, EnrichmentEntry>>,
}

impl EnrichmentCache {
    /// Creates a cache holding at most `capacity` entries (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, EnrichmentEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a clone of the cached entry and marks it recently used.
    #[must_use]
    pub fn get(&self, content_id: &str) -> Option<EnrichmentEntry> {
        self.lock().get(content_id).cloned()
    }

    pub fn insert(&self, content_id: String, entry: EnrichmentEntry) {
        self.lock().put(content_id, entry);
    }

    #[must_use]
    pub fn contains(&self, content_id: &str) -> bool {
        self.lock().contains(content_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }
}

impl std::fmt::Debug for EnrichmentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let guard = self.lock();
        f.debug_struct("EnrichmentCache")
            .field("len", &guard.len())
            .field("capacity", &guard.cap())
            .finish()
    }
}
