//! Pet-policy enrichment and the filter built on it.
//!
//! Lookups for one batch are capped at [`ENRICHMENT_FAN_OUT`] and started
//! together; the batch finishes when the slowest lookup does. Records
//! already in the cache are never looked up again. Uncached records past the
//! cap get no lookup in this batch and are treated as having no data.

use std::collections::{HashMap, HashSet};

use futures::stream::{self, StreamExt};
use tourmap_tourapi::ListingRecord;

use crate::cache::{EnrichmentCache, EnrichmentEntry};
use crate::source::ListingSource;

/// Maximum enrichment lookups issued for one batch.
pub const ENRICHMENT_FAN_OUT: usize = 20;

/// Resolves enrichment entries for `items`, consulting and filling `cache`.
///
/// The returned map holds an entry for every record that was cached or
/// looked up; records skipped by the cap are absent. A failed lookup is
/// logged and recorded as [`EnrichmentEntry::NoData`].
pub async fn enrich_batch(
    source: &dyn ListingSource,
    cache: &EnrichmentCache,
    items: &[ListingRecord],
) -> HashMap<String, EnrichmentEntry> {
    let mut resolved = HashMap::with_capacity(items.len());
    let mut to_fetch: Vec<&str> = Vec::new();
    let mut scheduled = HashSet::new();
    let mut skipped = 0usize;

    for item in items {
        let id = item.content_id.as_str();
        if resolved.contains_key(id) || scheduled.contains(id) {
            continue;
        }
        if let Some(entry) = cache.get(id) {
            resolved.insert(id.to_owned(), entry);
        } else if to_fetch.len() < ENRICHMENT_FAN_OUT {
            scheduled.insert(id);
            to_fetch.push(id);
        } else {
            skipped += 1;
        }
    }

    if skipped > 0 {
        tracing::debug!(
            skipped,
            cap = ENRICHMENT_FAN_OUT,
            "enrichment fan-out cap reached; remaining records get no lookup"
        );
    }

    let looked_up = stream::iter(to_fetch.iter().map(|id| async move {
        let entry = match source.pet_policy(id).await {
            Ok(Some(policy)) => EnrichmentEntry::Found(policy),
            Ok(None) => EnrichmentEntry::NoData,
            Err(err) => {
                tracing::warn!(content_id = %id, error = %err, "pet policy lookup failed; treating as no data");
                EnrichmentEntry::NoData
            }
        };
        (*id, entry)
    }))
    .buffer_unordered(ENRICHMENT_FAN_OUT)
    .collect::<Vec<_>>()
    .await;

    for (id, entry) in looked_up {
        cache.insert(id.to_owned(), entry.clone());
        resolved.insert(id.to_owned(), entry);
    }

    resolved
}

/// `true` when the entry allows accompaniment and, if size tags are given,
/// matches one of them.
#[must_use]
pub fn passes_pet_filter(entry: Option<&EnrichmentEntry>, sizes: &[String]) -> bool {
    entry
        .and_then(EnrichmentEntry::policy)
        .is_some_and(|p| p.allows_accompaniment() && p.matches_size(sizes))
}

/// Enriches `items` and drops those failing the pet filter. Order is kept.
pub async fn apply_pet_filter(
    source: &dyn ListingSource,
    cache: &EnrichmentCache,
    items: Vec<ListingRecord>,
    sizes: &[String],
) -> Vec<ListingRecord> {
    let resolved = enrich_batch(source, cache, &items).await;
    let before = items.len();
    let kept: Vec<ListingRecord> = items
        .into_iter()
        .filter(|item| passes_pet_filter(resolved.get(&item.content_id), sizes))
        .collect();
    tracing::debug!(before, after = kept.len(), "pet filter applied");
    kept
}
