//! The paging controller.
//!
//! ## States
//!
//! ```text
//! Idle ──▶ InitialLoading ──▶ Loaded ◀──▶ LoadingMore
//!               │                              │
//!               └────────────▶ Error ◀─────────┘
//! ```
//!
//! Filter, search, refresh, and initial-load retry bump the request
//! generation and start a fresh initial load. Every dispatched request
//! captures the generation it was issued under; when it resolves, the result
//! is applied only if the generation is unchanged. A superseded request is
//! not aborted, its result is simply discarded.
//!
//! The state lock is never held across an `.await`.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tourmap_core::AppConfig;
use tourmap_tourapi::{ListingPage, ListingRecord, TourApiError};

use crate::cache::EnrichmentCache;
use crate::enrich::apply_pet_filter;
use crate::error::FeedError;
use crate::filter::FilterState;
use crate::sort::sort_records;
use crate::source::ListingSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Idle,
    InitialLoading,
    Loaded,
    LoadingMore,
    Error,
}

/// What a controller call did.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    /// The result was applied; `added` records became visible.
    Applied { added: usize },
    /// The call was not allowed in the current state; nothing was requested.
    Skipped,
    /// A newer filter or search took over before this result arrived.
    Superseded,
    Failed(Arc<FeedError>),
}

/// Everything the presentation layer renders.
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    pub items: Vec<ListingRecord>,
    pub phase: LoadPhase,
    pub has_more: bool,
    /// Last page applied (0 before the first successful load).
    pub page: u32,
    pub total_count: Option<u32>,
    pub error: Option<Arc<FeedError>>,
    pub filter: FilterState,
    pub search: Option<String>,
    pub generation: u64,
}

impl FeedSnapshot {
    #[must_use]
    pub fn is_initial_loading(&self) -> bool {
        self.phase == LoadPhase::InitialLoading
    }

    #[must_use]
    pub fn is_loading_more(&self) -> bool {
        self.phase == LoadPhase::LoadingMore
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadKind {
    Initial,
    More,
}

/// Parameters captured when a request is dispatched.
struct Ticket {
    generation: u64,
    kind: LoadKind,
    page: u32,
    filter: FilterState,
    search: Option<String>,
}

/// A fetched page after filtering and sorting.
struct Batch {
    items: Vec<ListingRecord>,
    fetched: usize,
    total_count: Option<u32>,
}

struct FeedState {
    filter: FilterState,
    search: Option<String>,
    items: Vec<ListingRecord>,
    seen: HashSet<String>,
    phase: LoadPhase,
    page: u32,
    has_more: bool,
    total_count: Option<u32>,
    error: Option<Arc<FeedError>>,
    failed: Option<LoadKind>,
    generation: u64,
}

impl FeedState {
    fn new() -> Self {
        Self {
            filter: FilterState::default(),
            search: None,
            items: Vec::new(),
            seen: HashSet::new(),
            phase: LoadPhase::Idle,
            page: 0,
            has_more: true,
            total_count: None,
            error: None,
            failed: None,
            generation: 0,
        }
    }

    /// Supersedes whatever is in flight and resets the cursor.
    fn begin_initial(&mut self) -> Ticket {
        self.generation += 1;
        self.phase = LoadPhase::InitialLoading;
        self.page = 0;
        self.has_more = true;
        self.total_count = None;
        self.error = None;
        self.failed = None;
        self.items.clear();
        self.seen.clear();
        Ticket {
            generation: self.generation,
            kind: LoadKind::Initial,
            page: 1,
            filter: self.filter.clone(),
            search: self.search.clone(),
        }
    }

    /// Returns `None` unless a next page may be requested right now.
    fn begin_more(&mut self) -> Option<Ticket> {
        let ready = match self.phase {
            LoadPhase::Loaded => true,
            LoadPhase::Error => self.failed == Some(LoadKind::More),
            LoadPhase::Idle | LoadPhase::InitialLoading | LoadPhase::LoadingMore => false,
        };
        if !ready || !self.has_more {
            return None;
        }
        self.phase = LoadPhase::LoadingMore;
        self.error = None;
        self.failed = None;
        Some(Ticket {
            generation: self.generation,
            kind: LoadKind::More,
            page: self.page + 1,
            filter: self.filter.clone(),
            search: self.search.clone(),
        })
    }

    fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            items: self.items.clone(),
            phase: self.phase,
            has_more: self.has_more,
            page: self.page,
            total_count: self.total_count,
            error: self.error.clone(),
            filter: self.filter.clone(),
            search: self.search.clone(),
            generation: self.generation,
        }
    }
}

struct Inner {
    source: Arc<dyn ListingSource>,
    cache: Arc<EnrichmentCache>,
    page_size: u32,
    state: Mutex<FeedState>,
}

/// Merges filter state, search state, paginated fetches, and enrichment into
/// one visible list.
///
/// Cheap to clone; clones share state. All operations take `&self`, so a
/// filter change can be issued while an earlier load is still suspended.
#[derive(Clone)]
pub struct FeedController {
    inner: Arc<Inner>,
}

impl FeedController {
    /// Creates a controller with its own enrichment cache.
    #[must_use]
    pub fn new(source: Arc<dyn ListingSource>, page_size: u32, cache_capacity: usize) -> Self {
        Self::with_cache(
            source,
            page_size,
            Arc::new(EnrichmentCache::new(cache_capacity)),
        )
    }

    /// Creates a controller that shares an existing enrichment cache.
    #[must_use]
    pub fn with_cache(
        source: Arc<dyn ListingSource>,
        page_size: u32,
        cache: Arc<EnrichmentCache>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                cache,
                page_size: page_size.max(1),
                state: Mutex::new(FeedState::new()),
            }),
        }
    }

    #[must_use]
    pub fn from_config(source: Arc<dyn ListingSource>, config: &AppConfig) -> Self {
        Self::new(source, config.page_size, config.enrichment_cache_capacity)
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<EnrichmentCache> {
        &self.inner.cache
    }

    #[must_use]
    pub fn snapshot(&self) -> FeedSnapshot {
        self.lock().snapshot()
    }

    /// Replaces the filter and starts a fresh initial load.
    pub async fn set_filter(&self, filter: FilterState) -> LoadOutcome {
        let ticket = {
            let mut state = self.lock();
            state.filter = filter;
            state.begin_initial()
        };
        self.run(ticket).await
    }

    /// Replaces the search term and starts a fresh initial load. Blank terms
    /// clear the search.
    pub async fn set_search(&self, term: Option<String>) -> LoadOutcome {
        let ticket = {
            let mut state = self.lock();
            state.search = clean_search(term);
            state.begin_initial()
        };
        self.run(ticket).await
    }

    /// Replaces filter and search together with a single initial load.
    pub async fn set_query(&self, filter: FilterState, term: Option<String>) -> LoadOutcome {
        let ticket = {
            let mut state = self.lock();
            state.filter = filter;
            state.search = clean_search(term);
            state.begin_initial()
        };
        self.run(ticket).await
    }

    /// Reloads page 1 for the current filter and search.
    pub async fn refresh(&self) -> LoadOutcome {
        let ticket = self.lock().begin_initial();
        self.run(ticket).await
    }

    /// Requests the next page. A no-op unless the list is loaded, more data
    /// is expected, and nothing else is in flight.
    pub async fn load_more(&self) -> LoadOutcome {
        let Some(ticket) = self.lock().begin_more() else {
            return LoadOutcome::Skipped;
        };
        self.run(ticket).await
    }

    /// Re-issues the request that failed. A no-op outside the error state.
    pub async fn retry(&self) -> LoadOutcome {
        let ticket = {
            let mut state = self.lock();
            match (state.phase, state.failed) {
                (LoadPhase::Error, Some(LoadKind::Initial)) => Some(state.begin_initial()),
                (LoadPhase::Error, Some(LoadKind::More)) => state.begin_more(),
                _ => None,
            }
        };
        match ticket {
            Some(ticket) => self.run(ticket).await,
            None => LoadOutcome::Skipped,
        }
    }

    fn lock(&self) -> MutexGuard<'_, FeedState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    async fn run(&self, ticket: Ticket) -> LoadOutcome {
        tracing::debug!(
            generation = ticket.generation,
            page = ticket.page,
            kind = ?ticket.kind,
            search = ticket.search.as_deref().unwrap_or(""),
            "dispatching feed request"
        );
        let result = self.fetch_batch(&ticket).await;
        self.apply(&ticket, result)
    }

    /// Fetches one page and runs it through the category filter, the pet
    /// filter, and the sort, in that order.
    async fn fetch_batch(&self, ticket: &Ticket) -> Result<Batch, TourApiError> {
        let inner = &self.inner;
        let query = ticket.filter.listing_query(ticket.page, inner.page_size);

        let page: ListingPage = match ticket.search.as_deref() {
            Some(term) => inner.source.search_keyword(term, &query).await?,
            None => inner.source.area_based_list(&query).await?,
        };
        let fetched = page.fetched;
        let mut items = page.items;

        if ticket.filter.needs_local_category_filter() {
            items.retain(|r| ticket.filter.matches_category(r.content_type));
        }

        if ticket.filter.pets_only {
            items = apply_pet_filter(
                inner.source.as_ref(),
                &inner.cache,
                items,
                ticket.filter.effective_pet_sizes(),
            )
            .await;
        }

        sort_records(&mut items, ticket.filter.sort);

        Ok(Batch {
            items,
            fetched,
            total_count: page.total_count,
        })
    }

    fn apply(&self, ticket: &Ticket, result: Result<Batch, TourApiError>) -> LoadOutcome {
        let mut state = self.lock();
        if state.generation != ticket.generation {
            tracing::debug!(
                dispatched = ticket.generation,
                current = state.generation,
                "discarding superseded feed result"
            );
            return LoadOutcome::Superseded;
        }

        match result {
            Ok(batch) => {
                if ticket.kind == LoadKind::Initial {
                    state.items.clear();
                    state.seen.clear();
                }
                let mut added = 0usize;
                for item in batch.items {
                    if state.seen.insert(item.content_id.clone()) {
                        state.items.push(item);
                        added += 1;
                    }
                }
                state.page = ticket.page;
                state.has_more = batch.fetched >= self.inner.page_size as usize;
                state.total_count = batch.total_count.or(state.total_count);
                state.phase = LoadPhase::Loaded;
                tracing::info!(
                    page = ticket.page,
                    added,
                    visible = state.items.len(),
                    has_more = state.has_more,
                    "feed page applied"
                );
                LoadOutcome::Applied { added }
            }
            Err(err) => {
                let err = Arc::new(FeedError::from(err));
                tracing::warn!(page = ticket.page, kind = ?ticket.kind, error = %err, "feed load failed");
                if ticket.kind == LoadKind::Initial {
                    state.items.clear();
                    state.seen.clear();
                }
                state.phase = LoadPhase::Error;
                state.failed = Some(ticket.kind);
                state.error = Some(Arc::clone(&err));
                LoadOutcome::Failed(err)
            }
        }
    }
}

fn clean_search(term: Option<String>) -> Option<String> {
    term.map(|t| t.trim().to_owned()).filter(|t| !t.is_empty())
}

#[cfg(test)]
#[path = "controller_test.rs"]
mod tests;
