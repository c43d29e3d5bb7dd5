use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;
use tourmap_core::{ContentType, SortMode};
use tourmap_tourapi::{ListingPage, ListingQuery, ListingRecord, PetPolicy, TourApiError};

use super::*;
use crate::cache::EnrichmentEntry;
use crate::enrich::ENRICHMENT_FAN_OUT;

fn record(id: &str, content_type: ContentType) -> ListingRecord {
    ListingRecord {
        content_id: id.to_string(),
        title: format!("place {id}"),
        content_type,
        addr1: None,
        addr2: None,
        map_x: None,
        map_y: None,
        first_image: None,
        first_image2: None,
        tel: None,
        cat1: None,
        cat2: None,
        cat3: None,
        area_code: Some("1".to_string()),
        sigungu_code: None,
        modified_time: None,
    }
}

fn spots(ids: &[&str]) -> Vec<ListingRecord> {
    ids.iter()
        .map(|id| record(id, ContentType::TouristSpot))
        .collect()
}

fn policy(id: &str, accompaniment: &str, extra: Option<&str>) -> PetPolicy {
    PetPolicy {
        content_id: id.to_string(),
        accompaniment_type: Some(accompaniment.to_string()),
        allowed_scope: None,
        requirements: None,
        extra_info: extra.map(str::to_string),
        related_facilities: None,
    }
}

fn ids(snapshot: &FeedSnapshot) -> Vec<&str> {
    snapshot
        .items
        .iter()
        .map(|r| r.content_id.as_str())
        .collect()
}

fn unavailable() -> TourApiError {
    TourApiError::UnexpectedStatus {
        status: 503,
        operation: "areaBasedList2".to_string(),
    }
}

/// Holds one request open until released.
struct Gate {
    keyword: Option<String>,
    page: u32,
    release: Arc<Notify>,
}

#[derive(Default)]
struct FakeSource {
    /// Pages keyed by search keyword (`None` for area listings); page N is
    /// at index N-1.
    pages: HashMap<Option<String>, Vec<Vec<ListingRecord>>>,
    pets: HashMap<String, PetPolicy>,
    failing_pets: HashSet<String>,
    fail_listing: AtomicBool,
    gate: Option<Gate>,
    listing_calls: Mutex<Vec<(Option<String>, ListingQuery)>>,
    pet_calls: AtomicUsize,
    pet_in_flight: AtomicUsize,
    pet_peak: AtomicUsize,
}

impl FakeSource {
    fn with_pages(pages: Vec<Vec<ListingRecord>>) -> Self {
        let mut source = Self::default();
        source.pages.insert(None, pages);
        source
    }

    fn with_search(mut self, keyword: &str, pages: Vec<Vec<ListingRecord>>) -> Self {
        self.pages.insert(Some(keyword.to_string()), pages);
        self
    }

    fn with_pet(mut self, policy: PetPolicy) -> Self {
        self.pets.insert(policy.content_id.clone(), policy);
        self
    }

    fn gated(mut self, keyword: Option<&str>, page: u32) -> (Self, Arc<Notify>) {
        let release = Arc::new(Notify::new());
        self.gate = Some(Gate {
            keyword: keyword.map(str::to_string),
            page,
            release: Arc::clone(&release),
        });
        (self, release)
    }

    fn listing_calls(&self) -> Vec<(Option<String>, ListingQuery)> {
        self.listing_calls.lock().unwrap().clone()
    }

    fn pet_calls(&self) -> usize {
        self.pet_calls.load(Ordering::SeqCst)
    }

    async fn page(
        &self,
        keyword: Option<&str>,
        query: &ListingQuery,
    ) -> Result<ListingPage, TourApiError> {
        let keyword = keyword.map(str::to_string);
        self.listing_calls
            .lock()
            .unwrap()
            .push((keyword.clone(), query.clone()));

        if let Some(gate) = &self.gate {
            if gate.keyword == keyword && gate.page == query.page_no {
                gate.release.notified().await;
            }
        }

        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(unavailable());
        }

        let items = self
            .pages
            .get(&keyword)
            .and_then(|pages| pages.get(query.page_no as usize - 1))
            .cloned()
            .unwrap_or_default();
        Ok(ListingPage {
            fetched: items.len(),
            total_count: None,
            page_no: query.page_no,
            items,
        })
    }
}

#[async_trait]
impl ListingSource for FakeSource {
    async fn area_based_list(&self, query: &ListingQuery) -> Result<ListingPage, TourApiError> {
        self.page(None, query).await
    }

    async fn search_keyword(
        &self,
        keyword: &str,
        query: &ListingQuery,
    ) -> Result<ListingPage, TourApiError> {
        self.page(Some(keyword), query).await
    }

    async fn pet_policy(&self, content_id: &str) -> Result<Option<PetPolicy>, TourApiError> {
        self.pet_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.pet_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.pet_peak.fetch_max(now, Ordering::SeqCst);
        // Let every lookup in the batch start before any finishes.
        tokio::task::yield_now().await;
        self.pet_in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_pets.contains(content_id) {
            return Err(unavailable());
        }
        Ok(self.pets.get(content_id).cloned())
    }
}

fn controller(source: &Arc<FakeSource>, page_size: u32) -> FeedController {
    let source: Arc<dyn ListingSource> = Arc::clone(source) as Arc<dyn ListingSource>;
    FeedController::new(source, page_size, 100)
}

#[tokio::test]
async fn starts_idle_and_empty() {
    let source = Arc::new(FakeSource::default());
    let snapshot = controller(&source, 2).snapshot();
    assert_eq!(snapshot.phase, LoadPhase::Idle);
    assert!(snapshot.items.is_empty());
    assert_eq!(snapshot.page, 0);
}

#[tokio::test]
async fn initial_load_then_load_more_appends_until_short_page() {
    let source = Arc::new(FakeSource::with_pages(vec![
        spots(&["a", "b"]),
        spots(&["c"]),
    ]));
    let feed = controller(&source, 2);

    let outcome = feed.refresh().await;
    assert!(matches!(outcome, LoadOutcome::Applied { added: 2 }));
    let snapshot = feed.snapshot();
    assert_eq!(snapshot.phase, LoadPhase::Loaded);
    assert_eq!(snapshot.page, 1);
    assert!(snapshot.has_more);

    let outcome = feed.load_more().await;
    assert!(matches!(outcome, LoadOutcome::Applied { added: 1 }));
    let snapshot = feed.snapshot();
    assert_eq!(ids(&snapshot), vec!["a", "b", "c"]);
    assert_eq!(snapshot.page, 2);
    assert!(!snapshot.has_more);

    assert!(matches!(feed.load_more().await, LoadOutcome::Skipped));
    assert_eq!(source.listing_calls().len(), 2);
}

#[tokio::test]
async fn load_more_before_first_load_is_skipped() {
    let source = Arc::new(FakeSource::with_pages(vec![spots(&["a"])]));
    let feed = controller(&source, 2);

    assert!(matches!(feed.load_more().await, LoadOutcome::Skipped));
    assert!(source.listing_calls().is_empty());
}

#[tokio::test]
async fn appended_page_skips_ids_already_visible() {
    let source = Arc::new(FakeSource::with_pages(vec![
        spots(&["a", "b"]),
        spots(&["b", "c"]),
    ]));
    let feed = controller(&source, 2);

    feed.refresh().await;
    let outcome = feed.load_more().await;

    assert!(matches!(outcome, LoadOutcome::Applied { added: 1 }));
    assert_eq!(ids(&feed.snapshot()), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn page_requests_carry_the_filter() {
    let source = Arc::new(FakeSource::with_pages(vec![spots(&["a", "b"])]));
    let feed = controller(&source, 2);

    let filter = FilterState::default()
        .with_region("6".parse().unwrap())
        .with_category(ContentType::TouristSpot)
        .with_sort(SortMode::Name);
    feed.set_filter(filter).await;
    feed.load_more().await;

    let calls = source.listing_calls();
    assert_eq!(calls.len(), 2);
    for (keyword, query) in &calls {
        assert_eq!(keyword, &None);
        assert_eq!(query.area_code.as_deref(), Some("6"));
        assert_eq!(query.content_type_id.as_deref(), Some("12"));
        assert_eq!(query.arrange, Some("A"));
        assert_eq!(query.num_of_rows, 2);
    }
    assert_eq!(calls[0].1.page_no, 1);
    assert_eq!(calls[1].1.page_no, 2);
}

#[tokio::test]
async fn stale_search_result_is_discarded() {
    let (fake, release) = FakeSource::default()
        .with_search("slow", vec![spots(&["old"])])
        .with_search("fast", vec![spots(&["new"])])
        .gated(Some("slow"), 1);
    let source = Arc::new(fake);
    let feed = controller(&source, 2);

    let (slow, fast) = tokio::join!(feed.set_search(Some("slow".to_string())), async {
        let outcome = feed.set_search(Some("fast".to_string())).await;
        release.notify_one();
        outcome
    });

    assert!(matches!(slow, LoadOutcome::Superseded));
    assert!(matches!(fast, LoadOutcome::Applied { added: 1 }));
    let snapshot = feed.snapshot();
    assert_eq!(ids(&snapshot), vec!["new"]);
    assert_eq!(snapshot.search.as_deref(), Some("fast"));
    assert_eq!(snapshot.phase, LoadPhase::Loaded);
}

#[tokio::test]
async fn filter_change_discards_in_flight_next_page() {
    let (mut fake, release) = FakeSource::default().gated(None, 2);
    fake.pages.insert(
        None,
        vec![
            vec![
                record("s1", ContentType::TouristSpot),
                record("r1", ContentType::Restaurant),
            ],
            spots(&["s2", "s3"]),
        ],
    );
    let source = Arc::new(fake);
    let feed = controller(&source, 2);
    feed.refresh().await;

    let (more, changed) = tokio::join!(feed.load_more(), async {
        let outcome = feed
            .set_filter(
                FilterState::default()
                    .with_category(ContentType::Restaurant)
                    .with_category(ContentType::Lodging),
            )
            .await;
        release.notify_one();
        outcome
    });

    assert!(matches!(more, LoadOutcome::Superseded));
    assert!(matches!(changed, LoadOutcome::Applied { added: 1 }));
    let snapshot = feed.snapshot();
    assert_eq!(ids(&snapshot), vec!["r1"]);
    assert_eq!(snapshot.page, 1);
}

#[tokio::test]
async fn second_load_more_while_one_is_in_flight_is_skipped() {
    let (mut fake, release) = FakeSource::default().gated(None, 2);
    fake.pages
        .insert(None, vec![spots(&["a", "b"]), spots(&["c", "d"])]);
    let source = Arc::new(fake);
    let feed = controller(&source, 2);
    feed.refresh().await;

    let (first, second) = tokio::join!(feed.load_more(), async {
        assert!(feed.snapshot().is_loading_more());
        let outcome = feed.load_more().await;
        release.notify_one();
        outcome
    });

    assert!(matches!(first, LoadOutcome::Applied { added: 2 }));
    assert!(matches!(second, LoadOutcome::Skipped));
    assert_eq!(source.listing_calls().len(), 2);
    assert_eq!(ids(&feed.snapshot()), vec!["a", "b", "c", "d"]);
}

#[tokio::test]
async fn initial_failure_clears_list_and_retry_reloads() {
    let source = Arc::new(FakeSource::with_pages(vec![spots(&["a", "b"])]));
    let feed = controller(&source, 2);
    feed.refresh().await;

    source.fail_listing.store(true, Ordering::SeqCst);
    let outcome = feed.refresh().await;
    assert!(matches!(outcome, LoadOutcome::Failed(_)));
    let snapshot = feed.snapshot();
    assert_eq!(snapshot.phase, LoadPhase::Error);
    assert!(snapshot.items.is_empty());
    assert!(snapshot.error.is_some());
    assert!(matches!(feed.load_more().await, LoadOutcome::Skipped));

    source.fail_listing.store(false, Ordering::SeqCst);
    let outcome = feed.retry().await;
    assert!(matches!(outcome, LoadOutcome::Applied { added: 2 }));
    let snapshot = feed.snapshot();
    assert_eq!(snapshot.phase, LoadPhase::Loaded);
    assert!(snapshot.error.is_none());
    assert_eq!(snapshot.page, 1);
}

#[tokio::test]
async fn next_page_failure_keeps_list_and_retry_resumes() {
    let source = Arc::new(FakeSource::with_pages(vec![
        spots(&["a", "b"]),
        spots(&["c"]),
    ]));
    let feed = controller(&source, 2);
    feed.refresh().await;

    source.fail_listing.store(true, Ordering::SeqCst);
    let outcome = feed.load_more().await;
    assert!(matches!(outcome, LoadOutcome::Failed(_)));
    let snapshot = feed.snapshot();
    assert_eq!(snapshot.phase, LoadPhase::Error);
    assert_eq!(ids(&snapshot), vec!["a", "b"]);
    assert_eq!(snapshot.page, 1);

    source.fail_listing.store(false, Ordering::SeqCst);
    let outcome = feed.retry().await;
    assert!(matches!(outcome, LoadOutcome::Applied { added: 1 }));
    let snapshot = feed.snapshot();
    assert_eq!(ids(&snapshot), vec!["a", "b", "c"]);
    assert_eq!(snapshot.page, 2);

    let calls = source.listing_calls();
    assert_eq!(calls[1].1.page_no, 2);
    assert_eq!(calls[2].1.page_no, 2);
}

#[tokio::test]
async fn retry_without_failure_is_skipped() {
    let source = Arc::new(FakeSource::with_pages(vec![spots(&["a"])]));
    let feed = controller(&source, 2);
    feed.refresh().await;

    assert!(matches!(feed.retry().await, LoadOutcome::Skipped));
    assert_eq!(source.listing_calls().len(), 1);
}

#[tokio::test]
async fn blank_search_falls_back_to_area_listing() {
    let source = Arc::new(FakeSource::with_pages(vec![spots(&["a"])]));
    let feed = controller(&source, 2);

    feed.set_search(Some("   ".to_string())).await;

    let snapshot = feed.snapshot();
    assert_eq!(snapshot.search, None);
    assert_eq!(ids(&snapshot), vec!["a"]);
    assert_eq!(source.listing_calls()[0].0, None);
}

#[tokio::test]
async fn multi_category_selection_is_narrowed_locally() {
    let source = Arc::new(FakeSource::with_pages(vec![vec![
        record("spot", ContentType::TouristSpot),
        record("food", ContentType::Restaurant),
        record("stay", ContentType::Lodging),
        record("fest", ContentType::Festival),
    ]]));
    let feed = controller(&source, 4);

    feed.set_filter(
        FilterState::default()
            .with_category(ContentType::Restaurant)
            .with_category(ContentType::Lodging),
    )
    .await;

    let snapshot = feed.snapshot();
    assert_eq!(ids(&snapshot), vec!["food", "stay"]);
    // Judged on the raw page, not the narrowed one.
    assert!(snapshot.has_more);
    assert_eq!(source.listing_calls()[0].1.content_type_id, None);
}

#[tokio::test]
async fn unknown_category_alone_is_narrowed_locally() {
    let source = Arc::new(FakeSource::with_pages(vec![vec![
        record("spot", ContentType::TouristSpot),
        record("odd", ContentType::Unknown),
    ]]));
    let feed = controller(&source, 2);

    feed.set_filter(FilterState::default().with_category(ContentType::Unknown))
        .await;

    assert_eq!(ids(&feed.snapshot()), vec!["odd"]);
    assert_eq!(source.listing_calls()[0].1.content_type_id, None);
}

#[tokio::test]
async fn pets_only_filter_applies_to_appended_pages() {
    let source = Arc::new(
        FakeSource::with_pages(vec![spots(&["a", "b"]), spots(&["c", "d"])])
            .with_pet(policy("a", "동반가능", None))
            .with_pet(policy("c", "동반가능", None))
            .with_pet(policy("d", "동반불가", None)),
    );
    let feed = controller(&source, 2);

    feed.set_filter(FilterState::default().with_pets(Vec::<String>::new()))
        .await;
    assert_eq!(ids(&feed.snapshot()), vec!["a"]);
    assert_eq!(source.pet_calls(), 2);

    let outcome = feed.load_more().await;
    assert!(matches!(outcome, LoadOutcome::Applied { added: 1 }));
    assert_eq!(ids(&feed.snapshot()), vec!["a", "c"]);
    assert_eq!(source.pet_calls(), 4);
    assert_eq!(
        feed.cache().get("d"),
        Some(EnrichmentEntry::Found(policy("d", "동반불가", None)))
    );
}

#[tokio::test]
async fn pets_only_keeps_records_that_allow_pets() {
    let mut fake = FakeSource::with_pages(vec![spots(&["ok", "no", "none", "broken"])])
        .with_pet(policy("ok", "동반가능", None))
        .with_pet(policy("no", "동반불가", None));
    fake.failing_pets.insert("broken".to_string());
    let source = Arc::new(fake);
    let feed = controller(&source, 4);

    feed.set_filter(FilterState::default().with_pets(Vec::<String>::new()))
        .await;
    assert_eq!(ids(&feed.snapshot()), vec!["ok"]);
    assert_eq!(source.pet_calls(), 4);

    // Every outcome, failures included, is cached.
    feed.refresh().await;
    assert_eq!(source.pet_calls(), 4);
    assert_eq!(feed.cache().len(), 4);
}

#[tokio::test]
async fn size_tags_match_accompaniment_text() {
    let fake = FakeSource::with_pages(vec![spots(&["small", "large", "any"])])
        .with_pet(policy("small", "소형견 동반가능", None))
        .with_pet(policy("large", "동반가능", Some("대형견 가능, 목줄 필수")))
        .with_pet(policy("any", "전 구역 동반가능", None));
    let source = Arc::new(fake);
    let feed = controller(&source, 3);

    feed.set_filter(FilterState::default().with_pets(["소형"]))
        .await;
    assert_eq!(ids(&feed.snapshot()), vec!["small"]);

    feed.set_filter(FilterState::default().with_pets(["대형"]))
        .await;
    assert_eq!(ids(&feed.snapshot()), vec!["large"]);

    feed.set_filter(FilterState::default().with_pets(Vec::<String>::new()))
        .await;
    assert_eq!(ids(&feed.snapshot()), vec!["small", "large", "any"]);
}

#[tokio::test]
async fn enrichment_lookups_are_capped_per_batch() {
    let ids_owned: Vec<String> = (0..25).map(|i| format!("p{i:02}")).collect();
    let id_refs: Vec<&str> = ids_owned.iter().map(String::as_str).collect();
    let mut fake = FakeSource::with_pages(vec![spots(&id_refs)]);
    for id in &ids_owned {
        fake = fake.with_pet(policy(id, "동반가능", None));
    }
    let source = Arc::new(fake);
    let feed = controller(&source, 25);

    feed.set_filter(FilterState::default().with_pets(Vec::<String>::new()))
        .await;

    assert_eq!(source.pet_calls(), ENRICHMENT_FAN_OUT);
    assert_eq!(source.pet_peak.load(Ordering::SeqCst), ENRICHMENT_FAN_OUT);
    let snapshot = feed.snapshot();
    assert_eq!(snapshot.items.len(), ENRICHMENT_FAN_OUT);
    assert_eq!(snapshot.items[0].content_id, "p00");

    // The next batch hits the cache for the first twenty and looks up the rest.
    feed.refresh().await;
    assert_eq!(source.pet_calls(), 25);
    assert_eq!(feed.snapshot().items.len(), 25);
}

#[tokio::test]
async fn latest_sort_orders_each_batch() {
    let mut older = record("older", ContentType::TouristSpot);
    older.modified_time = Some("20230101000000".to_string());
    let mut newer = record("newer", ContentType::TouristSpot);
    newer.modified_time = Some("20240101000000".to_string());
    let undated = record("undated", ContentType::TouristSpot);
    let source = Arc::new(FakeSource::with_pages(vec![vec![undated, older, newer]]));
    let feed = controller(&source, 3);

    feed.set_filter(FilterState::default().with_sort(SortMode::Latest))
        .await;

    assert_eq!(ids(&feed.snapshot()), vec!["newer", "older", "undated"]);
    assert_eq!(source.listing_calls()[0].1.arrange, Some("C"));
}

#[tokio::test]
async fn filter_change_bumps_generation() {
    let source = Arc::new(FakeSource::with_pages(vec![spots(&["a"])]));
    let feed = controller(&source, 2);

    feed.refresh().await;
    let before = feed.snapshot().generation;
    feed.set_filter(FilterState::default().with_sort(SortMode::Name))
        .await;
    assert_eq!(feed.snapshot().generation, before + 1);
    assert_eq!(feed.snapshot().filter.sort, SortMode::Name);
}

#[tokio::test]
async fn set_query_issues_one_request_for_filter_and_search() {
    let source = Arc::new(FakeSource::default().with_search("궁", vec![spots(&["g"])]));
    let feed = controller(&source, 2);

    let outcome = feed
        .set_query(
            FilterState::default().with_category(ContentType::TouristSpot),
            Some("궁".to_string()),
        )
        .await;

    assert!(matches!(outcome, LoadOutcome::Applied { added: 1 }));
    let calls = source.listing_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0.as_deref(), Some("궁"));
    assert_eq!(calls[0].1.content_type_id.as_deref(), Some("12"));
}
