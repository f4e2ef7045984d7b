//! Tests for pagination module

use super::*;
use crate::decode::{JsonDecoder, RecordDecoder};
use crate::error::{Error, Result};
use async_trait::async_trait;
use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use test_case::test_case;
use tokio_test::{assert_pending, assert_ready};

const HOST: &str = "https://school.instructure.com";

fn link_header(path: &str, page: u32, total: u32) -> String {
    let url = |p: u32| format!("<{HOST}{path}?page={p}&per_page=4>");
    let mut parts = vec![format!("{}; rel=\"current\"", url(page))];
    if page < total {
        parts.push(format!("{}; rel=\"next\"", url(page + 1)));
    }
    if page > 1 {
        parts.push(format!("{}; rel=\"prev\"", url(page - 1)));
    }
    parts.push(format!("{}; rel=\"first\"", url(1)));
    parts.push(format!("{}; rel=\"last\"", url(total)));
    parts.join(",")
}

// ============================================================================
// Link Header Tests
// ============================================================================

#[test]
fn test_link_set_parses_canonical_header() {
    let header = link_header("/api/v1/courses", 1, 45);
    let links = LinkSet::parse(&header).unwrap();

    assert_eq!(links.current.page, 1);
    assert_eq!(links.first.page, 1);
    assert_eq!(links.last.page, 45);
    assert_eq!(links.next.as_ref().map(|l| l.page), Some(2));
    assert!(links.prev.is_none());
    assert_eq!(links.total_pages(), 45);
    assert!(!links.is_last_page());
    assert_eq!(
        links.current.url,
        format!("{HOST}/api/v1/courses?page=1&per_page=4")
    );
}

#[test]
fn test_link_set_last_page_has_no_next() {
    let links = LinkSet::parse(&link_header("/api/v1/courses", 45, 45)).unwrap();
    assert!(links.is_last_page());
    assert_eq!(links.get(Relation::Prev).map(|l| l.page), Some(44));
    assert!(links.get(Relation::Next).is_none());
}

#[test]
fn test_link_set_tolerates_spacing_and_unquoted_rel() {
    let header = " < /api/v1/courses?page=3 > ; rel=current ,\
                  </api/v1/courses?page=1>;rel=\"first\",\
                  </api/v1/courses?page=9>; rel = \"last\"";
    let links = LinkSet::parse(header).unwrap();
    assert_eq!(links.current.page, 3);
    assert_eq!(links.current.url, "/api/v1/courses?page=3");
    assert_eq!(links.total_pages(), 9);
}

#[test]
fn test_link_set_ignores_unknown_relations() {
    let header = "</c?page=1>; rel=\"current\", </c?page=1>; rel=\"first\", \
                  </c?page=7>; rel=\"bookmark\", </c?page=2>; rel=\"last\"";
    let links = LinkSet::parse(header).unwrap();
    assert_eq!(links.total_pages(), 2);
}

#[test]
fn test_link_set_first_occurrence_wins() {
    let header = "</c?page=1>; rel=\"current\", </c?page=1>; rel=\"first\", \
                  </c?page=5>; rel=\"last\", </c?page=8>; rel=\"last\"";
    assert_eq!(LinkSet::parse(header).unwrap().total_pages(), 5);
}

#[test_case("</c?page=1>; rel=\"first\", </c?page=3>; rel=\"last\"", "current" ; "missing current")]
#[test_case("</c?page=1>; rel=\"current\", </c?page=3>; rel=\"last\"", "first" ; "missing first")]
#[test_case("</c?page=1>; rel=\"current\", </c?page=1>; rel=\"first\"", "last" ; "missing last")]
#[test_case("", "current" ; "empty header")]
fn test_link_set_missing_relation(header: &str, relation: &str) {
    match LinkSet::parse(header).unwrap_err() {
        Error::MissingPaginationRelation { relation: missing } => assert_eq!(missing, relation),
        other => panic!("unexpected error: {other}"),
    }
}

#[test_case("</c?per_page=10>; rel=\"current\"" ; "no page parameter")]
#[test_case("</c?page=two>; rel=\"current\"" ; "non numeric page")]
#[test_case("</c?page=-1>; rel=\"last\"" ; "negative page")]
fn test_link_set_malformed(header: &str) {
    let err = LinkSet::parse(header).unwrap_err();
    assert!(err.is_pagination_metadata());
    assert!(matches!(err, Error::MalformedPaginationMetadata { .. }));
}

#[test]
fn test_missing_relation_message() {
    let err = LinkSet::parse("</c?page=1>; rel=\"current\"").unwrap_err();
    assert_eq!(err.to_string(), "Missing pagination relation: rel=\"first\"");
}

#[test]
fn test_relation_names() {
    assert_eq!(Relation::from_name("NEXT"), Some(Relation::Next));
    assert_eq!(Relation::from_name("bookmark"), None);
    assert_eq!(Relation::Last.to_string(), "last");
}

#[test]
fn test_page_without_link_header() {
    let page = Page::new(1, None, "[]");
    assert!(matches!(
        page.links().unwrap_err(),
        Error::MissingPaginationRelation { .. }
    ));
    assert_eq!(page.index(), 0);
}

// ============================================================================
// Request Tests
// ============================================================================

#[test]
fn test_page_query_puts_pagination_keys_first() {
    let request = PaginationRequest::new("/api/v1/courses")
        .with_page_size(25)
        .option("include[]", "term")
        .option("state[]", "available");

    let query = request.page_query(3);
    assert_eq!(
        query,
        vec![
            ("page".to_string(), "3".to_string()),
            ("per_page".to_string(), "25".to_string()),
            ("include[]".to_string(), "term".to_string()),
            ("state[]".to_string(), "available".to_string()),
        ]
    );
}

#[test]
fn test_caller_cannot_override_pagination_keys() {
    let request = PaginationRequest::new("/api/v1/courses").with_options(vec![
        ("page".to_string(), "99".to_string()),
        ("per_page".to_string(), "1000".to_string()),
        ("search_term".to_string(), "bio".to_string()),
    ]);

    assert_eq!(request.query_options().len(), 1);
    let query = request.page_query(1);
    assert_eq!(query[0], ("page".to_string(), "1".to_string()));
    assert_eq!(query[1], ("per_page".to_string(), "10".to_string()));
    assert_eq!(query.len(), 3);
}

#[test]
fn test_zero_page_size_uses_default() {
    let request = PaginationRequest::new("/x").with_page_size(0);
    assert_eq!(request.page_size(), crate::types::DEFAULT_PAGE_SIZE);
}

// ============================================================================
// Run State Tests
// ============================================================================

#[test]
fn test_run_state_lifecycle() {
    let state = RunState::new();
    assert_eq!(state.phase(), RunPhase::Discovering);
    assert_eq!(state.total_pages(), None);

    state.begin_fetching(2);
    assert_eq!(state.phase(), RunPhase::Fetching);
    assert_eq!(state.total_pages(), Some(2));
    assert_eq!(state.pages_in_flight(), 2);

    assert!(!state.finish_unit());
    assert!(state.finish_unit());
    assert_eq!(state.phase(), RunPhase::Draining);
    assert_eq!(state.pages_in_flight(), 0);

    assert!(state.close());
    assert!(!state.close());
    assert!(state.is_closed());
}

#[test]
fn test_run_state_empty_collection_skips_fetching() {
    let state = RunState::new();
    state.begin_fetching(0);
    assert_eq!(state.phase(), RunPhase::Draining);
}

#[test]
fn test_unit_guard_counts_down() {
    let state = RunState::new();
    state.begin_fetching(1);
    {
        let _guard = run::UnitGuard::new(&state);
    }
    assert_eq!(state.pages_in_flight(), 0);
    assert_eq!(state.phase(), RunPhase::Draining);
}

// ============================================================================
// Cancel Token Tests
// ============================================================================

#[test]
fn test_cancel_token_wakes_waiters() {
    let token = CancelToken::new();
    let clone = token.clone();
    let mut waiter = tokio_test::task::spawn(clone.cancelled());

    assert_pending!(waiter.poll());
    assert!(!token.is_cancelled());

    token.cancel();
    assert!(waiter.is_woken());
    assert_ready!(waiter.poll());
    assert!(clone.is_cancelled());
}

#[test]
fn test_cancel_token_already_cancelled() {
    let token = CancelToken::new();
    token.cancel();
    token.cancel();
    let mut waiter = tokio_test::task::spawn(token.cancelled());
    assert_ready!(waiter.poll());
}

// ============================================================================
// Paginator Tests
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct Item {
    id: u64,
}

/// In-memory collection of `total_pages` pages with `per_page` items each
struct FakeSource {
    total_pages: u32,
    per_page: u64,
    failing: Vec<u32>,
    omit_links: bool,
    delay: Option<Duration>,
    fetched: Mutex<Vec<u32>>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeSource {
    fn new(total_pages: u32, per_page: u64) -> Self {
        Self {
            total_pages,
            per_page,
            failing: Vec::new(),
            omit_links: false,
            delay: None,
            fetched: Mutex::new(Vec::new()),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    fn failing(mut self, pages: &[u32]) -> Self {
        self.failing = pages.to_vec();
        self
    }

    fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn fetched(&self) -> Vec<u32> {
        let mut pages = self.fetched.lock().unwrap().clone();
        pages.sort_unstable();
        pages
    }
}

#[async_trait]
impl PageSource for FakeSource {
    async fn fetch_page(&self, request: &PaginationRequest, page: u32) -> Result<Page> {
        self.fetched.lock().unwrap().push(page);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(&page) {
            return Err(Error::RateLimitExceeded {
                remaining: Some(0.0),
            });
        }

        let records: Vec<_> = (0..self.per_page)
            .map(|i| json!({ "id": u64::from(page) * 1000 + i }))
            .collect();
        let links = (!self.omit_links)
            .then(|| link_header(request.base_path(), page, self.total_pages));
        Ok(Page::new(page, links, serde_json::to_vec(&records).unwrap()))
    }
}

fn paginator(source: &Arc<FakeSource>) -> Paginator<Item> {
    Paginator::new(
        source.clone(),
        Arc::new(JsonDecoder::<Item>::new()),
        PaginationRequest::new("/api/v1/courses").with_page_size(4),
    )
}

/// Group ids by page, keeping arrival order
fn by_page(items: &[Item]) -> BTreeMap<u64, Vec<u64>> {
    let mut pages: BTreeMap<u64, Vec<u64>> = BTreeMap::new();
    for item in items {
        pages.entry(item.id / 1000).or_default().push(item.id % 1000);
    }
    pages
}

fn recording_policy() -> (ErrorPolicy, Arc<Mutex<Vec<String>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let policy = ErrorPolicy::new(move |err| {
        sink.lock().unwrap().push(err.to_string());
        Ok(())
    });
    (policy, seen)
}

#[tokio::test]
async fn test_collects_every_item_of_every_page() {
    let source = Arc::new(FakeSource::new(45, 4));
    let items = paginator(&source)
        .start(ErrorPolicy::stop_on_error())
        .await
        .try_collect()
        .await
        .unwrap();

    assert_eq!(items.len(), 180);
    let pages = by_page(&items);
    assert_eq!(pages.len(), 45);
    for ids in pages.values() {
        assert_eq!(ids, &vec![0, 1, 2, 3]);
    }
    assert_eq!(source.fetched(), (1..=45).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_single_page_collection() {
    let source = Arc::new(FakeSource::new(1, 3));
    let mut stream = paginator(&source).start(ErrorPolicy::stop_on_error()).await;

    let mut ids = Vec::new();
    while let Some(item) = stream.next().await {
        ids.push(item.id);
    }
    assert_eq!(ids, vec![1000, 1001, 1002]);
    assert_eq!(stream.state().phase(), RunPhase::Closed);

    let summary = stream.outcome().unwrap().summary();
    assert_eq!(summary.total_pages, Some(1));
    assert_eq!(summary.items_delivered, 3);
}

#[tokio::test]
async fn test_zero_pages_yields_nothing() {
    let source = Arc::new(FakeSource::new(0, 4));
    let stream = paginator(&source).start(ErrorPolicy::stop_on_error()).await;
    let summary = stream.finish().await.unwrap();

    assert_eq!(summary.total_pages, Some(0));
    assert_eq!(summary.items_delivered, 0);
    assert_eq!(source.fetched(), vec![1]);
}

#[tokio::test]
async fn test_page_one_failure_reports_exactly_one_error() {
    let source = Arc::new(FakeSource::new(5, 4).failing(&[1]));
    let (policy, seen) = recording_policy();
    let items = paginator(&source)
        .start(policy)
        .await
        .try_collect()
        .await
        .unwrap();

    assert!(items.is_empty());
    assert_eq!(seen.lock().unwrap().len(), 1);
    assert_eq!(source.fetched(), vec![1]);
}

#[tokio::test]
async fn test_missing_link_header_stops_discovery() {
    let mut fake = FakeSource::new(3, 4);
    fake.omit_links = true;
    let source = Arc::new(fake);

    let run = paginator(&source).launch().await;
    assert_eq!(run.state().phase(), RunPhase::Draining);
    let err = run
        .into_stream(ErrorPolicy::stop_on_error(), 8)
        .try_collect()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingPaginationRelation { .. }));
}

#[tokio::test]
async fn test_continue_policy_keeps_other_pages() {
    let source = Arc::new(FakeSource::new(10, 4).failing(&[3, 7]));
    let (policy, seen) = recording_policy();
    let mut stream = paginator(&source).start(policy).await;

    let mut items = Vec::new();
    while let Some(item) = stream.next().await {
        items.push(item);
    }

    assert_eq!(items.len(), 32);
    let pages = by_page(&items);
    assert!(!pages.contains_key(&3));
    assert!(!pages.contains_key(&7));
    assert_eq!(seen.lock().unwrap().len(), 2);
    assert_eq!(stream.outcome().unwrap().summary().errors_tolerated, 2);
}

#[tokio::test]
async fn test_skip_rate_limited_policy() {
    let source = Arc::new(FakeSource::new(4, 2).failing(&[2]));
    let items = paginator(&source)
        .start(ErrorPolicy::skip_rate_limited())
        .await
        .try_collect()
        .await
        .unwrap();
    assert_eq!(items.len(), 6);
}

#[tokio::test]
async fn test_stop_policy_ends_run_with_reason() {
    let source = Arc::new(FakeSource::new(20, 4).failing(&[3]));
    let err = paginator(&source)
        .start(ErrorPolicy::stop_on_error())
        .await
        .try_collect()
        .await
        .unwrap_err();
    assert!(err.is_rate_limit());
}

#[tokio::test]
async fn test_no_items_observed_after_stop() {
    let source = Arc::new(FakeSource::new(6, 4).failing(&[2]));
    let mut stream = paginator(&source)
        .start(ErrorPolicy::stop_on_error())
        .await;

    while stream.next().await.is_some() {}
    assert!(matches!(stream.outcome(), Some(RunOutcome::Stopped { .. })));
    assert!(stream.next().await.is_none());
    assert!(stream.state().is_closed());
}

#[tokio::test]
#[should_panic(expected = "canvas pagination failed")]
async fn test_fail_fast_panics_in_consumer() {
    let source = Arc::new(FakeSource::new(3, 4).failing(&[2]));
    let _ = paginator(&source)
        .start(ErrorPolicy::fail_fast())
        .await
        .try_collect()
        .await;
}

#[tokio::test]
async fn test_decoder_panic_becomes_worker_error() {
    let source = Arc::new(FakeSource::new(3, 2));
    let decoder = |page: usize, body: &[u8]| -> Result<Vec<Item>> {
        if page == 1 {
            panic!("bad page body");
        }
        JsonDecoder::<Item>::new().decode(page, body)
    };
    let (policy, seen) = recording_policy();

    let items = Paginator::new(
        source.clone(),
        Arc::new(decoder),
        PaginationRequest::new("/api/v1/courses"),
    )
    .start(policy)
    .await
    .try_collect()
    .await
    .unwrap();

    assert_eq!(items.len(), 4);
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].contains("page 2"));
    assert!(seen[0].contains("bad page body"));
}

#[tokio::test]
async fn test_decode_error_carries_zero_based_tag() {
    let source = Arc::new(FakeSource::new(2, 2));
    let decoder = |page: usize, _body: &[u8]| -> Result<Vec<Item>> {
        Err(Error::decode(page, "unreadable"))
    };

    let err = Paginator::new(
        source.clone(),
        Arc::new(decoder),
        PaginationRequest::new("/api/v1/courses"),
    )
    .start(ErrorPolicy::stop_on_error())
    .await
    .try_collect()
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Decode { page: 0 | 1, .. }));
}

#[tokio::test]
async fn test_max_concurrency_bounds_fetches() {
    let source = Arc::new(FakeSource::new(12, 1).delay(Duration::from_millis(5)));
    let items = paginator(&source)
        .with_config(PaginatorConfig::default().with_max_concurrency(2))
        .start(ErrorPolicy::stop_on_error())
        .await
        .try_collect()
        .await
        .unwrap();

    assert_eq!(items.len(), 12);
    assert!(source.peak.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn test_cancel_stops_stream() {
    let source = Arc::new(FakeSource::new(30, 4).delay(Duration::from_millis(5)));
    let mut stream = paginator(&source)
        .with_config(PaginatorConfig::default().with_buffer_size(1))
        .start(ErrorPolicy::stop_on_error())
        .await;

    assert!(stream.next().await.is_some());
    stream.cancel();
    assert!(stream.next().await.is_none());
    assert!(matches!(stream.outcome(), Some(RunOutcome::Cancelled(_))));
    assert!(stream.finish().await.is_ok());
}

#[tokio::test]
async fn test_dropping_stream_closes_run() {
    let source = Arc::new(FakeSource::new(30, 4).delay(Duration::from_millis(5)));
    let run = paginator(&source).launch().await;
    let state = Arc::clone(&run.state);

    let stream = run.into_stream(ErrorPolicy::stop_on_error(), 1);
    drop(stream);

    tokio::time::timeout(Duration::from_secs(5), async {
        while !state.is_closed() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_launch_reports_page_count() {
    let source = Arc::new(FakeSource::new(3, 4));
    let run = paginator(&source).launch().await;
    assert_eq!(run.state().total_pages(), Some(3));
    assert_ne!(run.state().phase(), RunPhase::Discovering);
}
