// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use tracing::debug;
use url::Url;

use crate::error::{FetchError, LoadError};
use crate::http::HttpClient;
use crate::listing::{DEFAULT_ENDPOINT, FetchResult, Listing, PageQuery, fetch_page};
use crate::progress::{ProgressEvent, SharedProgressReporter};
use crate::state::{
    Action, INITIAL_STATE, PageState, filter_change_actions, merge_actions, reduce,
};

/// Options for a pager
#[derive(Debug, Clone)]
pub struct PagerOptions {
    /// Number of listings requested per page
    pub limit: u32,
    /// Listing endpoint URL
    pub endpoint: String,
    /// Content type filter at mount time (None = all)
    pub filter_type: Option<String>,
}

impl Default for PagerOptions {
    fn default() -> Self {
        Self {
            limit: INITIAL_STATE.limit,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            filter_type: None,
        }
    }
}

/// Where the pager is in its load cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    /// Nothing requested yet, or unmounted
    Idle,
    /// A request is in flight, or the last one failed
    Loading,
    /// Listings loaded and more pages are available
    LoadedWithMore,
    /// All listings for the current filter are loaded
    LoadedComplete,
}

/// A page request tied to the generation it was issued in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    generation: u64,
    query: PageQuery,
}

impl PageRequest {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn query(&self) -> &PageQuery {
        &self.query
    }
}

/// What a completed load did to the state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was appended to the listings
    Merged { received: usize },
    /// The server returned no listings; nothing changed
    Empty,
    /// The filter changed or the pager was unmounted while the request was
    /// in flight; the response was dropped
    Discarded,
    /// Listings were already present, so no initial load was needed
    Skipped,
}

/// Drives the listing fetcher from the page state and merges the results.
///
/// Every filter change and unmount bumps a generation counter. Responses
/// carry the generation of the request that produced them and are only
/// applied while it is still current.
pub struct Pager<C> {
    client: C,
    endpoint: Url,
    state: PageState,
    phase: LoadPhase,
    generation: u64,
    reporter: SharedProgressReporter,
}

impl<C: HttpClient> Pager<C> {
    /// Create a pager in its mount state
    pub fn new(
        client: C,
        options: &PagerOptions,
        reporter: SharedProgressReporter,
    ) -> Result<Self, FetchError> {
        if options.limit == 0 {
            return Err(FetchError::InvalidLimit);
        }
        let endpoint = Url::parse(&options.endpoint)?;
        let state = PageState {
            filter_type: options.filter_type.clone().filter(|f| !f.is_empty()),
            ..PageState::with_limit(options.limit)
        };

        Ok(Self {
            client,
            endpoint,
            state,
            phase: LoadPhase::Idle,
            generation: 0,
            reporter,
        })
    }

    pub fn state(&self) -> &PageState {
        &self.state
    }

    pub fn listings(&self) -> &[Listing] {
        &self.state.listings
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn has_more(&self) -> bool {
        self.state.load_more
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Apply a single action to the page state
    pub fn dispatch(&mut self, action: Action) {
        self.state = reduce(&self.state, action);
    }

    /// Initial load after mount
    pub async fn mount(&mut self) -> Result<LoadOutcome, LoadError> {
        self.load().await
    }

    /// Load the first page if no listings are present yet
    pub async fn load(&mut self) -> Result<LoadOutcome, LoadError> {
        if !self.state.listings.is_empty() {
            return Ok(LoadOutcome::Skipped);
        }
        self.run_load().await
    }

    /// Load the next page. Only valid while more pages are available.
    pub async fn load_more(&mut self) -> Result<LoadOutcome, LoadError> {
        if !self.state.load_more {
            return Err(LoadError::NoMorePages);
        }
        self.run_load().await
    }

    /// Switch the content type filter and load its first page
    pub async fn change_filter(
        &mut self,
        filter_type: Option<&str>,
    ) -> Result<LoadOutcome, LoadError> {
        self.reset_filter(filter_type);
        self.load().await
    }

    /// Switch the content type filter without loading.
    ///
    /// Clears offset and listings, then sets the new filter. Any request
    /// still in flight becomes stale.
    pub fn reset_filter(&mut self, filter_type: Option<&str>) {
        self.generation += 1;
        for action in filter_change_actions(filter_type) {
            self.dispatch(action);
        }
        self.phase = LoadPhase::Idle;

        debug!(
            filter_type = ?self.state.filter_type,
            generation = self.generation,
            "filter changed"
        );
        self.reporter.report(ProgressEvent::FilterChanged {
            filter_type: self.state.filter_type.clone(),
        });
    }

    /// Stop applying responses for requests issued so far
    pub fn unmount(&mut self) {
        self.generation += 1;
        self.phase = LoadPhase::Idle;
    }

    /// Start a load for the current state and generation
    pub fn begin_load(&mut self) -> PageRequest {
        let query = self.state.query();
        self.phase = LoadPhase::Loading;

        self.reporter.report(ProgressEvent::FetchingPage {
            filter_type: query.filter_type.clone(),
            offset: query.offset,
            limit: query.limit,
        });

        PageRequest {
            generation: self.generation,
            query,
        }
    }

    /// Apply the result of a request started with [`Pager::begin_load`].
    ///
    /// Failures leave the state untouched and the phase at `Loading`.
    pub fn complete_load(
        &mut self,
        request: PageRequest,
        result: Result<FetchResult, FetchError>,
    ) -> Result<LoadOutcome, LoadError> {
        if !self.is_current(&request) {
            return Ok(LoadOutcome::Discarded);
        }

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                self.reporter.report(ProgressEvent::FetchFailed {
                    error: e.to_string(),
                });
                return Err(e.into());
            }
        };

        let actions = merge_actions(&self.state, &page);
        if actions.is_empty() {
            self.phase = settled_phase(&self.state);
            self.reporter.report(ProgressEvent::EmptyPage {
                offset: request.query.offset,
            });
            return Ok(LoadOutcome::Empty);
        }

        // Generation was checked above and cannot change while `self` is borrowed
        for action in actions {
            self.dispatch(action);
        }

        self.phase = settled_phase(&self.state);
        self.reporter.report(ProgressEvent::PageMerged {
            received: page.items.len(),
            accumulated: self.state.listings.len(),
            total_count: page.total_count,
            load_more: self.state.load_more,
        });

        Ok(LoadOutcome::Merged {
            received: page.items.len(),
        })
    }

    async fn run_load(&mut self) -> Result<LoadOutcome, LoadError> {
        let request = self.begin_load();
        let result = fetch_page(&self.client, &self.endpoint, &request.query).await;
        self.complete_load(request, result)
    }

    fn is_current(&self, request: &PageRequest) -> bool {
        if request.generation == self.generation {
            return true;
        }

        debug!(
            stale = request.generation,
            current = self.generation,
            "discarding stale listing response"
        );
        self.reporter.report(ProgressEvent::StaleResponseDiscarded {
            generation: request.generation,
        });
        false
    }
}

fn settled_phase(state: &PageState) -> LoadPhase {
    if state.load_more {
        LoadPhase::LoadedWithMore
    } else if !state.listings.is_empty() {
        LoadPhase::LoadedComplete
    } else {
        LoadPhase::Loading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::http::HttpResponse;
    use crate::progress::{NoopReporter, ProgressReporter};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    struct MockHttpClient {
        responses: Mutex<VecDeque<(u16, String)>>,
        requested: Mutex<Vec<String>>,
    }

    impl MockHttpClient {
        fn new(responses: Vec<(u16, String)>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requested: Mutex::new(Vec::new()),
            }
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn get(&self, url: &str) -> Result<HttpResponse, reqwest::Error> {
            self.requested.lock().unwrap().push(url.to_string());
            let (status, body) = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected request");

            Ok(HttpResponse {
                status,
                body: Bytes::from(body),
            })
        }
    }

    #[derive(Default)]
    struct RecordingReporter {
        events: Mutex<Vec<ProgressEvent>>,
    }

    impl ProgressReporter for RecordingReporter {
        fn report(&self, event: ProgressEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn page_body(ids: std::ops::Range<u32>, total_count: u64) -> (u16, String) {
        let items: Vec<_> = ids
            .map(|id| serde_json::json!({"id": id, "title": format!("Episode {id}")}))
            .collect();
        let body = serde_json::json!({"items": items, "meta": {"total_count": total_count}});
        (200, body.to_string())
    }

    fn make_pager(responses: Vec<(u16, String)>) -> Pager<MockHttpClient> {
        Pager::new(
            MockHttpClient::new(responses),
            &PagerOptions::default(),
            NoopReporter::shared(),
        )
        .unwrap()
    }

    const BASE: &str = "https://npr-poc.herokuapp.com/api/v2/pages/";

    #[test]
    fn new_pager_is_idle_at_mount_state() {
        let pager = make_pager(vec![]);

        assert_eq!(pager.phase(), LoadPhase::Idle);
        assert_eq!(pager.state(), &PageState::default());
        assert_eq!(pager.generation(), 0);
        assert_eq!(pager.endpoint().as_str(), BASE);
    }

    #[test]
    fn new_rejects_invalid_endpoint() {
        let options = PagerOptions {
            endpoint: "not a url".to_string(),
            ..Default::default()
        };

        let result = Pager::new(MockHttpClient::new(vec![]), &options, NoopReporter::shared());

        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
    }

    #[test]
    fn new_rejects_zero_limit() {
        let options = PagerOptions {
            limit: 0,
            ..Default::default()
        };

        let result = Pager::new(MockHttpClient::new(vec![]), &options, NoopReporter::shared());

        assert!(matches!(result, Err(FetchError::InvalidLimit)));
    }

    /// Client whose requests never reach a server
    struct UnreachableClient {
        client: reqwest::Client,
    }

    #[async_trait]
    impl HttpClient for UnreachableClient {
        async fn get(&self, _url: &str) -> Result<HttpResponse, reqwest::Error> {
            self.client.get("http://").send().await?;
            unreachable!("request to an invalid URL succeeded")
        }
    }

    #[tokio::test]
    async fn transport_failure_leaves_state_loading() {
        let mut pager = Pager::new(
            UnreachableClient {
                client: reqwest::Client::new(),
            },
            &PagerOptions::default(),
            NoopReporter::shared(),
        )
        .unwrap();

        let err = pager.mount().await.unwrap_err();

        match err {
            LoadError::Fetch(ref e @ FetchError::Network { .. }) => assert!(e.is_network()),
            other => panic!("Expected Network error, got {other:?}"),
        }
        assert_eq!(pager.phase(), LoadPhase::Loading);
        assert!(pager.listings().is_empty());
        assert!(!pager.has_more());
    }

    #[tokio::test]
    async fn paginates_until_total_is_reached() {
        let mut pager = make_pager(vec![
            page_body(0..5, 12),
            page_body(5..10, 12),
            page_body(10..12, 12),
        ]);

        let outcome = pager.mount().await.unwrap();
        assert_eq!(outcome, LoadOutcome::Merged { received: 5 });
        assert_eq!(pager.listings().len(), 5);
        assert_eq!(pager.state().offset, 5);
        assert!(pager.has_more());
        assert_eq!(pager.phase(), LoadPhase::LoadedWithMore);

        pager.load_more().await.unwrap();
        assert_eq!(pager.listings().len(), 10);
        assert_eq!(pager.state().offset, 10);
        assert!(pager.has_more());

        pager.load_more().await.unwrap();
        assert_eq!(pager.listings().len(), 12);
        assert!(!pager.has_more());
        assert_eq!(pager.phase(), LoadPhase::LoadedComplete);

        assert_eq!(
            pager.client().requested(),
            vec![
                format!("{BASE}?limit=5"),
                format!("{BASE}?offset=5&limit=5"),
                format!("{BASE}?offset=10&limit=5"),
            ]
        );
    }

    #[tokio::test]
    async fn load_more_requires_more_pages() {
        let mut pager = make_pager(vec![page_body(0..3, 3)]);

        pager.mount().await.unwrap();
        assert_eq!(pager.phase(), LoadPhase::LoadedComplete);

        let result = pager.load_more().await;
        assert!(matches!(result, Err(LoadError::NoMorePages)));
        assert_eq!(pager.client().requested().len(), 1);
    }

    #[tokio::test]
    async fn load_skips_when_listings_present() {
        let mut pager = make_pager(vec![page_body(0..5, 12)]);

        pager.mount().await.unwrap();
        let outcome = pager.load().await.unwrap();

        assert_eq!(outcome, LoadOutcome::Skipped);
        assert_eq!(pager.client().requested().len(), 1);
    }

    #[tokio::test]
    async fn filter_change_resets_and_refetches() {
        let mut pager = make_pager(vec![
            page_body(0..5, 12),
            page_body(5..10, 12),
            page_body(100..104, 4),
        ]);

        pager.mount().await.unwrap();
        pager.load_more().await.unwrap();
        assert_eq!(pager.listings().len(), 10);

        pager.reset_filter(Some("podcasts.Show"));
        assert!(pager.listings().is_empty());
        assert_eq!(pager.state().offset, 0);
        assert_eq!(pager.phase(), LoadPhase::Idle);

        pager.load().await.unwrap();
        assert_eq!(pager.listings().len(), 4);
        assert_eq!(pager.listings()[0].title, "Episode 100");
        assert!(!pager.has_more());

        assert_eq!(
            pager.client().requested().last().unwrap(),
            &format!("{BASE}?type=podcasts.Show&limit=5")
        );
    }

    #[tokio::test]
    async fn change_filter_back_to_all_drops_type_parameter() {
        let mut pager = Pager::new(
            MockHttpClient::new(vec![page_body(0..2, 2), page_body(0..5, 12)]),
            &PagerOptions {
                filter_type: Some("podcasts.Episode".to_string()),
                ..Default::default()
            },
            NoopReporter::shared(),
        )
        .unwrap();

        pager.mount().await.unwrap();
        pager.change_filter(Some("")).await.unwrap();

        assert_eq!(pager.state().filter_type, None);
        assert_eq!(
            pager.client().requested(),
            vec![
                format!("{BASE}?type=podcasts.Episode&limit=5"),
                format!("{BASE}?limit=5"),
            ]
        );
    }

    #[tokio::test]
    async fn stale_response_after_filter_change_is_discarded() {
        let reporter = Arc::new(RecordingReporter::default());
        let mut pager = Pager::new(
            MockHttpClient::new(vec![page_body(0..5, 12)]),
            &PagerOptions::default(),
            reporter.clone(),
        )
        .unwrap();

        let request = pager.begin_load();
        let result = fetch_page(pager.client(), pager.endpoint(), request.query()).await;

        pager.reset_filter(Some("podcasts.Show"));
        let outcome = pager.complete_load(request, result).unwrap();

        assert_eq!(outcome, LoadOutcome::Discarded);
        assert!(pager.listings().is_empty());
        assert_eq!(pager.state().offset, 0);
        assert!(!pager.has_more());
        assert!(reporter.events.lock().unwrap().iter().any(|event| matches!(
            event,
            ProgressEvent::StaleResponseDiscarded { generation: 0 }
        )));
    }

    #[tokio::test]
    async fn response_after_unmount_is_discarded() {
        let mut pager = make_pager(vec![page_body(0..5, 12)]);

        let request = pager.begin_load();
        let result = fetch_page(pager.client(), pager.endpoint(), request.query()).await;

        pager.unmount();
        let outcome = pager.complete_load(request, result).unwrap();

        assert_eq!(outcome, LoadOutcome::Discarded);
        assert!(pager.listings().is_empty());
        assert_eq!(pager.phase(), LoadPhase::Idle);
    }

    #[tokio::test]
    async fn failed_fetch_leaves_state_loading() {
        let reporter = Arc::new(RecordingReporter::default());
        let mut pager = Pager::new(
            MockHttpClient::new(vec![
                (500, "Internal Server Error".to_string()),
                page_body(0..5, 12),
            ]),
            &PagerOptions::default(),
            reporter.clone(),
        )
        .unwrap();

        let result = pager.mount().await;

        match result {
            Err(LoadError::Fetch(FetchError::HttpStatus { status, .. })) => {
                assert_eq!(status, 500)
            }
            other => panic!("Expected HttpStatus error, got {other:?}"),
        }
        assert_eq!(pager.phase(), LoadPhase::Loading);
        assert!(pager.listings().is_empty());
        assert!(!pager.has_more());
        assert!(
            reporter
                .events
                .lock()
                .unwrap()
                .iter()
                .any(|event| matches!(event, ProgressEvent::FetchFailed { .. }))
        );

        // The pager keeps working after a failure
        pager.load().await.unwrap();
        assert_eq!(pager.listings().len(), 5);
        assert_eq!(pager.phase(), LoadPhase::LoadedWithMore);
    }

    #[tokio::test]
    async fn malformed_response_is_reported() {
        let mut pager = make_pager(vec![(200, r#"{"items": []}"#.to_string())]);

        let err = pager.mount().await.unwrap_err();

        assert!(matches!(err, LoadError::Fetch(ref e) if e.is_malformed()));
        assert_eq!(pager.phase(), LoadPhase::Loading);
    }

    #[tokio::test]
    async fn empty_page_keeps_load_more() {
        let mut pager = make_pager(vec![page_body(0..5, 12), page_body(0..0, 12)]);

        pager.mount().await.unwrap();
        let outcome = pager.load_more().await.unwrap();

        assert_eq!(outcome, LoadOutcome::Empty);
        assert_eq!(pager.listings().len(), 5);
        assert_eq!(pager.state().offset, 5);
        assert!(pager.has_more());
        assert_eq!(pager.phase(), LoadPhase::LoadedWithMore);
    }

    #[tokio::test]
    async fn empty_first_page_stays_loading() {
        let mut pager = make_pager(vec![page_body(0..0, 0)]);

        let outcome = pager.mount().await.unwrap();

        assert_eq!(outcome, LoadOutcome::Empty);
        assert!(pager.listings().is_empty());
        assert_eq!(pager.phase(), LoadPhase::Loading);
    }
}
