//! UI-agnostic search view state.
//!
//! `SearchView` owns the query, the current page, the last result set and the
//! error line. Every operation comes in two shapes: an `async` method that
//! performs the request inline, and a `begin_*` method returning a
//! [`PendingFetch`] that the caller runs wherever it likes and feeds back
//! through [`SearchView::apply`]. The TUI uses the second form so its event
//! loop never waits on the network.

use crate::search::{self, ResultItem, ResultPage, SearchError, SearchProvider};
use std::sync::Arc;

/// A submitted query must be longer than this many characters.
pub const MIN_QUERY_CHARS: usize = 2;

/// A page change only re-fetches when the query is longer than this.
///
/// Deliberately not the same as [`MIN_QUERY_CHARS`]; see DESIGN.md.
pub const PAGE_REFETCH_MIN_CHARS: usize = 3;

/// Errors raised by the view itself, before any request is made
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewError {
    #[error("Must type more than 2 characters")]
    QueryTooShort,
}

/// Why a fetch was started; decides what happens to the page on success
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// New search from the input box, lands on page 1
    Submit,
    /// Re-fetch after the page moved
    PageChange,
}

/// A request the view wants performed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFetch {
    pub kind: FetchKind,
    pub query: String,
    pub page: u32,
}

impl PendingFetch {
    /// API `start` offset for this request
    pub fn start(&self) -> u64 {
        search::start_offset(self.page)
    }

    /// Perform the request against `provider`
    pub async fn run(self, provider: &dyn SearchProvider) -> FetchOutcome {
        let result = provider.search(&self.query, self.start()).await;
        FetchOutcome {
            request: self,
            result,
        }
    }
}

/// Result of a [`PendingFetch`], ready to be applied to the view
#[derive(Debug)]
pub struct FetchOutcome {
    pub request: PendingFetch,
    pub result: Result<ResultPage, SearchError>,
}

/// Search view state
pub struct SearchView {
    provider: Arc<dyn SearchProvider>,
    query: String,
    page: u32,
    results: Option<ResultPage>,
    error: String,
    scroll_to_top: bool,
    in_flight: usize,
}

impl SearchView {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self {
            provider,
            query: String::new(),
            page: 1,
            results: None,
            error: String::new(),
            scroll_to_top: false,
            in_flight: 0,
        }
    }

    /// Shared handle to the search capability, for running fetches elsewhere
    pub fn provider(&self) -> Arc<dyn SearchProvider> {
        self.provider.clone()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Replace the query text (called on every edit)
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    /// Last successfully fetched page, if any search has succeeded yet
    pub fn results(&self) -> Option<&ResultPage> {
        self.results.as_ref()
    }

    pub fn items(&self) -> &[ResultItem] {
        self.results
            .as_ref()
            .map(|r| r.items.as_slice())
            .unwrap_or(&[])
    }

    pub fn total_results(&self) -> u64 {
        self.results.as_ref().map(|r| r.total_results).unwrap_or(0)
    }

    /// Current error line; empty when there is nothing to show
    pub fn error(&self) -> &str {
        &self.error
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    /// Pagination is shown once any result set exists
    pub fn show_pagination(&self) -> bool {
        self.results.is_some()
    }

    pub fn has_next(&self) -> bool {
        search::has_next(self.page, self.total_results())
    }

    pub fn has_previous(&self) -> bool {
        search::has_previous(self.page)
    }

    pub fn page_label(&self) -> String {
        search::page_label(self.page, self.total_results())
    }

    /// Returns true once after a page change, so the front end can scroll up
    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_to_top)
    }

    /// Validate the query and prepare a page-1 search.
    ///
    /// On a too-short query the error line is set and nothing is returned.
    pub fn begin_submit(&mut self) -> Option<PendingFetch> {
        let query = self.query.trim();
        if query.chars().count() <= MIN_QUERY_CHARS {
            tracing::debug!(query = %query, "query too short, not searching");
            self.error = ViewError::QueryTooShort.to_string();
            return None;
        }

        let fetch = PendingFetch {
            kind: FetchKind::Submit,
            query: query.to_string(),
            page: 1,
        };
        self.in_flight += 1;
        Some(fetch)
    }

    /// Move to `new_page` and, if the query is long enough, prepare a re-fetch.
    pub fn begin_page_change(&mut self, new_page: u32) -> Option<PendingFetch> {
        self.page = new_page.max(1);
        self.scroll_to_top = true;

        let query = self.query.trim();
        if query.chars().count() <= PAGE_REFETCH_MIN_CHARS {
            tracing::debug!(page = self.page, "page changed without re-fetch");
            return None;
        }

        let fetch = PendingFetch {
            kind: FetchKind::PageChange,
            query: query.to_string(),
            page: self.page,
        };
        self.in_flight += 1;
        Some(fetch)
    }

    /// "Next" control. Does nothing while it is disabled.
    pub fn begin_next_page(&mut self) -> Option<PendingFetch> {
        if !self.has_next() {
            return None;
        }
        self.begin_page_change(self.page.saturating_add(1))
    }

    /// "Previous" control. Does nothing while it is disabled.
    pub fn begin_previous_page(&mut self) -> Option<PendingFetch> {
        if !self.has_previous() {
            return None;
        }
        self.begin_page_change(self.page.saturating_sub(1).max(1))
    }

    /// Fold a finished fetch into the view.
    ///
    /// Outcomes are applied in arrival order; a slow response for an older
    /// page can overwrite a newer one.
    pub fn apply(&mut self, outcome: FetchOutcome) {
        self.in_flight = self.in_flight.saturating_sub(1);

        match outcome.result {
            Ok(page) => {
                tracing::debug!(
                    query = %outcome.request.query,
                    page = outcome.request.page,
                    items = page.items.len(),
                    total = page.total_results,
                    "search results applied"
                );
                self.results = Some(page);
                self.error.clear();
                if outcome.request.kind == FetchKind::Submit {
                    self.page = 1;
                }
            }
            Err(e) => {
                tracing::warn!(
                    query = %outcome.request.query,
                    page = outcome.request.page,
                    error = %crate::logging::redact_secrets(&e.to_string()),
                    "search failed"
                );
                // Previous results stay on screen
                self.error = e.to_string();
            }
        }
    }

    async fn perform(&mut self, fetch: Option<PendingFetch>) {
        if let Some(fetch) = fetch {
            let provider = self.provider.clone();
            let outcome = fetch.run(provider.as_ref()).await;
            self.apply(outcome);
        }
    }

    /// Submit the current query and wait for the result
    pub async fn submit_search(&mut self) {
        let fetch = self.begin_submit();
        self.perform(fetch).await;
    }

    /// Change page and wait for the re-fetch, if one is triggered
    pub async fn change_page(&mut self, new_page: u32) {
        let fetch = self.begin_page_change(new_page);
        self.perform(fetch).await;
    }

    pub async fn next_page(&mut self) {
        let fetch = self.begin_next_page();
        self.perform(fetch).await;
    }

    pub async fn previous_page(&mut self) {
        let fetch = self.begin_previous_page();
        self.perform(fetch).await;
    }
}
