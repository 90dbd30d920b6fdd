//! Common test utilities: a scripted search provider and result fixtures

#![allow(dead_code)]

use sok::search::{ResultItem, ResultPage, SearchError, SearchProvider, PLACEHOLDER_IMAGE};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Search provider that answers from a queue and records every call
pub struct StubProvider {
    responses: Mutex<VecDeque<Result<ResultPage, SearchError>>>,
    calls: Mutex<Vec<(String, u64)>>,
}

impl StubProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Queue the answer for the next call
    pub fn push(&self, response: Result<ResultPage, SearchError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// `(query, start)` of every call so far
    pub fn calls(&self) -> Vec<(String, u64)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn starts(&self) -> Vec<u64> {
        self.calls().into_iter().map(|(_, start)| start).collect()
    }
}

#[async_trait::async_trait]
impl SearchProvider for StubProvider {
    async fn search(&self, query: &str, start: u64) -> Result<ResultPage, SearchError> {
        self.calls.lock().unwrap().push((query.to_string(), start));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(SearchError::NoResults))
    }
}

/// A result item with the placeholder image
pub fn item(title: &str, link: &str) -> ResultItem {
    ResultItem {
        title: title.to_string(),
        snippet: format!("{title} snippet"),
        link: link.to_string(),
        image: PLACEHOLDER_IMAGE.to_string(),
    }
}

/// A page of `count` items reporting `total` results overall
pub fn page(count: usize, total: u64) -> ResultPage {
    ResultPage {
        items: (1..=count)
            .map(|n| item(&format!("Set {n}"), &format!("https://x/{n}")))
            .collect(),
        total_results: total,
    }
}
