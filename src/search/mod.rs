pub mod pagination;
pub mod providers;

pub use pagination::{has_next, has_previous, last_page, page_label, start_offset, PAGE_SIZE};

/// Image shown for results that carry neither a `cse_image` nor a `cse_thumbnail`.
pub const PLACEHOLDER_IMAGE: &str =
    "https://tacm.com/wp-content/uploads/2018/01/no-image-available.jpeg";

/// Search provider abstraction - the view only ever talks to this trait,
/// so tests can swap in a stub instead of hitting the network.
#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    /// Fetch one page of results. `start` is the 1-based offset of the first
    /// result, see [`start_offset`].
    async fn search(&self, query: &str, start: u64) -> Result<ResultPage, SearchError>;
}

/// One page of results as returned by the search engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultPage {
    /// Hits in the order the API returned them
    pub items: Vec<ResultItem>,
    /// Total number of results the engine reports for the query
    pub total_results: u64,
}

/// Individual search hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultItem {
    pub title: String,
    pub snippet: String,
    /// Canonical product URL, also used as the item's identity
    pub link: String,
    /// Resolved thumbnail URL (never empty, falls back to [`PLACEHOLDER_IMAGE`])
    pub image: String,
}

/// Search-related errors
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("No search results")]
    NoResults,

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Search task failed: {0}")]
    TaskFailed(String),

    #[error("Missing API credentials: set SOK_API_KEY and SOK_CX or edit the config file")]
    MissingCredentials,
}
