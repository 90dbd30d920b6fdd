use crate::config::Config;
use crate::search::{ResultItem, ResultPage, SearchError, SearchProvider, PLACEHOLDER_IMAGE};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

/// Google Custom Search JSON API provider
///
/// Needs an API key (`key`) and a programmable search engine id (`cx`).
/// Every query is restricted to a single site through `siteSearch`.
/// Documentation: https://developers.google.com/custom-search/v1/reference/rest/v1/cse/list
pub struct GoogleSearchProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    cx: String,
    site_search: String,
}

impl GoogleSearchProvider {
    /// Default API endpoint
    pub const ENDPOINT: &'static str = "https://www.googleapis.com/customsearch/v1";

    /// Create a provider from the loaded configuration
    pub fn new(config: &Config) -> Result<Self, SearchError> {
        if config.api_key.trim().is_empty() || config.cx.trim().is_empty() {
            tracing::warn!("search credentials not configured, searches will fail");
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config
                .endpoint
                .clone()
                .unwrap_or_else(|| Self::ENDPOINT.to_string()),
            api_key: config.api_key.trim().to_string(),
            cx: config.cx.trim().to_string(),
            site_search: config.site_search.clone(),
        })
    }

    /// Query parameters for one request, in the order they are sent
    fn query_params(&self, query: &str, start: u64) -> Vec<(&'static str, String)> {
        vec![
            ("q", query.to_string()),
            ("key", self.api_key.clone()),
            ("cx", self.cx.clone()),
            ("siteSearch", self.site_search.clone()),
            ("start", start.to_string()),
        ]
    }
}

#[async_trait::async_trait]
impl SearchProvider for GoogleSearchProvider {
    async fn search(&self, query: &str, start: u64) -> Result<ResultPage, SearchError> {
        if self.api_key.is_empty() || self.cx.is_empty() {
            return Err(SearchError::MissingCredentials);
        }

        tracing::debug!(
            query = %query,
            start,
            site = %self.site_search,
            "performing google custom search"
        );

        let response = self
            .client
            .get(&self.endpoint)
            .query(&self.query_params(query, start))
            .send()
            .await
            .map_err(hide_url)?;

        let status = response.status();
        let body = response.text().await.map_err(hide_url)?;

        if !status.is_success() {
            tracing::warn!(
                status = %status,
                error = %crate::logging::redact_secrets(&body),
                "google custom search api error"
            );

            return Err(status_error(status, &body));
        }

        let page = parse_response(&body)?;

        tracing::debug!(
            query = %query,
            start,
            result_count = page.items.len(),
            total_results = page.total_results,
            "google custom search completed"
        );

        Ok(page)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse {
    #[serde(default)]
    items: Option<Vec<ApiItem>>,
    #[serde(default)]
    search_information: Option<SearchInformation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchInformation {
    total_results: String,
}

#[derive(Debug, Deserialize)]
struct ApiItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
    link: String,
    #[serde(default)]
    pagemap: Pagemap,
}

#[derive(Debug, Default, Deserialize)]
struct Pagemap {
    #[serde(default)]
    cse_image: Vec<PagemapImage>,
    #[serde(default)]
    cse_thumbnail: Vec<PagemapImage>,
}

#[derive(Debug, Deserialize)]
struct PagemapImage {
    #[serde(default)]
    src: Option<String>,
}

impl Pagemap {
    /// `cse_image` wins over `cse_thumbnail`; blank sources are skipped.
    fn image(&self) -> String {
        let first_src = |images: &[PagemapImage]| {
            images
                .first()
                .and_then(|img| img.src.as_deref())
                .filter(|src| !src.is_empty())
                .map(str::to_string)
        };

        first_src(&self.cse_image)
            .or_else(|| first_src(&self.cse_thumbnail))
            .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string())
    }
}

/// Decode a successful response body into a [`ResultPage`].
///
/// A body without items is an error, not an empty page.
pub fn parse_response(body: &str) -> Result<ResultPage, SearchError> {
    let response: ApiResponse =
        serde_json::from_str(body).map_err(|e| SearchError::Malformed(e.to_string()))?;

    let items = match response.items {
        Some(items) if !items.is_empty() => items,
        _ => return Err(SearchError::NoResults),
    };

    let info = response
        .search_information
        .ok_or_else(|| SearchError::Malformed("missing searchInformation".into()))?;
    let total_results = info.total_results.trim().parse::<u64>().map_err(|e| {
        SearchError::Malformed(format!(
            "invalid totalResults {:?}: {}",
            info.total_results, e
        ))
    })?;

    let items = items
        .into_iter()
        .map(|item| ResultItem {
            image: item.pagemap.image(),
            title: item.title,
            snippet: item.snippet,
            link: item.link,
        })
        .collect();

    Ok(ResultPage {
        items,
        total_results,
    })
}

/// reqwest errors embed the request URL, which carries the API key.
fn hide_url(err: reqwest::Error) -> SearchError {
    SearchError::Network(err.without_url())
}

/// Map a non-2xx response to the matching [`SearchError`].
fn status_error(status: StatusCode, body: &str) -> SearchError {
    match status.as_u16() {
        401 | 403 => SearchError::InvalidApiKey,
        429 => SearchError::RateLimitExceeded,
        code => SearchError::Api {
            status: code,
            message: api_error_message(body),
        },
    }
}

/// Pull `error.message` out of a Google error body, falling back to the raw text.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| json["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| crate::logging::redact_secrets(body.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            api_key: "AIzaTestKey".to_string(),
            cx: "engine-id".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn test_query_params() {
        let provider = GoogleSearchProvider::new(&test_config()).unwrap();
        let params = provider.query_params("lego city", 21);

        assert_eq!(
            params,
            vec![
                ("q", "lego city".to_string()),
                ("key", "AIzaTestKey".to_string()),
                ("cx", "engine-id".to_string()),
                ("siteSearch", "storochliten.se/".to_string()),
                ("start", "21".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_response_keeps_order_and_total() {
        let body = r#"{
            "items": [
                {"title": "Set A", "link": "https://x/1", "snippet": "a", "pagemap": {}},
                {"title": "Set B", "link": "https://x/2", "snippet": "b"}
            ],
            "searchInformation": {"totalResults": "42"}
        }"#;

        let page = parse_response(body).unwrap();
        assert_eq!(page.total_results, 42);
        let titles: Vec<_> = page.items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Set A", "Set B"]);
        assert_eq!(page.items[1].image, PLACEHOLDER_IMAGE);
    }

    #[test]
    fn test_image_fallback_order() {
        let body = r#"{
            "items": [
                {"title": "both", "link": "https://x/1", "snippet": "",
                 "pagemap": {"cse_image": [{"src": "https://img/full"}],
                             "cse_thumbnail": [{"src": "https://img/thumb", "width": "100", "height": "80"}]}},
                {"title": "thumb only", "link": "https://x/2", "snippet": "",
                 "pagemap": {"cse_thumbnail": [{"src": "https://img/thumb"}]}},
                {"title": "blank image", "link": "https://x/3", "snippet": "",
                 "pagemap": {"cse_image": [{"src": ""}], "cse_thumbnail": [{"src": "https://img/t3"}]}},
                {"title": "none", "link": "https://x/4", "snippet": "", "pagemap": {"cse_image": []}}
            ],
            "searchInformation": {"totalResults": "4"}
        }"#;

        let page = parse_response(body).unwrap();
        let images: Vec<_> = page.items.iter().map(|i| i.image.as_str()).collect();
        assert_eq!(
            images,
            vec![
                "https://img/full",
                "https://img/thumb",
                "https://img/t3",
                PLACEHOLDER_IMAGE
            ]
        );
    }

    #[test]
    fn test_missing_items_is_no_results() {
        let body = r#"{"searchInformation": {"totalResults": "0"}}"#;
        let err = parse_response(body).unwrap_err();
        assert!(matches!(err, SearchError::NoResults));
        assert_eq!(err.to_string(), "No search results");

        let body = r#"{"items": [], "searchInformation": {"totalResults": "0"}}"#;
        assert!(matches!(parse_response(body), Err(SearchError::NoResults)));
    }

    #[test]
    fn test_malformed_bodies() {
        assert!(matches!(
            parse_response("<html>oops</html>"),
            Err(SearchError::Malformed(_))
        ));

        let no_info = r#"{"items": [{"title": "t", "link": "https://x/1"}]}"#;
        assert!(matches!(parse_response(no_info), Err(SearchError::Malformed(_))));

        let bad_total = r#"{"items": [{"title": "t", "link": "https://x/1"}],
                            "searchInformation": {"totalResults": "many"}}"#;
        let err = parse_response(bad_total).unwrap_err();
        assert!(err.to_string().contains("totalResults"));
    }

    #[test]
    fn test_status_error_mapping() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, ""),
            SearchError::InvalidApiKey
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, r#"{"error": {"message": "denied"}}"#),
            SearchError::InvalidApiKey
        ));
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, ""),
            SearchError::RateLimitExceeded
        ));

        let err = status_error(
            StatusCode::BAD_REQUEST,
            r#"{"error": {"code": 400, "message": "Invalid Value"}}"#,
        );
        assert_eq!(err.to_string(), "API error (400): Invalid Value");

        match status_error(StatusCode::BAD_GATEWAY, "upstream ?key=AIzaSecret123456 failed") {
            SearchError::Api { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "upstream ?key=***REDACTED*** failed");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_api_error_message() {
        let body = r#"{"error": {"code": 400, "message": "Request contains an invalid argument."}}"#;
        assert_eq!(
            api_error_message(body),
            "Request contains an invalid argument."
        );
        assert_eq!(api_error_message("  Bad Gateway \n"), "Bad Gateway");
    }

    #[tokio::test]
    async fn test_missing_credentials_short_circuits() {
        let provider = GoogleSearchProvider::new(&Config::default()).unwrap();
        let err = provider.search("lego", 1).await.unwrap_err();
        assert!(matches!(err, SearchError::MissingCredentials));
    }
}
