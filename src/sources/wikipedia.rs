//! English Wikipedia: title search plus the REST page-summary endpoint.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{check_status, SourceError, WikiSource, REQUEST_TIMEOUT};

const SEARCH_URL: &str = "https://en.wikipedia.org/w/api.php";
const SUMMARY_URL: &str = "https://en.wikipedia.org/api/rest_v1/page/summary";

pub struct Wikipedia {
    client: reqwest::Client,
}

impl Wikipedia {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for Wikipedia {
    fn default() -> Self {
        Self::new()
    }
}

// --- Wire shapes ---

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    query: SearchQuery,
}

#[derive(Deserialize, Default)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    title: String,
}

#[async_trait]
impl WikiSource for Wikipedia {
    async fn search(&self, topic: &str) -> Result<Vec<String>, SourceError> {
        let response = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", topic),
                ("format", "json"),
            ])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(SourceError::transport)?;
        let response = check_status(response).await?;

        let body: SearchResponse = response.json().await.map_err(SourceError::transport)?;
        Ok(body
            .query
            .search
            .into_iter()
            .map(|hit| hit.title)
            .collect())
    }

    async fn summary(&self, title: &str) -> Result<Map<String, Value>, SourceError> {
        // Titles with spaces are fine here: the URL parser percent-encodes
        // them and the endpoint redirects to the canonical page.
        let url = format!("{SUMMARY_URL}/{title}");
        let response = self
            .client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(SourceError::transport)?;
        let response = check_status(response).await?;

        response.json().await.map_err(SourceError::transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_response_yields_titles_in_order() {
        let body: SearchResponse = serde_json::from_str(
            r#"{"query": {"search": [
                {"ns": 0, "title": "Rust (programming language)", "pageid": 29414838},
                {"ns": 0, "title": "Rust", "pageid": 26477}
            ]}}"#,
        )
        .unwrap();
        let titles: Vec<String> = body.query.search.into_iter().map(|h| h.title).collect();
        assert_eq!(titles[0], "Rust (programming language)");
        assert_eq!(titles.len(), 2);
    }

    #[test]
    fn search_response_tolerates_missing_sections() {
        let body: SearchResponse = serde_json::from_str(r#"{"batchcomplete": ""}"#).unwrap();
        assert!(body.query.search.is_empty());
    }
}
