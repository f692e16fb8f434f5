//! NewsAPI article search (credential-gated).

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{Map, Value};

use super::{check_status, NewsSource, SourceError, REQUEST_TIMEOUT};

const EVERYTHING_URL: &str = "https://newsapi.org/v2/everything";
const PAGE_SIZE: u8 = 5;

pub struct NewsApi {
    api_key: Option<String>,
    client: reqwest::Client,
}

impl NewsApi {
    /// `api_key` is optional on purpose: the service runs without one, and
    /// news lookups fail softly until it is configured.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl NewsSource for NewsApi {
    async fn search(
        &self,
        query: &str,
        from_date: NaiveDate,
    ) -> Result<Map<String, Value>, SourceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(SourceError::CredentialMissing {
                name: "newsapi_key",
            })?;

        let from = from_date.to_string();
        let page_size = PAGE_SIZE.to_string();
        let response = self
            .client
            .get(EVERYTHING_URL)
            .query(&[
                ("q", query),
                ("from", from.as_str()),
                ("sortBy", "publishedAt"),
                ("pageSize", page_size.as_str()),
                ("language", "en"),
                ("apiKey", api_key),
            ])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(SourceError::transport)?;
        let response = check_status(response).await?;

        response.json().await.map_err(SourceError::transport)
    }
}
