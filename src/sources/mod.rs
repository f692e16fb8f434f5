//! Upstream data sources behind trait seams.
//!
//! Each tool handler reaches the outside world through one of these traits,
//! so handlers can be tested against stubs. The reqwest implementations live
//! in the sibling modules; every request carries a 20 second timeout and is
//! never retried.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::ToolOutcome;

pub mod newsapi;
pub mod open_meteo;
pub mod wikipedia;

/// Deadline for any single upstream request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

// --- Errors ---

/// What can go wrong talking to an upstream service.
///
/// These never propagate past a tool handler: `into_outcome` turns each
/// variant into the corresponding `{ok: false, ...}` envelope.
#[derive(Debug, Error)]
pub enum SourceError {
    /// A required credential is not configured.
    #[error("missing credential: {name}")]
    CredentialMissing { name: &'static str },
    /// The upstream answered with a non-success status.
    #[error("upstream returned {status}: {text}")]
    Status { status: u16, text: String },
    /// The request produced no usable HTTP response (connect failure,
    /// timeout, undecodable body).
    #[error("transport error: {0}")]
    Transport(String),
}

impl SourceError {
    pub(crate) fn transport(err: reqwest::Error) -> Self {
        SourceError::Transport(err.to_string())
    }

    /// Render the failure as a tool envelope.
    pub fn into_outcome(self) -> ToolOutcome {
        match self {
            SourceError::CredentialMissing { name } => {
                ToolOutcome::failure(format!("{name}_missing"))
            }
            SourceError::Status { status, text } => ToolOutcome::upstream(status, text),
            SourceError::Transport(detail) => {
                let mut context = Map::new();
                context.insert("detail".to_string(), Value::String(detail));
                ToolOutcome::failure_with("upstream_error", context)
            }
        }
    }
}

/// Pass a successful response through, turn anything else into
/// `SourceError::Status` with the body text preserved.
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let text = response.text().await.unwrap_or_default();
        Err(SourceError::Status {
            status: status.as_u16(),
            text,
        })
    }
}

// --- Geocoding ---

/// One resolved place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPlace {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve a place name to its best match, `None` when nothing matches.
    async fn search(&self, name: &str) -> Result<Option<GeoPlace>, SourceError>;
}

// --- Forecast ---

/// Hourly forecast series, parallel arrays indexed by `time`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HourlySeries {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m: Vec<f64>,
    #[serde(default)]
    pub precipitation_probability: Vec<f64>,
    #[serde(default)]
    pub weathercode: Vec<i64>,
}

#[async_trait]
pub trait ForecastSource: Send + Sync {
    /// Fetch `days` days of hourly forecast for a coordinate.
    async fn forecast(
        &self,
        latitude: f64,
        longitude: f64,
        days: u8,
    ) -> Result<HourlySeries, SourceError>;
}

// --- News ---

#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Article search from `from_date` (UTC) to now, newest first, capped
    /// at the source's page size. Returns the upstream response body.
    async fn search(
        &self,
        query: &str,
        from_date: NaiveDate,
    ) -> Result<Map<String, Value>, SourceError>;
}

// --- Encyclopedia ---

#[async_trait]
pub trait WikiSource: Send + Sync {
    /// Title search; best matches first.
    async fn search(&self, topic: &str) -> Result<Vec<String>, SourceError>;

    /// Page summary body for an exact title.
    async fn summary(&self, title: &str) -> Result<Map<String, Value>, SourceError>;
}
