//! Open-Meteo geocoding and forecast (no credential required).

use async_trait::async_trait;
use serde::Deserialize;

use super::{
    check_status, ForecastSource, GeoPlace, Geocoder, HourlySeries, SourceError, REQUEST_TIMEOUT,
};

const GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

pub struct OpenMeteo {
    client: reqwest::Client,
}

impl OpenMeteo {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for OpenMeteo {
    fn default() -> Self {
        Self::new()
    }
}

// --- Wire shapes ---

#[derive(Deserialize)]
struct GeoResponse {
    #[serde(default)]
    results: Vec<GeoHit>,
}

#[derive(Deserialize)]
struct GeoHit {
    name: Option<String>,
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    hourly: HourlySeries,
}

#[async_trait]
impl Geocoder for OpenMeteo {
    async fn search(&self, name: &str) -> Result<Option<GeoPlace>, SourceError> {
        let response = self
            .client
            .get(GEOCODING_URL)
            .query(&[("name", name), ("count", "1")])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(SourceError::transport)?;
        let response = check_status(response).await?;

        let body: GeoResponse = response.json().await.map_err(SourceError::transport)?;
        Ok(body.results.into_iter().next().map(|hit| GeoPlace {
            // The geocoder can omit the canonical name; fall back to what
            // the caller asked for.
            name: hit.name.unwrap_or_else(|| name.to_string()),
            latitude: hit.latitude,
            longitude: hit.longitude,
        }))
    }
}

#[async_trait]
impl ForecastSource for OpenMeteo {
    async fn forecast(
        &self,
        latitude: f64,
        longitude: f64,
        days: u8,
    ) -> Result<HourlySeries, SourceError> {
        let response = self
            .client
            .get(FORECAST_URL)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                (
                    "hourly",
                    "temperature_2m,precipitation_probability,weathercode".to_string(),
                ),
                ("forecast_days", days.to_string()),
                ("timezone", "auto".to_string()),
            ])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(SourceError::transport)?;
        let response = check_status(response).await?;

        let body: ForecastResponse = response.json().await.map_err(SourceError::transport)?;
        Ok(body.hourly)
    }
}
