//! Weather lookups: geocode the location, then fetch a short hourly
//! forecast around the target date.

use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate};
use serde_json::{json, Map, Value};
use tracing::info;

use super::ToolDefinition;
use crate::sources::{ForecastSource, Geocoder};
use crate::types::ToolOutcome;

/// Today plus tomorrow covers every `when` the tool accepts.
const FORECAST_DAYS: u8 = 2;

/// Arguments for one weather lookup, read tolerantly from a plan's open
/// args map: wrong-typed values count as absent.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherArgs {
    pub location: String,
    pub when: Option<String>,
}

impl WeatherArgs {
    pub fn from_map(args: &Map<String, Value>) -> Self {
        Self {
            location: args
                .get("location")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            when: args.get("when").and_then(Value::as_str).map(str::to_string),
        }
    }

    /// The date the answer should describe: today, or tomorrow when `when`
    /// mentions it (case-insensitive substring match).
    fn target_date(&self) -> NaiveDate {
        let today = Local::now().date_naive();
        match &self.when {
            Some(when) if when.to_lowercase().contains("tomorrow") => today + Duration::days(1),
            _ => today,
        }
    }
}

pub struct WeatherTool {
    geocoder: Arc<dyn Geocoder>,
    forecast: Arc<dyn ForecastSource>,
}

impl WeatherTool {
    pub fn new(geocoder: Arc<dyn Geocoder>, forecast: Arc<dyn ForecastSource>) -> Self {
        Self { geocoder, forecast }
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "weather".to_string(),
            description: "Weather via Open-Meteo for a location. 'when' accepts 'today'/'tomorrow'."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "location": {
                        "type": "string",
                        "description": "Place name to look up, e.g. 'Paris'"
                    },
                    "when": {
                        "type": "string",
                        "description": "'today' (default) or 'tomorrow'"
                    }
                },
                "required": ["location"]
            }),
        }
    }

    pub async fn run(&self, args: WeatherArgs) -> ToolOutcome {
        // An empty location could never geocode; skip the round trip.
        if args.location.trim().is_empty() {
            return ToolOutcome::failure("location_not_found");
        }
        info!(location = %args.location, when = ?args.when, "weather lookup");

        let place = match self.geocoder.search(&args.location).await {
            Ok(Some(place)) => place,
            Ok(None) => return ToolOutcome::failure("location_not_found"),
            Err(err) => return err.into_outcome(),
        };

        let series = match self
            .forecast
            .forecast(place.latitude, place.longitude, FORECAST_DAYS)
            .await
        {
            Ok(series) => series,
            Err(err) => return err.into_outcome(),
        };

        let mut payload = Map::new();
        payload.insert("location".to_string(), json!(place));
        payload.insert("forecast".to_string(), json!(series));
        payload.insert(
            "target_date".to_string(),
            Value::String(args.target_date().to_string()),
        );
        ToolOutcome::success(payload)
    }
}
