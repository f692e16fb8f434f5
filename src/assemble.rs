//! Result assembly.
//!
//! Turns a plan and its tool outcome into the `QueryResult` handed back to
//! callers. Rendering is deterministic: `tool` and `args` come from the
//! plan verbatim, `summary` is prose built from the outcome, and
//! `raw_tool_output` is a compact machine-readable subset (or the full
//! error envelope when the tool failed). Every plan and outcome pair
//! produces a valid Result with a non-empty summary.

use serde_json::{Map, Value};

use crate::types::{Plan, QueryResult, ToolError, ToolName, ToolOutcome};

/// Cap on articles carried into the summary and raw output.
const MAX_ARTICLES: usize = 5;

/// Build the final Result for one pipeline pass.
pub fn assemble(plan: Plan, outcome: ToolOutcome) -> QueryResult {
    let summary = render_summary(plan.tool, &outcome);
    let raw_tool_output = render_raw_output(plan.tool, &outcome);
    QueryResult {
        tool: plan.tool,
        args: plan.args,
        summary,
        raw_tool_output,
    }
}

/// The reserved direct-answer Result used at the boundary, for example
/// `reason = "empty_input"` or `reason = "agent_unavailable"`.
pub fn direct_answer_result(
    summary: impl Into<String>,
    reason: impl Into<String>,
    ok: bool,
) -> QueryResult {
    let mut args = Map::new();
    args.insert("reason".to_string(), Value::String(reason.into()));
    let mut raw = Map::new();
    raw.insert("ok".to_string(), Value::Bool(ok));
    QueryResult {
        tool: ToolName::DirectAnswer,
        args,
        summary: summary.into(),
        raw_tool_output: Some(raw),
    }
}

// --- Summary rendering ---

fn render_summary(tool: ToolName, outcome: &ToolOutcome) -> String {
    match outcome {
        ToolOutcome::Ok(payload) => match tool {
            ToolName::Weather => weather_summary(payload),
            ToolName::News => news_summary(payload),
            ToolName::Wiki => wiki_summary(payload),
            ToolName::DirectAnswer | ToolName::None => payload
                .get("answer")
                .and_then(Value::as_str)
                .unwrap_or("No answer provided by router.")
                .to_string(),
        },
        ToolOutcome::Err(error) => failure_summary(tool, error),
    }
}

fn failure_summary(tool: ToolName, error: &ToolError) -> String {
    match error {
        ToolError::Upstream { status, .. } => {
            format!("The {tool} tool failed upstream with HTTP status {status}.")
        }
        ToolError::Code { code, .. } => match code.as_str() {
            "location_not_found" => "I could not find that location.".to_string(),
            "query_missing" => "I need a search query or topic to look up news.".to_string(),
            "newsapi_key_missing" => {
                "News lookups are not configured: the NewsAPI key is missing.".to_string()
            }
            "topic_missing" => "I need a topic to look up.".to_string(),
            "not_found" => "I could not find a matching article.".to_string(),
            "unknown_tool" => "The plan named a tool I cannot run.".to_string(),
            "upstream_error" => format!("The {tool} tool could not reach its upstream service."),
            other => format!("The {tool} tool failed: {other}."),
        },
    }
}

fn weather_summary(payload: &Map<String, Value>) -> String {
    let name = payload
        .get("location")
        .and_then(|location| location.get("name"))
        .and_then(Value::as_str)
        .unwrap_or("the requested location");
    let target_date = payload
        .get("target_date")
        .and_then(Value::as_str)
        .unwrap_or("today");

    match day_stats(payload.get("forecast"), target_date) {
        Some(stats) => {
            let mut summary = format!(
                "Weather for {name} on {target_date}: temperatures from {:.1}°C to {:.1}°C",
                stats.temperature_min, stats.temperature_max
            );
            if let Some(precipitation) = stats.precipitation_max {
                summary.push_str(&format!(
                    ", chance of precipitation up to {precipitation:.0}%"
                ));
            }
            summary.push('.');
            summary
        }
        None => format!("Weather for {name} on {target_date}: no hourly data available."),
    }
}

fn news_summary(payload: &Map<String, Value>) -> String {
    let articles = top_articles(payload);
    if articles.is_empty() {
        return "No matching news articles found.".to_string();
    }

    let mut lines = vec!["Top headlines:".to_string()];
    for (index, article) in articles.iter().enumerate() {
        let title = article
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("(untitled)");
        match article.get("source").and_then(Value::as_str) {
            Some(source) => lines.push(format!("{}. {title} ({source})", index + 1)),
            None => lines.push(format!("{}. {title}", index + 1)),
        }
    }
    lines.join("\n")
}

fn wiki_summary(payload: &Map<String, Value>) -> String {
    let title = payload
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or("Unknown topic");
    let text = payload
        .get("extract")
        .and_then(Value::as_str)
        .or_else(|| payload.get("description").and_then(Value::as_str));
    match text {
        Some(text) => format!("{title}: {text}"),
        None => format!("{title}: no summary text available."),
    }
}

// --- Raw output rendering ---

fn render_raw_output(tool: ToolName, outcome: &ToolOutcome) -> Option<Map<String, Value>> {
    match outcome {
        // Failures expose the whole envelope so callers can read the code.
        ToolOutcome::Err(_) => Some(outcome.to_map()),
        ToolOutcome::Ok(payload) => match tool {
            ToolName::Weather => Some(weather_raw(payload)),
            ToolName::News => {
                let articles = top_articles(payload).into_iter().map(Value::Object);
                let mut map = Map::new();
                map.insert("articles".to_string(), Value::Array(articles.collect()));
                Some(map)
            }
            ToolName::Wiki => Some(wiki_raw(payload)),
            ToolName::DirectAnswer | ToolName::None => None,
        },
    }
}

fn weather_raw(payload: &Map<String, Value>) -> Map<String, Value> {
    let mut map = Map::new();
    if let Some(target_date) = payload.get("target_date") {
        map.insert("target_date".to_string(), target_date.clone());
    }
    if let Some(location) = payload.get("location") {
        map.insert("location".to_string(), location.clone());
    }

    let target_date = payload
        .get("target_date")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if let Some(stats) = day_stats(payload.get("forecast"), target_date) {
        map.insert(
            "temperature_min".to_string(),
            Value::from(stats.temperature_min),
        );
        map.insert(
            "temperature_max".to_string(),
            Value::from(stats.temperature_max),
        );
        if let Some(precipitation) = stats.precipitation_max {
            map.insert("precipitation_max".to_string(), Value::from(precipitation));
        }
    }
    map
}

fn wiki_raw(payload: &Map<String, Value>) -> Map<String, Value> {
    let mut map = Map::new();
    for key in ["title", "extract", "description"] {
        if let Some(value) = payload.get(key) {
            map.insert(key.to_string(), value.clone());
        }
    }
    map
}

/// Normalized view of the top articles: `{title, source, url,
/// published_at}`, with `source` flattened to the source name.
fn top_articles(payload: &Map<String, Value>) -> Vec<Map<String, Value>> {
    let Some(articles) = payload.get("articles").and_then(Value::as_array) else {
        return Vec::new();
    };

    articles
        .iter()
        .take(MAX_ARTICLES)
        .map(|article| {
            let mut entry = Map::new();
            if let Some(title) = article.get("title").and_then(Value::as_str) {
                entry.insert("title".to_string(), Value::String(title.to_string()));
            }
            if let Some(source) = article
                .get("source")
                .and_then(|source| source.get("name"))
                .and_then(Value::as_str)
            {
                entry.insert("source".to_string(), Value::String(source.to_string()));
            }
            if let Some(url) = article.get("url").and_then(Value::as_str) {
                entry.insert("url".to_string(), Value::String(url.to_string()));
            }
            if let Some(published) = article.get("publishedAt").and_then(Value::as_str) {
                entry.insert(
                    "published_at".to_string(),
                    Value::String(published.to_string()),
                );
            }
            entry
        })
        .collect()
}

// --- Day statistics ---

struct DayStats {
    temperature_min: f64,
    temperature_max: f64,
    precipitation_max: Option<f64>,
}

/// Min/max temperature and peak precipitation probability across the hours
/// of `target_date`. `None` when the series holds no temperature samples
/// for that day.
fn day_stats(forecast: Option<&Value>, target_date: &str) -> Option<DayStats> {
    let forecast = forecast?;
    let time = forecast.get("time")?.as_array()?;
    let temperatures = forecast.get("temperature_2m").and_then(Value::as_array);
    let precipitation = forecast
        .get("precipitation_probability")
        .and_then(Value::as_array);

    let mut temperature_min = f64::INFINITY;
    let mut temperature_max = f64::NEG_INFINITY;
    let mut have_temperature = false;
    let mut precipitation_max: Option<f64> = None;

    for (index, stamp) in time.iter().enumerate() {
        let Some(stamp) = stamp.as_str() else { continue };
        if !stamp.starts_with(target_date) {
            continue;
        }
        if let Some(value) = temperatures
            .and_then(|values| values.get(index))
            .and_then(Value::as_f64)
        {
            temperature_min = temperature_min.min(value);
            temperature_max = temperature_max.max(value);
            have_temperature = true;
        }
        if let Some(value) = precipitation
            .and_then(|values| values.get(index))
            .and_then(Value::as_f64)
        {
            precipitation_max = Some(precipitation_max.map_or(value, |max| max.max(value)));
        }
    }

    have_temperature.then_some(DayStats {
        temperature_min,
        temperature_max,
        precipitation_max,
    })
}
