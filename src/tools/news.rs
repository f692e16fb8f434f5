//! News lookups through NewsAPI, windowed to recent days.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::{json, Map, Value};
use tracing::info;

use super::ToolDefinition;
use crate::sources::NewsSource;
use crate::types::ToolOutcome;

/// Widest accepted search window. Arbitrary plan args must not be able to
/// overflow the date arithmetic below.
const MAX_FRESHNESS_DAYS: i64 = 3650;

/// Arguments for one news search, read tolerantly from a plan's open args
/// map: wrong-typed values count as absent.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsArgs {
    pub query: Option<String>,
    pub topic: Option<String>,
    pub freshness_days: Option<i64>,
}

impl NewsArgs {
    pub fn from_map(args: &Map<String, Value>) -> Self {
        Self {
            query: args
                .get("query")
                .and_then(Value::as_str)
                .map(str::to_string),
            topic: args
                .get("topic")
                .and_then(Value::as_str)
                .map(str::to_string),
            freshness_days: args.get("freshness_days").and_then(Value::as_i64),
        }
    }

    /// `query`, falling back to `topic`; empty strings count as absent.
    fn effective_query(&self) -> Option<&str> {
        [self.query.as_deref(), self.topic.as_deref()]
            .into_iter()
            .flatten()
            .find(|candidate| !candidate.is_empty())
    }
}

pub struct NewsTool {
    source: Arc<dyn NewsSource>,
    default_freshness_days: i64,
}

impl NewsTool {
    pub fn new(source: Arc<dyn NewsSource>, default_freshness_days: i64) -> Self {
        Self {
            source,
            default_freshness_days,
        }
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "news".to_string(),
            description: "Topical news via NewsAPI. Requires a NewsAPI key.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search phrase"
                    },
                    "freshness_days": {
                        "type": "integer",
                        "description": "How many days back to search",
                        "default": 3
                    },
                    "topic": {
                        "type": "string",
                        "description": "Fallback search phrase when 'query' is absent"
                    }
                },
                "required": []
            }),
        }
    }

    pub async fn run(&self, args: NewsArgs) -> ToolOutcome {
        let Some(query) = args.effective_query() else {
            let mut received = Map::new();
            received.insert(
                "topic".to_string(),
                match &args.topic {
                    Some(topic) => Value::String(topic.clone()),
                    None => Value::Null,
                },
            );
            let mut context = Map::new();
            context.insert("received_args".to_string(), Value::Object(received));
            return ToolOutcome::failure_with("query_missing", context);
        };

        let freshness = args
            .freshness_days
            .unwrap_or(self.default_freshness_days)
            .clamp(0, MAX_FRESHNESS_DAYS);
        let from_date = Utc::now().date_naive() - Duration::days(freshness);
        info!(query, freshness_days = freshness, "news search");

        match self.source.search(query, from_date).await {
            Ok(body) => ToolOutcome::success(body),
            Err(err) => err.into_outcome(),
        }
    }
}
