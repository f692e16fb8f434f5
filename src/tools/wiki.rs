//! Encyclopedia lookups: search, take the best hit, fetch its summary.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::info;

use super::ToolDefinition;
use crate::sources::WikiSource;
use crate::types::ToolOutcome;

/// Arguments for one encyclopedia lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct WikiArgs {
    pub topic: String,
}

impl WikiArgs {
    pub fn from_map(args: &Map<String, Value>) -> Self {
        Self {
            topic: args
                .get("topic")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        }
    }
}

pub struct WikiTool {
    source: Arc<dyn WikiSource>,
}

impl WikiTool {
    pub fn new(source: Arc<dyn WikiSource>) -> Self {
        Self { source }
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "wiki".to_string(),
            description: "Wikipedia summary for a topic.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "topic": {
                        "type": "string",
                        "description": "Topic to look up"
                    }
                },
                "required": ["topic"]
            }),
        }
    }

    pub async fn run(&self, args: WikiArgs) -> ToolOutcome {
        if args.topic.trim().is_empty() {
            return ToolOutcome::failure("topic_missing");
        }
        info!(topic = %args.topic, "wiki lookup");

        let titles = match self.source.search(&args.topic).await {
            Ok(titles) => titles,
            Err(err) => return err.into_outcome(),
        };
        let Some(title) = titles.into_iter().next() else {
            return ToolOutcome::failure("not_found");
        };

        // The summary body (title, extract, description, ...) becomes the
        // payload as-is.
        match self.source.summary(&title).await {
            Ok(body) => ToolOutcome::success(body),
            Err(err) => err.into_outcome(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::sources::SourceError;

    fn rt() -> tokio::runtime::Runtime {
        tokio::runtime::Runtime::new().unwrap()
    }

    struct StubWiki {
        titles: Vec<String>,
        summary_status: Option<u16>,
        search_calls: AtomicUsize,
        summary_titles: Mutex<Vec<String>>,
    }

    impl StubWiki {
        fn with_titles(titles: &[&str]) -> Self {
            Self {
                titles: titles.iter().map(|t| t.to_string()).collect(),
                summary_status: None,
                search_calls: AtomicUsize::new(0),
                summary_titles: Mutex::new(Vec::new()),
            }
        }

        fn failing_summary(titles: &[&str], status: u16) -> Self {
            let mut stub = Self::with_titles(titles);
            stub.summary_status = Some(status);
            stub
        }
    }

    #[async_trait]
    impl WikiSource for StubWiki {
        async fn search(&self, _topic: &str) -> Result<Vec<String>, SourceError> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.titles.clone())
        }

        async fn summary(&self, title: &str) -> Result<Map<String, Value>, SourceError> {
            self.summary_titles.lock().unwrap().push(title.to_string());
            if let Some(status) = self.summary_status {
                return Err(SourceError::Status {
                    status,
                    text: "no such page".to_string(),
                });
            }
            let mut body = Map::new();
            body.insert("title".to_string(), Value::String(title.to_string()));
            body.insert(
                "extract".to_string(),
                Value::String("A systems programming language.".to_string()),
            );
            Ok(body)
        }
    }

    fn topic_args(topic: &str) -> WikiArgs {
        let mut map = Map::new();
        map.insert("topic".to_string(), Value::String(topic.to_string()));
        WikiArgs::from_map(&map)
    }

    #[test]
    fn missing_topic_fails_without_searching() {
        let source = Arc::new(StubWiki::with_titles(&["Rust"]));
        let tool = WikiTool::new(source.clone());

        let outcome = rt().block_on(tool.run(WikiArgs::from_map(&Map::new())));

        assert_eq!(outcome.error_code(), Some("topic_missing"));
        assert_eq!(source.search_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn no_hits_reports_not_found() {
        let tool = WikiTool::new(Arc::new(StubWiki::with_titles(&[])));
        let outcome = rt().block_on(tool.run(topic_args("gibberishium")));
        assert_eq!(outcome.error_code(), Some("not_found"));
    }

    #[test]
    fn first_hit_wins_and_body_merges() {
        let source = Arc::new(StubWiki::with_titles(&[
            "Rust (programming language)",
            "Rust",
        ]));
        let tool = WikiTool::new(source.clone());

        let outcome = rt().block_on(tool.run(topic_args("rust language")));

        let payload = outcome.payload().unwrap();
        assert_eq!(payload["title"], Value::from("Rust (programming language)"));
        assert_eq!(
            payload["extract"],
            Value::from("A systems programming language.")
        );
        assert_eq!(
            source.summary_titles.lock().unwrap().as_slice(),
            ["Rust (programming language)".to_string()]
        );
    }

    #[test]
    fn summary_failure_surfaces_status_and_text() {
        let tool = WikiTool::new(Arc::new(StubWiki::failing_summary(&["Rust"], 404)));
        let outcome = rt().block_on(tool.run(topic_args("rust")));
        let map = outcome.to_map();
        assert_eq!(map["ok"], Value::Bool(false));
        assert_eq!(map["status"], Value::from(404));
        assert_eq!(map["text"], Value::from("no such page"));
    }
}
