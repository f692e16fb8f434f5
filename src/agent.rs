//! Agent pipeline and the single-flight run guard.
//!
//! One question flows through three stages:
//!
//! ```text
//! question --resolve--> Plan --dispatch--> ToolOutcome --assemble--> QueryResult
//! ```
//!
//! The `Agent` is stateless across questions; nothing from one run is
//! visible to the next. The `RunGuard` owns the one shared agent handle
//! and serializes entire pipeline passes around it: the model session and
//! its tool backend do not support interleaved calls, so guarded runs are
//! strictly sequential while direct tool invocations stay concurrent.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::assemble::{assemble, direct_answer_result};
use crate::router::PlanRouter;
use crate::tools::ToolRouter;
use crate::types::QueryResult;

pub struct Agent {
    router: PlanRouter,
    tools: Arc<ToolRouter>,
}

impl Agent {
    pub fn new(router: PlanRouter, tools: Arc<ToolRouter>) -> Self {
        Self { router, tools }
    }

    /// The model this agent resolves plans with.
    pub fn model(&self) -> &str {
        self.router.model()
    }

    /// One full pipeline pass. Total: every question yields a Result.
    pub async fn run(&self, question: &str) -> QueryResult {
        let plan = self.router.resolve(question).await;
        let outcome = self.tools.dispatch(&plan).await;
        assemble(plan, outcome)
    }
}

/// Serialized access to the one shared agent handle.
///
/// The availability slot is separate from the run lock so health checks
/// and unavailable rejects never queue behind a running pipeline. Install
/// happens once at startup, teardown once at shutdown; in-flight runs
/// complete, later callers are rejected.
pub struct RunGuard {
    agent: RwLock<Option<Arc<Agent>>>,
    run_lock: Mutex<()>,
}

impl RunGuard {
    pub fn new() -> Self {
        Self {
            agent: RwLock::new(None),
            run_lock: Mutex::new(()),
        }
    }

    pub async fn install(&self, agent: Arc<Agent>) {
        *self.agent.write().await = Some(agent);
        info!("agent handle installed");
    }

    pub async fn teardown(&self) {
        *self.agent.write().await = None;
        info!("agent handle torn down");
    }

    pub async fn is_available(&self) -> bool {
        self.agent.read().await.is_some()
    }

    /// Run one guarded pipeline pass. Rejects immediately with the
    /// `agent_unavailable` Result when no handle is installed; otherwise
    /// callers queue in arrival order and execute one at a time.
    pub async fn run(&self, question: &str) -> QueryResult {
        let agent = match self.agent.read().await.as_ref() {
            Some(agent) => agent.clone(),
            None => {
                warn!("run rejected: no agent handle installed");
                return direct_answer_result("Agent not available", "agent_unavailable", false);
            }
        };

        let _running = self.run_lock.lock().await;
        agent.run(question).await
    }
}

impl Default for RunGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;
    use std::time::{Duration, Instant};

    use anyhow::Result;
    use async_trait::async_trait;
    use serde_json::{Map, Value};

    use super::*;
    use crate::llm::LlmProvider;
    use crate::sources::{
        ForecastSource, GeoPlace, Geocoder, HourlySeries, NewsSource, SourceError, WikiSource,
    };
    use crate::tools::{NewsTool, WeatherTool, WikiTool};
    use crate::types::{CompletionRequest, ToolName};

    fn rt() -> tokio::runtime::Runtime {
        tokio::runtime::Runtime::new().unwrap()
    }

    // Inert sources: the tests below route to direct answers or the wiki
    // stub only.
    struct NoGeo;

    #[async_trait]
    impl Geocoder for NoGeo {
        async fn search(&self, _name: &str) -> Result<Option<GeoPlace>, SourceError> {
            Ok(None)
        }
    }

    struct NoForecast;

    #[async_trait]
    impl ForecastSource for NoForecast {
        async fn forecast(
            &self,
            _latitude: f64,
            _longitude: f64,
            _days: u8,
        ) -> Result<HourlySeries, SourceError> {
            Ok(HourlySeries::default())
        }
    }

    struct NoNews;

    #[async_trait]
    impl NewsSource for NoNews {
        async fn search(
            &self,
            _query: &str,
            _from_date: chrono::NaiveDate,
        ) -> Result<Map<String, Value>, SourceError> {
            Ok(Map::new())
        }
    }

    struct CannedWiki;

    #[async_trait]
    impl WikiSource for CannedWiki {
        async fn search(&self, _topic: &str) -> Result<Vec<String>, SourceError> {
            Ok(vec!["Rust (programming language)".to_string()])
        }

        async fn summary(&self, title: &str) -> Result<Map<String, Value>, SourceError> {
            let mut body = Map::new();
            body.insert("title".to_string(), Value::String(title.to_string()));
            body.insert(
                "extract".to_string(),
                Value::String("A systems language.".to_string()),
            );
            Ok(body)
        }
    }

    fn test_tools() -> Arc<ToolRouter> {
        Arc::new(ToolRouter::new(
            WeatherTool::new(Arc::new(NoGeo), Arc::new(NoForecast)),
            NewsTool::new(Arc::new(NoNews), 3),
            WikiTool::new(Arc::new(CannedWiki)),
        ))
    }

    /// Replies after a pause, recording when each completion ran.
    struct SlowProvider {
        reply: &'static str,
        windows: StdMutex<Vec<(Instant, Instant)>>,
    }

    impl SlowProvider {
        fn new(reply: &'static str) -> Self {
            Self {
                reply,
                windows: StdMutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for SlowProvider {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
            let start = Instant::now();
            tokio::time::sleep(Duration::from_millis(50)).await;
            let end = Instant::now();
            self.windows.lock().unwrap().push((start, end));
            Ok(self.reply.to_string())
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    fn agent_with(provider: Arc<dyn LlmProvider>) -> Arc<Agent> {
        let router = PlanRouter::new(provider, "test-model".to_string(), 1, 512);
        Arc::new(Agent::new(router, test_tools()))
    }

    #[test]
    fn pipeline_runs_resolve_dispatch_assemble() {
        let provider = Arc::new(SlowProvider::new(
            r#"{"tool": "wiki", "args": {"topic": "rust"}, "reason": "encyclopedic"}"#,
        ));
        let agent = agent_with(provider);

        let result = rt().block_on(agent.run("What is Rust?"));

        assert_eq!(result.tool, ToolName::Wiki);
        assert_eq!(result.args["topic"], Value::from("rust"));
        assert!(result.summary.contains("A systems language."));
        let raw = result.raw_tool_output.unwrap();
        assert_eq!(raw["title"], Value::from("Rust (programming language)"));
    }

    #[test]
    fn guarded_runs_have_disjoint_execution_windows() {
        let rt = rt();
        rt.block_on(async {
            let provider = Arc::new(SlowProvider::new(
                r#"{"tool": "direct_answer", "args": {"answer": "hi"}}"#,
            ));
            let agent = agent_with(provider.clone());
            let guard = Arc::new(RunGuard::new());
            guard.install(agent).await;

            let first = tokio::spawn({
                let guard = guard.clone();
                async move { guard.run("one").await }
            });
            let second = tokio::spawn({
                let guard = guard.clone();
                async move { guard.run("two").await }
            });

            let first = first.await.unwrap();
            let second = second.await.unwrap();
            assert_eq!(first.summary, "hi");
            assert_eq!(second.summary, "hi");

            let windows = provider.windows.lock().unwrap();
            assert_eq!(windows.len(), 2);
            let disjoint = windows[0].1 <= windows[1].0 || windows[1].1 <= windows[0].0;
            assert!(disjoint, "guarded pipeline executions overlapped");
        });
    }

    #[test]
    fn empty_guard_rejects_immediately() {
        let rt = rt();
        rt.block_on(async {
            let guard = RunGuard::new();

            let result = guard.run("hello?").await;

            assert_eq!(result.tool, ToolName::DirectAnswer);
            assert_eq!(result.args["reason"], Value::from("agent_unavailable"));
            assert_eq!(result.summary, "Agent not available");
            assert_eq!(result.raw_tool_output.unwrap()["ok"], Value::Bool(false));
        });
    }

    #[test]
    fn teardown_rejects_later_callers() {
        let rt = rt();
        rt.block_on(async {
            let provider = Arc::new(SlowProvider::new(
                r#"{"tool": "direct_answer", "args": {"answer": "hi"}}"#,
            ));
            let guard = RunGuard::new();
            guard.install(agent_with(provider)).await;
            assert!(guard.is_available().await);

            guard.teardown().await;

            assert!(!guard.is_available().await);
            let result = guard.run("hello?").await;
            assert_eq!(result.args["reason"], Value::from("agent_unavailable"));
        });
    }
}
