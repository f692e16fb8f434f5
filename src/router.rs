//! Plan resolution.
//!
//! `PlanRouter` asks the model which tool fits a question and parses the
//! reply into a `Plan`. The contract is total: whatever the model or the
//! network does, `resolve` hands back a usable Plan. Malformed output is
//! not retried; the raw text simply becomes a direct answer, which keeps
//! latency bounded and the caller's life simple.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::llm::LlmProvider;
use crate::types::{CompletionRequest, Plan};

/// Answer used when the model produced nothing usable at all.
const FALLBACK_ANSWER: &str = "I could not decide which tool to use.";

pub struct PlanRouter {
    provider: Arc<dyn LlmProvider>,
    model: String,
    max_depth: u32,
    max_tokens: u32,
}

impl PlanRouter {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        model: String,
        max_depth: u32,
        max_tokens: u32,
    ) -> Self {
        Self {
            provider,
            model,
            max_depth,
            max_tokens,
        }
    }

    /// The model this router resolves plans with.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn system_prompt(&self) -> String {
        format!(
            "You are a helpful router. Decide which tool to call based on the user's question. \
             Available tools: wiki, news, weather. \
             You may call tools up to {} times (though you normally only need one decision). \
             Return ONLY strict JSON on one line using this schema: \
             {{\"tool\": \"string\", \"args\": {{}}, \"reason\": \"string\"}}. \
             If no tool fits and the LLM should answer directly, use: \
             {{\"tool\": \"direct_answer\", \"args\": {{\"answer\": \"...\"}}, \"reason\": \"...\"}}.",
            self.max_depth
        )
    }

    fn build_request(&self, question: &str) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            system: self.system_prompt(),
            user: format!("Question: {question}\nReturn only the JSON object, no other text."),
            json_mode: true,
            max_tokens: self.max_tokens,
        }
    }

    /// Decide which tool to call for a question. Never fails: any
    /// completion or parse trouble resolves to a direct-answer fallback.
    pub async fn resolve(&self, question: &str) -> Plan {
        let request = self.build_request(question);

        info!(model = %self.model, provider = self.provider.name(), "resolving plan");
        let content = match self.provider.complete(&request).await {
            Ok(content) => content,
            Err(err) => {
                warn!(error = %err, "completion failed; falling back to direct answer");
                return Plan::direct_answer(
                    FALLBACK_ANSWER,
                    format!("fallback due to completion error: {err}"),
                );
            }
        };
        debug!(raw = %content, "router raw content");

        match parse_plan(&content) {
            Ok(plan) => {
                info!(tool = %plan.tool, reason = %plan.reason, "plan resolved");
                plan
            }
            Err(err) => {
                warn!(error = %err, "unparsable plan; falling back to direct answer");
                let answer = if content.is_empty() {
                    FALLBACK_ANSWER
                } else {
                    content.as_str()
                };
                Plan::direct_answer(answer, format!("fallback due to parse error: {err}"))
            }
        }
    }
}

fn parse_plan(content: &str) -> serde_json::Result<Plan> {
    // Empty output parses like the empty object, so the failure reads as
    // "missing field `tool`" rather than a bare EOF error.
    let text = if content.is_empty() { "{}" } else { content };
    serde_json::from_str(text)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::{bail, Result};
    use async_trait::async_trait;

    use super::*;
    use crate::types::ToolName;

    fn rt() -> tokio::runtime::Runtime {
        tokio::runtime::Runtime::new().unwrap()
    }

    struct StubProvider {
        /// `None` means the completion itself errors.
        reply: Option<&'static str>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl StubProvider {
        fn replying(reply: &'static str) -> Self {
            Self {
                reply: Some(reply),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for StubProvider {
        async fn complete(&self, request: &CompletionRequest) -> Result<String> {
            self.requests.lock().unwrap().push(request.clone());
            match self.reply {
                Some(reply) => Ok(reply.to_string()),
                None => bail!("connection reset by peer"),
            }
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    fn router(provider: StubProvider) -> PlanRouter {
        PlanRouter::new(Arc::new(provider), "test-model".to_string(), 1, 512)
    }

    #[test]
    fn valid_json_becomes_a_typed_plan() {
        let router = router(StubProvider::replying(
            r#"{"tool": "wiki", "args": {"topic": "Rust"}, "reason": "encyclopedic question"}"#,
        ));

        let plan = rt().block_on(router.resolve("What is Rust?"));

        assert_eq!(plan.tool, ToolName::Wiki);
        assert_eq!(plan.args["topic"], Value::from("Rust"));
        assert_eq!(plan.reason, "encyclopedic question");
    }

    #[test]
    fn request_is_json_mode_with_the_question_embedded() {
        let stub = Arc::new(StubProvider::replying(r#"{"tool": "none"}"#));
        let router = PlanRouter::new(stub.clone(), "test-model".to_string(), 1, 512);

        rt().block_on(router.resolve("What is Rust?"));

        let requests = stub.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert!(request.json_mode);
        assert_eq!(request.model, "test-model");
        assert!(request.user.contains("What is Rust?"));
        assert!(request.system.contains("wiki, news, weather"));
        assert!(request.system.contains("up to 1 times"));
    }

    #[test]
    fn non_json_text_becomes_the_answer() {
        let router = router(StubProvider::replying("The capital of France is Paris."));

        let plan = rt().block_on(router.resolve("capital of France?"));

        assert_eq!(plan.tool, ToolName::DirectAnswer);
        assert_eq!(
            plan.args["answer"],
            Value::from("The capital of France is Paris.")
        );
        assert!(plan.reason.starts_with("fallback due to parse error:"));
    }

    #[test]
    fn empty_output_gets_the_placeholder_answer() {
        let router = router(StubProvider::replying(""));

        let plan = rt().block_on(router.resolve("anything"));

        assert_eq!(plan.tool, ToolName::DirectAnswer);
        assert_eq!(plan.args["answer"], Value::from(FALLBACK_ANSWER));
    }

    #[test]
    fn json_missing_tool_falls_back_with_raw_text() {
        let raw = r#"{"args": {"topic": "Rust"}}"#;
        let router = router(StubProvider::replying(raw));

        let plan = rt().block_on(router.resolve("what is rust"));

        assert_eq!(plan.tool, ToolName::DirectAnswer);
        assert_eq!(plan.args["answer"], Value::from(raw));
    }

    #[test]
    fn unknown_tool_string_falls_back() {
        let raw = r#"{"tool": "get_wiki", "args": {}}"#;
        let router = router(StubProvider::replying(raw));

        let plan = rt().block_on(router.resolve("what is rust"));

        assert_eq!(plan.tool, ToolName::DirectAnswer);
        assert_eq!(plan.args["answer"], Value::from(raw));
    }

    #[test]
    fn completion_error_falls_back_instead_of_propagating() {
        let router = router(StubProvider::failing());

        let plan = rt().block_on(router.resolve("anything"));

        assert_eq!(plan.tool, ToolName::DirectAnswer);
        assert_eq!(plan.args["answer"], Value::from(FALLBACK_ANSWER));
        assert!(plan.reason.starts_with("fallback due to completion error:"));
    }
}
