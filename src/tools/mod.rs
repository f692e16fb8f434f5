//! Tool dispatch.
//!
//! The `ToolRouter` is a closed table: it matches on the plan's `ToolName`
//! tag, builds the handler's typed argument record from the plan's open
//! args map, and runs the handler. Dispatch is total — every failure mode
//! (missing argument, not-found, upstream trouble, unroutable tag) comes
//! back as an `{ok: false, ...}` envelope, never as an `Err` or a panic.
//!
//! The tool set is fixed by design; there is no open registration.

pub mod news;
pub mod weather;
pub mod wiki;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::types::{Plan, ToolName, ToolOutcome};

pub use news::NewsTool;
pub use weather::WeatherTool;
pub use wiki::WikiTool;

use news::NewsArgs;
use weather::WeatherArgs;
use wiki::WikiArgs;

/// Name, description and parameter schema for one callable tool, published
/// to clients at session start. Part of the wire contract: names and
/// schemas stay stable.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Routes a plan to the tool it names.
pub struct ToolRouter {
    weather: WeatherTool,
    news: NewsTool,
    wiki: WikiTool,
}

impl ToolRouter {
    pub fn new(weather: WeatherTool, news: NewsTool, wiki: WikiTool) -> Self {
        Self {
            weather,
            news,
            wiki,
        }
    }

    /// Definitions of the independently callable tools. `direct_answer` is
    /// a dispatch branch, not a callable tool, so it is not listed.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            self.weather.definition(),
            self.news.definition(),
            self.wiki.definition(),
        ]
    }

    /// Run the tool a plan names.
    pub async fn dispatch(&self, plan: &Plan) -> ToolOutcome {
        info!(tool = %plan.tool, "dispatching plan");
        let outcome = match plan.tool {
            ToolName::Weather => self.weather.run(WeatherArgs::from_map(&plan.args)).await,
            ToolName::News => self.news.run(NewsArgs::from_map(&plan.args)).await,
            ToolName::Wiki => self.wiki.run(WikiArgs::from_map(&plan.args)).await,
            ToolName::DirectAnswer => direct_answer(&plan.args),
            ToolName::None => unknown_tool(ToolName::None.as_str(), &plan.args),
        };
        info!(tool = %plan.tool, ok = outcome.is_ok(), "dispatch finished");
        outcome
    }

    /// Wire-level dispatch by raw tool name (the `POST /tools/{name}`
    /// route). Unknown names resolve to the `unknown_tool` envelope.
    pub async fn dispatch_named(&self, name: &str, args: &Map<String, Value>) -> ToolOutcome {
        match ToolName::parse(name) {
            Some(tool) => {
                let plan = Plan {
                    tool,
                    args: args.clone(),
                    reason: String::new(),
                };
                self.dispatch(&plan).await
            }
            None => unknown_tool(name, args),
        }
    }
}

fn direct_answer(args: &Map<String, Value>) -> ToolOutcome {
    let answer = args
        .get("answer")
        .and_then(Value::as_str)
        .filter(|answer| !answer.is_empty())
        .unwrap_or("No answer provided by router.");
    let mut payload = Map::new();
    payload.insert("answer".to_string(), Value::String(answer.to_string()));
    ToolOutcome::success(payload)
}

fn unknown_tool(name: &str, args: &Map<String, Value>) -> ToolOutcome {
    warn!(tool = name, "unroutable tool name; returning error envelope");
    let mut context = Map::new();
    context.insert("tool".to_string(), Value::String(name.to_string()));
    context.insert("args".to_string(), Value::Object(args.clone()));
    ToolOutcome::failure_with("unknown_tool", context)
}
