//! Core data types used throughout curiobot.
//!
//! This module defines the routing plan, the uniform tool-outcome envelope,
//! and the final result shape that flow between all components.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// --- Tool Names ---

/// The fixed set of tools a plan may name.
///
/// `DirectAnswer` and `None` are pseudo-tools: the first carries an answer
/// produced without external data, the second means the router declined to
/// pick anything. Unknown strings fail deserialization, so an invalid tool
/// never travels past plan parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    Weather,
    News,
    Wiki,
    DirectAnswer,
    None,
}

impl ToolName {
    /// The wire name of this tool (matches the serde form).
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::Weather => "weather",
            ToolName::News => "news",
            ToolName::Wiki => "wiki",
            ToolName::DirectAnswer => "direct_answer",
            ToolName::None => "none",
        }
    }

    /// Parse a wire name back into the enum; `None` for anything unknown.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "weather" => Some(ToolName::Weather),
            "news" => Some(ToolName::News),
            "wiki" => Some(ToolName::Wiki),
            "direct_answer" => Some(ToolName::DirectAnswer),
            "none" => Some(ToolName::None),
            _ => None,
        }
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Plan ---

/// The routing decision derived from one question.
///
/// A Plan is created fresh per question, validated on construction, and
/// never mutated afterwards. `args` is an open map whose keys are only
/// meaningful to the handler named by `tool`; each handler validates its
/// own arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub tool: ToolName,
    #[serde(default)]
    pub args: Map<String, Value>,
    #[serde(default)]
    pub reason: String,
}

impl Plan {
    /// Plan for a question answered without any external tool.
    ///
    /// Used both for deliberate direct answers and as the recovery path
    /// when the model's output could not be parsed as a plan: the raw text
    /// becomes the answer so nothing is lost.
    pub fn direct_answer(answer: impl Into<String>, reason: impl Into<String>) -> Self {
        let mut args = Map::new();
        args.insert("answer".to_string(), Value::String(answer.into()));
        Self {
            tool: ToolName::DirectAnswer,
            args,
            reason: reason.into(),
        }
    }
}

// --- Tool Outcome ---

/// What a failed tool invocation looks like on the wire.
///
/// Two shapes exist: coded failures (`{ok:false, error:"...", ...context}`)
/// for conditions the handler itself detects, and upstream failures
/// (`{ok:false, status, text}`) passing a collaborator's non-2xx response
/// through unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolError {
    Code {
        code: String,
        context: Map<String, Value>,
    },
    Upstream {
        status: u16,
        text: String,
    },
}

/// The uniform envelope every tool handler returns.
///
/// Failure is data here, not an `Err` the caller must unwind: the assembler
/// receives both variants and renders them into the final result. Handlers
/// therefore never return `Result` and never panic on bad input.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Ok(Map<String, Value>),
    Err(ToolError),
}

impl ToolOutcome {
    pub fn success(payload: Map<String, Value>) -> Self {
        ToolOutcome::Ok(payload)
    }

    /// Coded failure with no extra context.
    pub fn failure(code: impl Into<String>) -> Self {
        ToolOutcome::Err(ToolError::Code {
            code: code.into(),
            context: Map::new(),
        })
    }

    /// Coded failure carrying extra context fields into the envelope.
    pub fn failure_with(code: impl Into<String>, context: Map<String, Value>) -> Self {
        ToolOutcome::Err(ToolError::Code {
            code: code.into(),
            context,
        })
    }

    /// A collaborator's non-2xx response, surfaced as data.
    pub fn upstream(status: u16, text: impl Into<String>) -> Self {
        ToolOutcome::Err(ToolError::Upstream {
            status,
            text: text.into(),
        })
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ToolOutcome::Ok(_))
    }

    /// The success payload, if any.
    pub fn payload(&self) -> Option<&Map<String, Value>> {
        match self {
            ToolOutcome::Ok(payload) => Some(payload),
            ToolOutcome::Err(_) => None,
        }
    }

    /// The machine-readable failure code, if this is a coded failure.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            ToolOutcome::Err(ToolError::Code { code, .. }) => Some(code),
            _ => None,
        }
    }

    /// The full wire envelope: `{ok: ..., ...fields}`.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        match self {
            ToolOutcome::Ok(payload) => {
                map.insert("ok".to_string(), Value::Bool(true));
                for (key, value) in payload {
                    map.insert(key.clone(), value.clone());
                }
            }
            ToolOutcome::Err(ToolError::Code { code, context }) => {
                map.insert("ok".to_string(), Value::Bool(false));
                map.insert("error".to_string(), Value::String(code.clone()));
                for (key, value) in context {
                    map.insert(key.clone(), value.clone());
                }
            }
            ToolOutcome::Err(ToolError::Upstream { status, text }) => {
                map.insert("ok".to_string(), Value::Bool(false));
                map.insert("status".to_string(), Value::from(*status));
                map.insert("text".to_string(), Value::String(text.clone()));
            }
        }
        map
    }
}

impl Serialize for ToolOutcome {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        Value::Object(self.to_map()).serialize(serializer)
    }
}

// --- Query Result ---

/// The final structured answer returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// The tool ultimately used, `direct_answer` for model-only answers.
    pub tool: ToolName,
    /// Arguments the chosen tool ran with (or context for direct answers).
    #[serde(default)]
    pub args: Map<String, Value>,
    /// User-facing summary; never empty.
    pub summary: String,
    /// Optional compact subset of the tool's output for programmatic use.
    /// Serialized as `null` when absent so the field is always present.
    #[serde(default)]
    pub raw_tool_output: Option<Map<String, Value>>,
}

// --- Completion Request ---

/// A single chat-completion request for the model boundary.
///
/// This is our internal representation; the provider converts it into its
/// own API format. `json_mode` asks the provider to constrain output to a
/// JSON object, which plan resolution relies on.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    pub json_mode: bool,
    pub max_tokens: u32,
}
