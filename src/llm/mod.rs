//! LLM Client module.
//!
//! This module defines the `LlmProvider` trait that abstracts over the
//! chat-completion service the plan router depends on, and provides the
//! concrete implementation.
//!
//! Key concepts:
//! - **Trait**: the rest of the code only sees `complete()`, so tests can
//!   substitute a canned provider and the router never knows the difference
//! - **async_trait**: since Rust traits don't natively support async fn in
//!   trait objects, we use the async-trait crate
//! - **Opaque suspension point**: a completion is a single request/response
//!   await with no retry; callers decide what a failure means

pub mod openai_compatible;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::CompletionRequest;

/// Trait that all LLM providers must implement.
///
/// The router treats the model as a black box that turns a system/user
/// prompt pair into text. Providers that support it should honor
/// `json_mode` by constraining the output to a single JSON object.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a chat completion request and return the response text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Return the provider's display name (for logging).
    fn name(&self) -> &str;
}
