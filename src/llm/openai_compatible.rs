//! OpenAI-compatible LLM provider implementation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::LlmProvider;
use crate::types::CompletionRequest;

pub struct OpenAiCompatibleProvider {
    api_key: String,
    api_base: String,
    client: reqwest::Client,
}

// --- API Request Types (OpenAI format) ---

#[derive(Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<ApiMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    r#type: String,
}

// --- API Response Types ---

#[derive(Deserialize, Debug)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Deserialize, Debug)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Deserialize, Debug)]
struct ApiResponseMessage {
    content: Option<String>,
}

// --- Implementation ---

impl OpenAiCompatibleProvider {
    pub fn new(api_key: String, api_base: Option<String>) -> Self {
        Self {
            api_key,
            api_base: api_base.unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            client: reqwest::Client::new(),
        }
    }

    fn build_api_request(&self, request: &CompletionRequest) -> ApiRequest {
        let messages = vec![
            ApiMessage {
                role: "system".to_string(),
                content: request.system.clone(),
            },
            ApiMessage {
                role: "user".to_string(),
                content: request.user.clone(),
            },
        ];

        // json_object mode constrains the model to emit one JSON object,
        // which is what plan resolution parses.
        let response_format = if request.json_mode {
            Some(ResponseFormat {
                r#type: "json_object".to_string(),
            })
        } else {
            None
        };

        ApiRequest {
            model: request.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            response_format,
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let api_request = self.build_api_request(request);
        let url = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&api_request)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, error_body);
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .context("Failed to parse API response")?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .context("Empty response from API: no choices returned")?;

        Ok(choice.message.content.unwrap_or_default())
    }

    fn name(&self) -> &str {
        "OpenAI-Compatible"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json_mode: bool) -> CompletionRequest {
        CompletionRequest {
            model: "gpt-4.1-mini".to_string(),
            system: "route".to_string(),
            user: "question".to_string(),
            json_mode,
            max_tokens: 512,
        }
    }

    #[test]
    fn json_mode_sets_response_format() {
        let provider = OpenAiCompatibleProvider::new("key".to_string(), None);

        let with = serde_json::to_value(provider.build_api_request(&request(true))).unwrap();
        assert_eq!(with["response_format"]["type"], "json_object");
        assert_eq!(with["messages"][0]["role"], "system");
        assert_eq!(with["messages"][1]["content"], "question");

        let without = serde_json::to_value(provider.build_api_request(&request(false))).unwrap();
        assert!(without.get("response_format").is_none());
    }
}
