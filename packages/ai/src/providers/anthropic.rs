//! Anthropic Claude provider implementation.

use serde::{Deserialize, Serialize};

use super::{LlmProvider, join_text};
use crate::{AiError, GenerateOptions, JSON_ONLY_INSTRUCTION, ModelTiers};

/// Output tokens reserved for the answer on top of any thinking budget.
const ANSWER_TOKENS: u32 = 4096;

/// Anthropic Claude API provider.
pub struct AnthropicProvider {
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Creates a new Anthropic provider.
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

/// Anthropic API request body.
#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'static str>,
    messages: Vec<AnthropicMessage<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Anthropic API response body.
#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicContentBlock {
    Text {
        text: String,
    },
    /// Thinking, server tool use, search results and anything newer.
    #[serde(other)]
    Other,
}

/// Anthropic API error response.
#[derive(Deserialize)]
struct AnthropicError {
    error: AnthropicErrorDetail,
}

#[derive(Deserialize)]
struct AnthropicErrorDetail {
    message: String,
}

fn build_request<'a>(
    model: &'a str,
    prompt: &'a str,
    options: &GenerateOptions,
) -> AnthropicRequest<'a> {
    let tools = if options.search_grounding {
        vec![serde_json::json!({
            "type": "web_search_20250305",
            "name": "web_search",
            "max_uses": 5,
        })]
    } else {
        Vec::new()
    };

    let thinking = options.reasoning_budget.map(|budget| {
        serde_json::json!({
            "type": "enabled",
            "budget_tokens": budget,
        })
    });

    AnthropicRequest {
        model,
        max_tokens: ANSWER_TOKENS + options.reasoning_budget.unwrap_or(0),
        system: options.json_output.then_some(JSON_ONLY_INSTRUCTION),
        messages: vec![AnthropicMessage {
            role: "user",
            content: prompt,
        }],
        tools,
        thinking,
    }
}

fn extract_text(response: &AnthropicResponse) -> Option<String> {
    join_text(response.content.iter().filter_map(|block| match block {
        AnthropicContentBlock::Text { text } => Some(text.as_str()),
        AnthropicContentBlock::Other => None,
    }))
}

#[async_trait::async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn default_models(&self) -> ModelTiers {
        ModelTiers::new("claude-haiku-4-5", "claude-sonnet-4-5")
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<Option<String>, AiError> {
        let request = build_request(model, prompt, options);

        let resp = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let err: AnthropicError =
                serde_json::from_str(&body).unwrap_or_else(|_| AnthropicError {
                    error: AnthropicErrorDetail {
                        message: format!("HTTP {status}: {body}"),
                    },
                });
            return Err(AiError::Provider {
                message: err.error.message,
            });
        }

        let response: AnthropicResponse = serde_json::from_str(&body)?;
        Ok(extract_text(&response))
    }
}
