//! AWS Bedrock provider implementation using the Converse API.

use aws_sdk_bedrockruntime::types::{
    self as bedrock, ContentBlock as BedrockContent, ConversationRole, Message as BedrockMessage,
    SystemContentBlock,
};
use aws_smithy_types::Document;

use super::{LlmProvider, join_text};
use crate::{AiError, GenerateOptions, JSON_ONLY_INSTRUCTION, ModelTiers};

/// Output tokens reserved for the answer on top of any thinking budget.
const ANSWER_TOKENS: u32 = 4096;

/// AWS Bedrock provider using the Converse API.
///
/// Authentication uses the standard AWS credential chain (env vars, IAM
/// role, `~/.aws/credentials`) or a Bedrock bearer token.
pub struct BedrockProvider {
    client: aws_sdk_bedrockruntime::Client,
}

impl BedrockProvider {
    /// Creates a new Bedrock provider.
    ///
    /// Loads AWS configuration from the environment (region, credentials).
    pub async fn new(region: Option<String>) -> Self {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(region) = region {
            config_loader = config_loader.region(aws_config::Region::new(region));
        }

        let config = config_loader.load().await;
        let client = aws_sdk_bedrockruntime::Client::new(&config);

        Self { client }
    }
}

#[async_trait::async_trait]
impl LlmProvider for BedrockProvider {
    fn name(&self) -> &'static str {
        "bedrock"
    }

    fn default_models(&self) -> ModelTiers {
        ModelTiers::new(
            "us.anthropic.claude-3-5-haiku-20241022-v1:0",
            "us.anthropic.claude-sonnet-4-20250514-v1:0",
        )
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<Option<String>, AiError> {
        if options.search_grounding {
            log::debug!("Search grounding is not available through Bedrock Converse; ignoring");
        }

        let message = BedrockMessage::builder()
            .role(ConversationRole::User)
            .content(BedrockContent::Text(prompt.to_string()))
            .build()
            .map_err(|e| AiError::Provider {
                message: format!("Failed to build Bedrock Message: {e}"),
            })?;

        let max_tokens = ANSWER_TOKENS + options.reasoning_budget.unwrap_or(0);

        let mut request = self
            .client
            .converse()
            .model_id(model)
            .messages(message)
            .inference_config(
                bedrock::InferenceConfiguration::builder()
                    .max_tokens(i32::try_from(max_tokens).unwrap_or(i32::MAX))
                    .build(),
            );

        if options.json_output {
            request = request.system(SystemContentBlock::Text(JSON_ONLY_INSTRUCTION.to_string()));
        }

        if let Some(fields) = thinking_fields(model, options.reasoning_budget) {
            request = request.additional_model_request_fields(json_to_document(&fields));
        }

        let response = request.send().await.map_err(|e| AiError::Provider {
            message: format!("Bedrock Converse error: {e}"),
        })?;

        let output = response.output().ok_or_else(|| AiError::Provider {
            message: "No output in Bedrock response".to_string(),
        })?;

        let bedrock::ConverseOutput::Message(response_msg) = output else {
            return Err(AiError::Provider {
                message: "Unexpected Bedrock output variant".to_string(),
            });
        };

        Ok(join_text(response_msg.content().iter().filter_map(
            |block| match block {
                BedrockContent::Text(text) => Some(text.as_str()),
                // Reasoning traces, images, etc.
                _ => None,
            },
        )))
    }
}

/// Extended thinking is an Anthropic model feature; other Bedrock model
/// families reject the field.
fn thinking_fields(model: &str, budget: Option<u32>) -> Option<serde_json::Value> {
    let budget = budget?;
    if !model.contains("anthropic") {
        log::debug!("Reasoning budget not supported for Bedrock model {model}; ignoring");
        return None;
    }
    Some(serde_json::json!({
        "thinking": { "type": "enabled", "budget_tokens": budget }
    }))
}

/// Converts a `serde_json::Value` to an `aws_smithy_types::Document`.
#[allow(clippy::option_if_let_else)]
fn json_to_document(value: &serde_json::Value) -> Document {
    match value {
        serde_json::Value::Null => Document::Null,
        serde_json::Value::Bool(b) => Document::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                if i >= 0 {
                    Document::Number(aws_smithy_types::Number::PosInt(i.cast_unsigned()))
                } else {
                    Document::Number(aws_smithy_types::Number::NegInt(i))
                }
            } else if let Some(f) = n.as_f64() {
                Document::Number(aws_smithy_types::Number::Float(f))
            } else {
                Document::Null
            }
        }
        serde_json::Value::String(s) => Document::String(s.clone()),
        serde_json::Value::Array(arr) => {
            Document::Array(arr.iter().map(json_to_document).collect())
        }
        serde_json::Value::Object(obj) => {
            let map = obj
                .iter()
                .map(|(k, v)| (k.clone(), json_to_document(v)))
                .collect();
            Document::Object(map)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thinking_only_for_anthropic_models() {
        assert!(thinking_fields("us.anthropic.claude-sonnet-4-20250514-v1:0", Some(10)).is_some());
        assert!(thinking_fields("meta.llama3-70b-instruct-v1:0", Some(10)).is_none());
        assert!(thinking_fields("us.anthropic.claude-sonnet-4-20250514-v1:0", None).is_none());
    }

    #[test]
    fn converts_nested_json_to_document() {
        let doc = json_to_document(&serde_json::json!({
            "thinking": { "type": "enabled", "budget_tokens": 10_000 }
        }));
        let Document::Object(map) = doc else {
            panic!("expected object");
        };
        let Some(Document::Object(thinking)) = map.get("thinking") else {
            panic!("expected nested object");
        };
        assert_eq!(
            thinking.get("budget_tokens"),
            Some(&Document::Number(aws_smithy_types::Number::PosInt(10_000)))
        );
    }
}
