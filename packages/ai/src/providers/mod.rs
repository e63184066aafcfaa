//! LLM provider abstraction and implementations.
//!
//! Supports Gemini, Anthropic Claude, `OpenAI`, and AWS Bedrock via a
//! common trait.

pub mod anthropic;
#[cfg(feature = "bedrock")]
pub mod bedrock;
pub mod gemini;
pub mod openai;

use strum_macros::{Display, EnumString};

use crate::{AiError, GenerateOptions, ModelTiers};

/// Trait for LLM providers.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &'static str;

    /// Model identifiers this provider uses when none are configured.
    fn default_models(&self) -> ModelTiers;

    /// Sends a single prompt and returns the concatenated text of the
    /// response, or `None` when the model produced no text at all.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] if the request fails or the provider reports an
    /// error.
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<Option<String>, AiError>;
}

/// Joins text fragments, returning `None` if nothing but whitespace remains.
pub(crate) fn join_text<'a>(parts: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let text = parts.into_iter().collect::<Vec<_>>().join("");
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Which backend [`create_provider_from_env`] builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProviderKind {
    #[strum(serialize = "gemini", serialize = "google")]
    Gemini,
    #[strum(serialize = "anthropic", serialize = "claude")]
    Anthropic,
    #[strum(serialize = "openai", serialize = "gpt")]
    OpenAi,
    #[strum(serialize = "bedrock", serialize = "aws")]
    Bedrock,
}

fn env_var(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| std::env::var(name).ok())
}

fn require_env(names: &[&str]) -> Result<String, AiError> {
    env_var(names).ok_or_else(|| AiError::Config {
        message: format!("{} environment variable not set", names.join(" or ")),
    })
}

/// Creates an LLM provider based on environment variables.
///
/// `AI_PROVIDER` picks the backend explicitly; otherwise it is inferred
/// from the first credential found, in this order:
///
/// 1. `GEMINI_API_KEY` / `API_KEY` -> Gemini
/// 2. `ANTHROPIC_API_KEY` -> Anthropic
/// 3. `OPENAI_API_KEY` / `AI_BASE_URL` -> `OpenAI` (or compatible)
/// 4. AWS credentials (keys, profile, bearer token or role) -> Bedrock
///
/// # Errors
///
/// Returns [`AiError::Config`] if `AI_PROVIDER` names an unknown backend
/// or the chosen backend's credentials are missing.
#[allow(clippy::unused_async)] // awaited only by the bedrock backend
pub async fn create_provider_from_env() -> Result<Box<dyn LlmProvider>, AiError> {
    let kind = match std::env::var("AI_PROVIDER") {
        Ok(name) => name.parse::<ProviderKind>().map_err(|_| AiError::Config {
            message: format!(
                "Unknown AI_PROVIDER {name:?}; expected gemini, anthropic, openai or bedrock"
            ),
        })?,
        Err(_) => detect_provider(),
    };

    match kind {
        ProviderKind::Gemini => Ok(Box::new(gemini::GeminiProvider::new(require_env(&[
            "GEMINI_API_KEY",
            "API_KEY",
        ])?))),
        ProviderKind::Anthropic => Ok(Box::new(anthropic::AnthropicProvider::new(
            require_env(&["ANTHROPIC_API_KEY"])?,
        ))),
        ProviderKind::OpenAi => {
            let base_url = env_var(&["AI_BASE_URL"]);
            // Self-hosted compatible servers generally ignore the key.
            let api_key = match (env_var(&["OPENAI_API_KEY"]), &base_url) {
                (Some(key), _) => key,
                (None, Some(_)) => String::new(),
                (None, None) => require_env(&["OPENAI_API_KEY"])?,
            };
            Ok(Box::new(openai::OpenAiProvider::new(api_key, base_url)))
        }
        #[cfg(feature = "bedrock")]
        ProviderKind::Bedrock => {
            let region = env_var(&["AWS_REGION", "AWS_DEFAULT_REGION"]).or_else(|| {
                // Bearer-token auth still needs a region to resolve the endpoint.
                env_var(&["AWS_BEARER_TOKEN_BEDROCK"]).map(|_| {
                    log::info!("No AWS_REGION set; using us-east-1 for Bedrock");
                    "us-east-1".to_string()
                })
            });
            Ok(Box::new(bedrock::BedrockProvider::new(region).await))
        }
        #[cfg(not(feature = "bedrock"))]
        ProviderKind::Bedrock => Err(AiError::Config {
            message: "Bedrock support not compiled in; enable the `bedrock` feature".to_string(),
        }),
    }
}

/// Picks a backend from whichever credentials are present.
fn detect_provider() -> ProviderKind {
    const AWS_MARKERS: &[&str] = &[
        "AWS_ACCESS_KEY_ID",
        "AWS_PROFILE",
        "AWS_BEARER_TOKEN_BEDROCK",
        "AWS_ROLE_ARN",
        "AWS_CONTAINER_CREDENTIALS_RELATIVE_URI",
    ];

    let kind = if env_var(&["GEMINI_API_KEY", "API_KEY"]).is_some() {
        ProviderKind::Gemini
    } else if env_var(&["ANTHROPIC_API_KEY"]).is_some() {
        ProviderKind::Anthropic
    } else if env_var(&["OPENAI_API_KEY", "AI_BASE_URL"]).is_some() {
        ProviderKind::OpenAi
    } else if env_var(AWS_MARKERS).is_some() {
        ProviderKind::Bedrock
    } else {
        log::warn!(
            "No AI credentials found. Set GEMINI_API_KEY, ANTHROPIC_API_KEY, OPENAI_API_KEY, \
             AI_BASE_URL or AWS credentials, or choose one with AI_PROVIDER."
        );
        // Falls through to a clear missing-key error.
        return ProviderKind::Gemini;
    };

    log::info!("Auto-detected AI provider: {kind}");
    kind
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_names_parse_case_insensitively() {
        assert_eq!("Gemini".parse::<ProviderKind>().unwrap(), ProviderKind::Gemini);
        assert_eq!("claude".parse::<ProviderKind>().unwrap(), ProviderKind::Anthropic);
        assert_eq!("GPT".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!("aws".parse::<ProviderKind>().unwrap(), ProviderKind::Bedrock);
        assert!("mistral".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn join_text_drops_blank_output() {
        assert_eq!(join_text(["", "  ", "\n"]), None);
        assert_eq!(join_text(Vec::<&str>::new()), None);
        assert_eq!(
            join_text(["{\"a\":", "1}"]),
            Some("{\"a\":1}".to_string())
        );
    }
}
