#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! LLM provider abstraction for single-shot text generation.
//!
//! Supports Google Gemini, Anthropic Claude, `OpenAI` (and any
//! `OpenAI`-compatible local/self-hosted server via `AI_BASE_URL`), and AWS
//! Bedrock (feature-gated). Every provider exposes the same
//! [`providers::LlmProvider::generate`] operation: one prompt in, freeform
//! text out, with optional search grounding, JSON output mode and a
//! reasoning budget. Callers must treat the returned text as untrusted.

pub mod providers;

use thiserror::Error;

/// Errors that can occur during AI operations.
#[derive(Debug, Error)]
pub enum AiError {
    /// HTTP request to LLM provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider-specific error.
    #[error("Provider error: {message}")]
    Provider {
        /// Description of what went wrong.
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// Description.
        message: String,
    },
}

/// Per-request generation options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Let the model ground its answer in live web search results.
    pub search_grounding: bool,
    /// Ask the provider for strict JSON output.
    pub json_output: bool,
    /// Token budget for extended reasoning, where supported.
    pub reasoning_budget: Option<u32>,
}

impl GenerateOptions {
    /// Enables search grounding.
    #[must_use]
    pub const fn with_search_grounding(mut self) -> Self {
        self.search_grounding = true;
        self
    }

    /// Enables JSON output mode.
    #[must_use]
    pub const fn with_json_output(mut self) -> Self {
        self.json_output = true;
        self
    }

    /// Sets a reasoning budget.
    #[must_use]
    pub const fn with_reasoning_budget(mut self, budget: u32) -> Self {
        self.reasoning_budget = Some(budget);
        self
    }
}

/// Model capability tier requested by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelTier {
    /// Cheap, low-latency model.
    Fast,
    /// Slower model reserved for final decision logic.
    Reasoning,
}

/// Provider model identifiers for each [`ModelTier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelTiers {
    /// Identifier used for [`ModelTier::Fast`].
    pub fast: String,
    /// Identifier used for [`ModelTier::Reasoning`].
    pub reasoning: String,
}

impl ModelTiers {
    /// Creates a tier mapping.
    #[must_use]
    pub fn new(fast: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Self {
            fast: fast.into(),
            reasoning: reasoning.into(),
        }
    }

    /// Resolves a tier to a model identifier.
    #[must_use]
    pub fn model(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Fast => &self.fast,
            ModelTier::Reasoning => &self.reasoning,
        }
    }

    /// Applies `AI_FAST_MODEL` / `AI_REASONING_MODEL` overrides.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(fast) = std::env::var("AI_FAST_MODEL") {
            self.fast = fast;
        }
        if let Ok(reasoning) = std::env::var("AI_REASONING_MODEL") {
            self.reasoning = reasoning;
        }
        self
    }
}

/// Instruction appended for providers without a native JSON output mode.
pub(crate) const JSON_ONLY_INSTRUCTION: &str = "Respond with a single JSON document and nothing else. \
     Do not wrap it in markdown code fences or add commentary.";
