//! In-memory LLM provider for tests.

use std::sync::{Arc, Mutex};

use tokio::sync::Notify;
use wildsafe_ai::providers::LlmProvider;
use wildsafe_ai::{AiError, GenerateOptions, ModelTiers};

use crate::fetchers::Collaborator;

/// Prompt markers that identify each fetcher's request.
pub const WEATHER: &str = "ACTUAL CURRENT weather";
pub const HAZARD: &str = "Rate hazards";
pub const GUIDANCE: &str = "SENIOR WILDERNESS RANGER";
pub const TERRAIN: &str = "terrain profile";
pub const FIRE_ALERTS: &str = "fire incidents";

/// Canned reply for a prompt.
#[derive(Clone)]
pub enum Reply {
    Text(String),
    Empty,
    Fail(String),
    Panic,
    /// Waits for the notify before producing the inner reply.
    Gated(Arc<Notify>, Box<Self>),
}

impl Reply {
    pub fn json(value: &serde_json::Value) -> Self {
        Self::Text(value.to_string())
    }
}

/// One recorded `generate` call.
#[derive(Debug, Clone)]
pub struct Call {
    pub model: String,
    pub prompt: String,
    pub options: GenerateOptions,
}

/// Replies to the first rule whose marker occurs in the prompt; prompts
/// matching no rule get an empty reply.
#[derive(Default)]
pub struct ScriptedProvider {
    rules: Vec<(&'static str, Reply)>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, marker: &'static str, reply: Reply) -> Self {
        self.rules.push((marker, reply));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_matching(&self, marker: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.prompt.contains(marker))
            .collect()
    }
}

#[async_trait::async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn default_models(&self) -> ModelTiers {
        ModelTiers::new("fast-model", "reasoning-model")
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<Option<String>, AiError> {
        self.calls.lock().unwrap().push(Call {
            model: model.to_string(),
            prompt: prompt.to_string(),
            options: *options,
        });

        let mut reply = self
            .rules
            .iter()
            .find(|(marker, _)| prompt.contains(marker))
            .map_or(Reply::Empty, |(_, reply)| reply.clone());

        loop {
            match reply {
                Reply::Text(text) => return Ok(Some(text)),
                Reply::Empty => return Ok(None),
                Reply::Fail(message) => return Err(AiError::Provider { message }),
                Reply::Panic => panic!("scripted provider panic"),
                Reply::Gated(gate, inner) => {
                    gate.notified().await;
                    reply = *inner;
                }
            }
        }
    }
}

pub fn collaborator(provider: &Arc<ScriptedProvider>) -> Collaborator {
    Collaborator::with_default_models(provider.clone())
}
