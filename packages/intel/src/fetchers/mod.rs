//! Domain fetchers.
//!
//! Each fetcher builds a prompt from typed inputs, sends it to the LLM
//! collaborator with its own model tier and options, normalizes the reply
//! and overlays it on a fully-populated fallback record. Fetchers never
//! return errors: collaborator failures and malformed output both degrade
//! to the fallback.

pub mod fire_alerts;
pub mod guidance;
pub mod hazard;
pub mod terrain;
pub mod weather;

use std::sync::Arc;

use wildsafe_ai::providers::LlmProvider;
use wildsafe_ai::{AiError, GenerateOptions, ModelTier, ModelTiers};

pub use fire_alerts::fetch_fire_alerts;
pub use guidance::fetch_guidance;
pub use hazard::fetch_hazard_assessment;
pub use terrain::fetch_terrain;
pub use weather::fetch_weather;

/// Model tier and generation options a fetcher declares for its call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestProfile {
    /// Which model tier to use.
    pub tier: ModelTier,
    /// Grounding / JSON / reasoning settings.
    pub options: GenerateOptions,
}

/// Handle to the LLM collaborator shared by all fetchers.
#[derive(Clone)]
pub struct Collaborator {
    provider: Arc<dyn LlmProvider>,
    models: ModelTiers,
}

impl Collaborator {
    /// Wraps a provider with the model identifiers for each tier.
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, models: ModelTiers) -> Self {
        Self { provider, models }
    }

    /// Wraps a provider using its own default models.
    #[must_use]
    pub fn with_default_models(provider: Arc<dyn LlmProvider>) -> Self {
        let models = provider.default_models();
        Self::new(provider, models)
    }

    /// The configured tier mapping.
    #[must_use]
    pub const fn models(&self) -> &ModelTiers {
        &self.models
    }

    /// Sends one prompt according to `profile`.
    ///
    /// # Errors
    ///
    /// Propagates the provider's [`AiError`].
    pub async fn generate(
        &self,
        profile: &RequestProfile,
        prompt: &str,
    ) -> Result<Option<String>, AiError> {
        let model = self.models.model(profile.tier);
        log::debug!(
            "Calling {} model {model} (grounding={}, json={})",
            self.provider.name(),
            profile.options.search_grounding,
            profile.options.json_output,
        );
        self.provider.generate(model, prompt, &profile.options).await
    }
}

impl std::fmt::Debug for Collaborator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborator")
            .field("provider", &self.provider.name())
            .field("models", &self.models)
            .finish()
    }
}
