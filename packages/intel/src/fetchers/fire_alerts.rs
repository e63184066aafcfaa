//! Active fire incident and closure search (fire-mode only).

use wildsafe_ai::{GenerateOptions, ModelTier};

use super::{Collaborator, RequestProfile};

/// Digest used when the search returned no text.
pub const NO_ALERTS: &str = "No localized fire alerts found.";
/// Digest used when the search itself failed.
pub const SYNC_FAILED: &str = "Telemetry sync failed.";

/// Free-text search, so grounding on and JSON mode off.
pub const PROFILE: RequestProfile = RequestProfile {
    tier: ModelTier::Fast,
    options: GenerateOptions {
        search_grounding: true,
        json_output: false,
        reasoning_budget: None,
    },
};

fn build_prompt(location: &str) -> String {
    format!(
        "Active fire incidents or trail closures near {location} in the last 72 hours. \
         Summarize in 2-3 sentences."
    )
}

/// Searches for recent fire incidents and closures near `location`.
pub async fn fetch_fire_alerts(collaborator: &Collaborator, location: &str) -> String {
    match collaborator.generate(&PROFILE, &build_prompt(location)).await {
        Ok(Some(text)) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => NO_ALERTS.to_string(),
        Err(e) => {
            log::warn!("Fire alert search failed for {location}: {e}");
            SYNC_FAILED.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::test_support::{self, FIRE_ALERTS, Reply, ScriptedProvider};

    #[tokio::test]
    async fn returns_trimmed_digest() {
        let provider = Arc::new(ScriptedProvider::new().on(
            FIRE_ALERTS,
            Reply::Text("  Red Flag Warning in effect until Friday.\n".to_string()),
        ));
        let digest = fetch_fire_alerts(&test_support::collaborator(&provider), "Tahoe").await;
        assert_eq!(digest, "Red Flag Warning in effect until Friday.");

        let call = &provider.calls()[0];
        assert!(call.options.search_grounding);
        assert!(!call.options.json_output);
    }

    #[tokio::test]
    async fn empty_reply_means_no_alerts() {
        let provider = Arc::new(ScriptedProvider::new().on(FIRE_ALERTS, Reply::Empty));
        let digest = fetch_fire_alerts(&test_support::collaborator(&provider), "Tahoe").await;
        assert_eq!(digest, NO_ALERTS);

        let provider =
            Arc::new(ScriptedProvider::new().on(FIRE_ALERTS, Reply::Text("  \n".to_string())));
        let digest = fetch_fire_alerts(&test_support::collaborator(&provider), "Tahoe").await;
        assert_eq!(digest, NO_ALERTS);
    }

    #[tokio::test]
    async fn failure_means_sync_failed() {
        let provider = Arc::new(
            ScriptedProvider::new().on(FIRE_ALERTS, Reply::Fail("dns error".to_string())),
        );
        let digest = fetch_fire_alerts(&test_support::collaborator(&provider), "Tahoe").await;
        assert_eq!(digest, SYNC_FAILED);
    }
}
