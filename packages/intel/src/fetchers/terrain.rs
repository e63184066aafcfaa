//! Terrain profile for a named area.

use serde::Deserialize;
use wildsafe_ai::{GenerateOptions, ModelTier};
use wildsafe_intel_models::TerrainProfile;

use super::{Collaborator, RequestProfile};
use crate::normalize::{lenient, normalize_record};

pub const PROFILE: RequestProfile = RequestProfile {
    tier: ModelTier::Fast,
    options: GenerateOptions {
        search_grounding: false,
        json_output: true,
        reasoning_budget: None,
    },
};

fn build_prompt(location_name: &str) -> String {
    format!(
        "Provide a terrain profile for {location_name}. \
         JSON: {{ \"type\", \"exposure\", \"hazards\" [], \"rangerNote\" }}"
    )
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TerrainPatch {
    #[serde(default, rename = "type", deserialize_with = "lenient")]
    terrain_type: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    exposure: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    hazards: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    ranger_note: Option<String>,
}

impl TerrainPatch {
    fn overlay(self, base: TerrainProfile) -> TerrainProfile {
        TerrainProfile {
            terrain_type: self.terrain_type.unwrap_or(base.terrain_type),
            exposure: self.exposure.unwrap_or(base.exposure),
            hazards: self.hazards.unwrap_or(base.hazards),
            ranger_note: self.ranger_note.unwrap_or(base.ranger_note),
        }
    }
}

/// Describes the terrain around `location_name`.
///
/// Returns [`TerrainProfile::fallback`] if the collaborator fails.
pub async fn fetch_terrain(collaborator: &Collaborator, location_name: &str) -> TerrainProfile {
    match collaborator
        .generate(&PROFILE, &build_prompt(location_name))
        .await
    {
        Ok(text) => normalize_record::<TerrainPatch>(text.as_deref()).overlay(TerrainProfile::fallback()),
        Err(e) => {
            log::warn!("Terrain analysis failed for {location_name}: {e}");
            TerrainProfile::fallback()
        }
    }
}
