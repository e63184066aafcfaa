//! Go / no-go guidance for the user's planned outing.

use std::fmt::Write as _;

use serde::Deserialize;
use wildsafe_ai::{GenerateOptions, ModelTier};
use wildsafe_intel_models::{
    Coordinates, GuidanceStatus, GuidanceVerdict, UserCapability, WeatherSnapshot,
};

use super::{Collaborator, RequestProfile};
use crate::normalize::{lenient, lenient_number, normalize_record};

/// Final decision logic runs on the reasoning tier with a thinking budget.
pub const PROFILE: RequestProfile = RequestProfile {
    tier: ModelTier::Reasoning,
    options: GenerateOptions {
        search_grounding: false,
        json_output: true,
        reasoning_budget: Some(10_000),
    },
};

fn build_prompt(
    weather: &WeatherSnapshot,
    user: &UserCapability,
    coordinates: Option<Coordinates>,
    fire_mode: bool,
) -> String {
    let mut prompt = format!(
        "ACT AS A SENIOR WILDERNESS RANGER.\n\
         Location: {location}\n",
        location = weather.location_name,
    );

    if let Some(Coordinates {
        latitude,
        longitude,
    }) = coordinates
    {
        let _ = writeln!(prompt, "User position: {latitude:.4}, {longitude:.4}");
    }

    let _ = write!(
        prompt,
        "Weather: {temp}°C, {condition}, Wind {wind}km/h {dir}, Precipitation {precip}%, \
         Visibility {visibility}km, Sunset {sunset}\n\
         User: Experience {experience}%, Fitness {fitness}%, Pack {pack}kg, \
         Group of {group}, Starting {start}\n\
         FIRE MODE: {fire}\n\n\
         Output JSON: {{ \"status\" (GO|CAUTION|MODIFY|NOGO), \"reasoning\", \"packingHints\" [], \
         \"aiSummary\", \"safetyIndex\" (0-100, higher is safer) }}",
        temp = weather.temperature_c,
        condition = weather.condition,
        wind = weather.wind_speed_kmh,
        dir = weather.wind_direction,
        precip = weather.precip_probability_pct,
        visibility = weather.visibility_km,
        sunset = weather.sunset,
        experience = user.experience,
        fitness = user.fitness,
        pack = user.pack_weight_kg,
        group = user.group_size,
        start = user.start_time,
        fire = if fire_mode { "ACTIVE" } else { "INACTIVE" },
    );

    prompt
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GuidancePatch {
    #[serde(default, deserialize_with = "lenient")]
    status: Option<GuidanceStatus>,
    #[serde(default, deserialize_with = "lenient")]
    reasoning: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    packing_hints: Option<Vec<String>>,
    #[serde(default, alias = "summary", deserialize_with = "lenient")]
    ai_summary: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    safety_index: Option<f64>,
}

impl GuidancePatch {
    fn overlay(self, base: GuidanceVerdict) -> GuidanceVerdict {
        GuidanceVerdict {
            status: self.status.unwrap_or(base.status),
            reasoning: self.reasoning.unwrap_or(base.reasoning),
            packing_hints: self.packing_hints.unwrap_or(base.packing_hints),
            summary: self.ai_summary.unwrap_or(base.summary),
            safety_index: self.safety_index.unwrap_or(base.safety_index),
        }
    }
}

/// Asks for a go / no-go verdict for this user in these conditions.
///
/// Returns [`GuidanceVerdict::fallback`] if the collaborator fails.
pub async fn fetch_guidance(
    collaborator: &Collaborator,
    weather: &WeatherSnapshot,
    user: &UserCapability,
    coordinates: Option<Coordinates>,
    fire_mode: bool,
) -> GuidanceVerdict {
    let prompt = build_prompt(weather, user, coordinates, fire_mode);

    match collaborator.generate(&PROFILE, &prompt).await {
        Ok(text) => {
            normalize_record::<GuidancePatch>(text.as_deref()).overlay(GuidanceVerdict::fallback())
        }
        Err(e) => {
            log::warn!("Guidance fetch failed for {}: {e}", weather.location_name);
            GuidanceVerdict::fallback()
        }
    }
}
