//! Hazard assessment derived from the current weather.

use serde::Deserialize;
use wildsafe_ai::{GenerateOptions, ModelTier};
use wildsafe_intel_models::{FireDetails, HazardAssessment, WeatherSnapshot, score_to_level};

use super::{Collaborator, RequestProfile};
use crate::normalize::{lenient, lenient_number, lenient_score, normalize_record};

pub const PROFILE: RequestProfile = RequestProfile {
    tier: ModelTier::Fast,
    options: GenerateOptions {
        search_grounding: false,
        json_output: true,
        reasoning_budget: None,
    },
};

fn build_prompt(weather: &WeatherSnapshot, fire_mode: bool) -> String {
    let mut prompt = format!(
        "Rate hazards 0-100 for {location} based on:\n\
         Temp: {temp}C, Condition: {condition}, Wind: {wind}km/h {dir}, Humidity: {humidity}%, \
         Precipitation chance: {precip}%.\n\
         JSON: {{ \"thunderstorm\", \"heat\", \"cold\", \"fire\", \"flood\", \"safetyScore\" }} \
         where each hazard is a number 0-100 (higher is more dangerous) and safetyScore is 0-100 \
         (higher is safer).",
        location = weather.location_name,
        temp = weather.temperature_c,
        condition = weather.condition,
        wind = weather.wind_speed_kmh,
        dir = weather.wind_direction,
        humidity = weather.humidity_pct,
        precip = weather.precip_probability_pct,
    );

    if fire_mode {
        prompt.push_str(
            "\nWildfire mode is active: also include a \"fireDetails\" object with \
             \"dangerRating\", \"windEffect\", \"dryingTrend\", \"fuelDryness\" and \
             \"aiInterpretation\" strings.",
        );
    }

    prompt
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HazardPatch {
    #[serde(default, deserialize_with = "lenient_score")]
    thunderstorm: Option<f64>,
    #[serde(default, deserialize_with = "lenient_score")]
    heat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_score")]
    cold: Option<f64>,
    #[serde(default, deserialize_with = "lenient_score")]
    fire: Option<f64>,
    #[serde(default, deserialize_with = "lenient_score")]
    flood: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    safety_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    fire_details: Option<FireDetailsPatch>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FireDetailsPatch {
    #[serde(default, deserialize_with = "lenient")]
    danger_rating: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    wind_effect: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    drying_trend: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    fuel_dryness: Option<String>,
    #[serde(default, alias = "interpretation", deserialize_with = "lenient")]
    ai_interpretation: Option<String>,
}

impl FireDetailsPatch {
    /// `None` if the model sent an empty block.
    fn into_details(self) -> Option<FireDetails> {
        if self.danger_rating.is_none()
            && self.wind_effect.is_none()
            && self.drying_trend.is_none()
            && self.fuel_dryness.is_none()
            && self.ai_interpretation.is_none()
        {
            return None;
        }

        let or_na = |s: Option<String>| s.unwrap_or_else(|| "N/A".to_string());
        Some(FireDetails {
            danger_rating: or_na(self.danger_rating),
            wind_effect: or_na(self.wind_effect),
            drying_trend: or_na(self.drying_trend),
            fuel_dryness: or_na(self.fuel_dryness),
            interpretation: or_na(self.ai_interpretation),
        })
    }
}

impl HazardPatch {
    /// True when nothing usable was decoded, e.g. a prose reply.
    const fn is_empty(&self) -> bool {
        self.thunderstorm.is_none()
            && self.heat.is_none()
            && self.cold.is_none()
            && self.fire.is_none()
            && self.flood.is_none()
            && self.safety_score.is_none()
            && self.fire_details.is_none()
    }

    fn into_assessment(self, fire_mode: bool) -> HazardAssessment {
        if self.is_empty() {
            return HazardAssessment::fallback();
        }

        HazardAssessment {
            thunderstorm: score_to_level(self.thunderstorm),
            heat: score_to_level(self.heat),
            cold: score_to_level(self.cold),
            fire: score_to_level(self.fire),
            flood: score_to_level(self.flood),
            safety_score: self
                .safety_score
                .unwrap_or(HazardAssessment::DEFAULT_SAFETY_SCORE),
            fire_details: if fire_mode {
                self.fire_details.and_then(FireDetailsPatch::into_details)
            } else {
                None
            },
        }
    }
}

/// Rates the five hazard categories for the given conditions.
///
/// Returns [`HazardAssessment::fallback`] if the collaborator fails or
/// its reply carries none of the expected fields.
pub async fn fetch_hazard_assessment(
    collaborator: &Collaborator,
    weather: &WeatherSnapshot,
    fire_mode: bool,
) -> HazardAssessment {
    match collaborator
        .generate(&PROFILE, &build_prompt(weather, fire_mode))
        .await
    {
        Ok(text) => normalize_record::<HazardPatch>(text.as_deref()).into_assessment(fire_mode),
        Err(e) => {
            log::warn!(
                "Hazard assessment failed for {}: {e}",
                weather.location_name
            );
            HazardAssessment::fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use wildsafe_intel_models::Severity;

    use super::*;
    use crate::test_support::{self, HAZARD, Reply, ScriptedProvider};

    fn fire_reply() -> serde_json::Value {
        json!({
            "thunderstorm": 12,
            "heat": 65,
            "cold": 0,
            "fire": 91,
            "flood": 31,
            "safetyScore": 22,
            "fireDetails": {
                "dangerRating": "Extreme",
                "windEffect": "Gusts will drive rapid spread",
                "dryingTrend": "Seven dry days",
                "fuelDryness": "Critical"
            }
        })
    }

    #[tokio::test]
    async fn maps_scores_to_levels() {
        let provider = Arc::new(ScriptedProvider::new().on(HAZARD, Reply::json(&fire_reply())));
        let weather = WeatherSnapshot::offline("Sequoia");
        let assessment =
            fetch_hazard_assessment(&test_support::collaborator(&provider), &weather, false).await;

        assert_eq!(assessment.thunderstorm.level(), Severity::Low);
        assert_eq!(assessment.heat.level(), Severity::High);
        assert_eq!(assessment.fire.level(), Severity::Extreme);
        assert_eq!(assessment.flood.level(), Severity::Moderate);
        assert!((assessment.safety_score - 22.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn fire_details_only_in_fire_mode() {
        let provider = Arc::new(ScriptedProvider::new().on(HAZARD, Reply::json(&fire_reply())));
        let collaborator = test_support::collaborator(&provider);
        let weather = WeatherSnapshot::offline("Sequoia");

        let calm = fetch_hazard_assessment(&collaborator, &weather, false).await;
        assert!(calm.fire_details.is_none());

        let fire = fetch_hazard_assessment(&collaborator, &weather, true).await;
        let details = fire.fire_details.unwrap();
        assert_eq!(details.danger_rating, "Extreme");
        assert_eq!(details.fuel_dryness, "Critical");
        assert_eq!(details.interpretation, "N/A");

        let prompts = provider.calls_matching(HAZARD);
        assert!(!prompts[0].prompt.contains("fireDetails"));
        assert!(prompts[1].prompt.contains("fireDetails"));
    }

    #[tokio::test]
    async fn missing_fields_default_low_and_neutral_safety() {
        let provider =
            Arc::new(ScriptedProvider::new().on(HAZARD, Reply::json(&json!({ "heat": 45 }))));
        let assessment = fetch_hazard_assessment(
            &test_support::collaborator(&provider),
            &WeatherSnapshot::offline("Joshua Tree"),
            true,
        )
        .await;

        assert_eq!(assessment.heat.level(), Severity::Moderate);
        assert_eq!(assessment.cold.level(), Severity::Low);
        assert!(assessment.cold.score().abs() < f64::EPSILON);
        assert!((assessment.safety_score - 50.0).abs() < f64::EPSILON);
        assert!(assessment.fire_details.is_none());
    }

    #[tokio::test]
    async fn failure_yields_fallback() {
        let provider =
            Arc::new(ScriptedProvider::new().on(HAZARD, Reply::Fail("quota".to_string())));
        let assessment = fetch_hazard_assessment(
            &test_support::collaborator(&provider),
            &WeatherSnapshot::offline("Arches"),
            false,
        )
        .await;
        assert_eq!(assessment, HazardAssessment::fallback());
    }

    #[tokio::test]
    async fn unusable_reply_yields_fallback() {
        let weather = WeatherSnapshot::offline("Canyonlands");
        for reply in [
            Reply::Text("Conditions look mostly fine, stay hydrated.".to_string()),
            Reply::Empty,
            Reply::json(&json!({ "notes": "calm" })),
        ] {
            let provider = Arc::new(ScriptedProvider::new().on(HAZARD, reply));
            let assessment =
                fetch_hazard_assessment(&test_support::collaborator(&provider), &weather, true)
                    .await;
            assert_eq!(assessment, HazardAssessment::fallback());
            assert_eq!(assessment.heat.description(), "N/A");
        }
    }

    #[tokio::test]
    async fn request_has_no_grounding() {
        let provider = Arc::new(ScriptedProvider::new());
        let _ = fetch_hazard_assessment(
            &test_support::collaborator(&provider),
            &WeatherSnapshot::offline("Arches"),
            false,
        )
        .await;
        let calls = provider.calls();
        assert!(!calls[0].options.search_grounding);
        assert!(calls[0].options.json_output);
    }
}
