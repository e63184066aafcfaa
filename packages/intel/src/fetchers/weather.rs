//! Live weather conditions, grounded in web search.

use chrono::Utc;
use serde::Deserialize;
use wildsafe_ai::{GenerateOptions, ModelTier};
use wildsafe_intel_models::WeatherSnapshot;

use super::{Collaborator, RequestProfile};
use crate::normalize::{lenient, lenient_number, normalize_record};

/// Weather must reflect live conditions, so search grounding is on.
pub const PROFILE: RequestProfile = RequestProfile {
    tier: ModelTier::Fast,
    options: GenerateOptions {
        search_grounding: true,
        json_output: true,
        reasoning_budget: None,
    },
};

fn build_prompt(location: &str) -> String {
    format!(
        r#"CRITICAL INSTRUCTION: Perform a web search to find the ACTUAL CURRENT weather for "{location}".
Do NOT use default values.

Required JSON structure:
{{
  "temp": number (Celsius),
  "condition": string,
  "windSpeed": number (km/h),
  "windDir": string (e.g. "NW"),
  "humidity": number (%),
  "precipProb": number (%),
  "visibility": number (km),
  "sunset": string (local time),
  "elevation": number (meters),
  "confidence": number (0-100)
}}"#
    )
}

/// Partial weather record as the model reports it.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WeatherPatch {
    #[serde(default, deserialize_with = "lenient_number")]
    temp: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    condition: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    wind_speed: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    wind_dir: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    humidity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    precip_prob: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    visibility: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    sunset: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    elevation: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    confidence: Option<f64>,
}

impl WeatherPatch {
    /// Overlays reported fields on `base`. The location name always stays
    /// the caller's and the capture time is reset to now.
    fn overlay(self, base: WeatherSnapshot) -> WeatherSnapshot {
        WeatherSnapshot {
            temperature_c: self.temp.unwrap_or(base.temperature_c),
            condition: self.condition.unwrap_or(base.condition),
            wind_speed_kmh: self.wind_speed.unwrap_or(base.wind_speed_kmh),
            wind_direction: self.wind_dir.unwrap_or(base.wind_direction),
            humidity_pct: self.humidity.unwrap_or(base.humidity_pct),
            precip_probability_pct: self.precip_prob.unwrap_or(base.precip_probability_pct),
            visibility_km: self.visibility.unwrap_or(base.visibility_km),
            sunset: self.sunset.unwrap_or(base.sunset),
            elevation_m: self.elevation.unwrap_or(base.elevation_m),
            confidence: self.confidence.unwrap_or(base.confidence),
            location_name: base.location_name,
            captured_at: Utc::now(),
        }
    }
}

/// Fetches current conditions for `location`.
///
/// Returns [`WeatherSnapshot::offline`] if the collaborator fails.
pub async fn fetch_weather(collaborator: &Collaborator, location: &str) -> WeatherSnapshot {
    let fallback = WeatherSnapshot::offline(location);

    match collaborator.generate(&PROFILE, &build_prompt(location)).await {
        Ok(text) => normalize_record::<WeatherPatch>(text.as_deref()).overlay(fallback),
        Err(e) => {
            log::warn!("Weather fetch quota/network error for {location}: {e}");
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::test_support::{self, Reply, ScriptedProvider, WEATHER};

    fn sample() -> serde_json::Value {
        json!({
            "temp": 11.5,
            "condition": "Light rain",
            "windSpeed": 18,
            "windDir": "SW",
            "humidity": 88,
            "precipProb": 70,
            "visibility": 6,
            "sunset": "19:42",
            "elevation": 420,
            "confidence": 82,
            "locationName": "Somewhere Else"
        })
    }

    #[tokio::test]
    async fn parses_and_pins_location_name() {
        let provider =
            Arc::new(ScriptedProvider::new().on(WEATHER, Reply::json(&sample())));
        let weather =
            fetch_weather(&test_support::collaborator(&provider), "Olympic National Park").await;

        assert!((weather.temperature_c - 11.5).abs() < f64::EPSILON);
        assert_eq!(weather.condition, "Light rain");
        assert_eq!(weather.wind_direction, "SW");
        assert!((weather.confidence - 82.0).abs() < f64::EPSILON);
        assert_eq!(weather.location_name, "Olympic National Park");
        assert!(!weather.is_offline());
    }

    #[tokio::test]
    async fn request_uses_fast_tier_with_grounding_and_json() {
        let provider = Arc::new(ScriptedProvider::new());
        let _ = fetch_weather(&test_support::collaborator(&provider), "Zion").await;

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].model, "fast-model");
        assert!(calls[0].options.search_grounding);
        assert!(calls[0].options.json_output);
        assert!(calls[0].prompt.contains("\"Zion\""));
    }

    #[tokio::test]
    async fn network_error_yields_offline_snapshot() {
        let provider = Arc::new(
            ScriptedProvider::new().on(WEATHER, Reply::Fail("connection reset".to_string())),
        );
        let weather = fetch_weather(&test_support::collaborator(&provider), "Denali").await;

        assert!(weather.is_offline());
        assert_eq!(weather.condition, "OFFLINE/DATA ERROR");
        assert!(weather.temperature_c.abs() < f64::EPSILON);
        assert!(weather.confidence.abs() < f64::EPSILON);
        assert_eq!(weather.location_name, "Denali");
    }

    #[tokio::test]
    async fn omitted_fields_keep_placeholders() {
        let provider = Arc::new(ScriptedProvider::new().on(
            WEATHER,
            Reply::Text("```json\n{\"temp\": \"4\", \"condition\": \"Snow\"}\n```".to_string()),
        ));
        let weather = fetch_weather(&test_support::collaborator(&provider), "Banff").await;

        assert!((weather.temperature_c - 4.0).abs() < f64::EPSILON);
        assert_eq!(weather.condition, "Snow");
        assert_eq!(weather.wind_direction, "--");
        assert_eq!(weather.sunset, "--:--");
        assert!(weather.confidence.abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn prose_reply_degrades_to_placeholder_without_error() {
        let provider = Arc::new(ScriptedProvider::new().on(
            WEATHER,
            Reply::Text("I could not find current conditions.".to_string()),
        ));
        let weather = fetch_weather(&test_support::collaborator(&provider), "Moab").await;
        assert!(weather.is_offline());
    }

    #[tokio::test]
    async fn identical_payloads_differ_only_in_timestamp() {
        let provider =
            Arc::new(ScriptedProvider::new().on(WEATHER, Reply::json(&sample())));
        let collaborator = test_support::collaborator(&provider);

        let first = fetch_weather(&collaborator, "Olympic National Park").await;
        let mut second = fetch_weather(&collaborator, "Olympic National Park").await;

        assert!(second.captured_at >= first.captured_at);
        second.captured_at = first.captured_at;
        assert_eq!(first, second);
    }
}
