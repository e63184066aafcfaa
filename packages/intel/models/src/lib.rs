#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Record types for wilderness-safety intelligence.
//!
//! Every result record here is an immutable value produced by one refresh
//! cycle. Each record type has a fully-populated fallback constructor so a
//! caller never observes a partially filled record.

pub mod hazard;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use hazard::{HazardLevel, Severity, score_to_level};

/// Geographic coordinates in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
}

/// A free-text area name plus optional coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationQuery {
    text: String,
    coordinates: Option<Coordinates>,
}

impl LocationQuery {
    /// Builds a query from user input. Returns `None` when the input is
    /// blank after trimming.
    #[must_use]
    pub fn new(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            text: text.to_string(),
            coordinates: None,
        })
    }

    /// Attaches opportunistic coordinates.
    #[must_use]
    pub const fn with_coordinates(mut self, coordinates: Option<Coordinates>) -> Self {
        self.coordinates = coordinates;
        self
    }

    /// The trimmed area name.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Coordinates, when the geolocation provider supplied them.
    #[must_use]
    pub const fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }
}

/// The user's self-reported capability profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCapability {
    /// Backcountry experience, 0-100.
    pub experience: u8,
    /// Physical fitness, 0-100.
    pub fitness: u8,
    /// Pack weight in kilograms.
    pub pack_weight_kg: f64,
    /// Number of people in the party.
    pub group_size: u32,
    /// Planned start time, `HH:MM`.
    pub start_time: String,
}

impl Default for UserCapability {
    fn default() -> Self {
        Self {
            experience: 50,
            fitness: 60,
            pack_weight_kg: 12.0,
            group_size: 2,
            start_time: "07:30".to_string(),
        }
    }
}

impl UserCapability {
    /// Checks every field against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCapabilityError`] naming the first field that is
    /// out of range.
    pub fn validate(&self) -> Result<(), InvalidCapabilityError> {
        if self.experience > 100 {
            return Err(InvalidCapabilityError::new("experience", "must be 0-100"));
        }
        if self.fitness > 100 {
            return Err(InvalidCapabilityError::new("fitness", "must be 0-100"));
        }
        if !self.pack_weight_kg.is_finite() || self.pack_weight_kg < 0.0 {
            return Err(InvalidCapabilityError::new(
                "packWeightKg",
                "must be a non-negative number",
            ));
        }
        if self.group_size == 0 {
            return Err(InvalidCapabilityError::new("groupSize", "must be at least 1"));
        }
        if NaiveTime::parse_from_str(&self.start_time, "%H:%M").is_err() {
            return Err(InvalidCapabilityError::new("startTime", "must be HH:MM"));
        }
        Ok(())
    }
}

/// Error returned by [`UserCapability::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidCapabilityError {
    /// Name of the offending field.
    pub field: &'static str,
    /// What the field must satisfy.
    pub reason: &'static str,
}

impl InvalidCapabilityError {
    const fn new(field: &'static str, reason: &'static str) -> Self {
        Self { field, reason }
    }
}

impl std::fmt::Display for InvalidCapabilityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}: {}", self.field, self.reason)
    }
}

impl std::error::Error for InvalidCapabilityError {}

/// Visual theme. [`ThemeMode::Fire`] doubles as the fire-mode switch.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum ThemeMode {
    /// Default dark theme.
    #[default]
    Night,
    /// Warm orange palette.
    Sunrise,
    /// Cool blue palette.
    Rain,
    /// Wildfire mode: enables fire prompts, panels and the alert search.
    Fire,
    /// Green palette.
    Earth,
}

impl ThemeMode {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Night, Self::Sunrise, Self::Rain, Self::Fire, Self::Earth]
    }

    /// Whether this theme activates fire-mode.
    #[must_use]
    pub const fn is_fire_mode(self) -> bool {
        matches!(self, Self::Fire)
    }
}

/// Current conditions for a location.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    /// Air temperature in °C.
    pub temperature_c: f64,
    /// Short condition label, e.g. "Light rain".
    pub condition: String,
    /// Wind speed in km/h.
    pub wind_speed_kmh: f64,
    /// Compass direction the wind blows from, e.g. "NW".
    pub wind_direction: String,
    /// Relative humidity in percent.
    pub humidity_pct: f64,
    /// Precipitation probability in percent.
    pub precip_probability_pct: f64,
    /// Visibility in kilometres.
    pub visibility_km: f64,
    /// Local sunset time as reported.
    pub sunset: String,
    /// Elevation in metres.
    pub elevation_m: f64,
    /// The model's self-reported certainty, 0-100.
    pub confidence: f64,
    /// The location the caller asked about.
    pub location_name: String,
    /// When this snapshot was produced.
    pub captured_at: DateTime<Utc>,
}

impl WeatherSnapshot {
    /// Condition label carried by [`Self::offline`].
    pub const OFFLINE_CONDITION: &'static str = "OFFLINE/DATA ERROR";

    /// Placeholder snapshot used when live conditions are unavailable.
    #[must_use]
    pub fn offline(location_name: &str) -> Self {
        Self {
            temperature_c: 0.0,
            condition: Self::OFFLINE_CONDITION.to_string(),
            wind_speed_kmh: 0.0,
            wind_direction: "--".to_string(),
            humidity_pct: 0.0,
            precip_probability_pct: 0.0,
            visibility_km: 0.0,
            sunset: "--:--".to_string(),
            elevation_m: 0.0,
            confidence: 0.0,
            location_name: location_name.to_string(),
            captured_at: Utc::now(),
        }
    }

    /// Whether this is the offline placeholder.
    #[must_use]
    pub fn is_offline(&self) -> bool {
        self.condition == Self::OFFLINE_CONDITION
    }
}

/// Fire-specific detail block, present only in fire-mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FireDetails {
    /// Overall fire danger rating as worded by the model.
    pub danger_rating: String,
    /// How wind affects spread.
    pub wind_effect: String,
    /// Recent drying trend.
    pub drying_trend: String,
    /// Fuel dryness.
    pub fuel_dryness: String,
    /// Free-text interpretation.
    pub interpretation: String,
}

/// Per-category hazard ratings plus an aggregate safety score.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HazardAssessment {
    /// Thunderstorm / lightning risk.
    pub thunderstorm: HazardLevel,
    /// Heat illness risk.
    pub heat: HazardLevel,
    /// Cold exposure risk.
    pub cold: HazardLevel,
    /// Wildfire risk.
    pub fire: HazardLevel,
    /// Flood risk.
    pub flood: HazardLevel,
    /// Aggregate safety, 0-100, higher is safer.
    pub safety_score: f64,
    /// Fire detail block (fire-mode only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fire_details: Option<FireDetails>,
}

impl HazardAssessment {
    /// Safety score used when none was supplied.
    pub const DEFAULT_SAFETY_SCORE: f64 = 50.0;

    /// Fallback: every hazard unassessed, neutral safety score.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            thunderstorm: HazardLevel::unassessed(),
            heat: HazardLevel::unassessed(),
            cold: HazardLevel::unassessed(),
            fire: HazardLevel::unassessed(),
            flood: HazardLevel::unassessed(),
            safety_score: Self::DEFAULT_SAFETY_SCORE,
            fire_details: None,
        }
    }

    /// The five hazards with their display names, in display order.
    #[must_use]
    pub fn hazards(&self) -> [(&'static str, &HazardLevel); 5] {
        [
            ("Thunderstorm", &self.thunderstorm),
            ("Heat Stress", &self.heat),
            ("Cold Exposure", &self.cold),
            ("Fire Weather", &self.fire),
            ("Flood Risk", &self.flood),
        ]
    }

    /// The most severe of the five hazards.
    #[must_use]
    pub fn worst(&self) -> Severity {
        self.hazards()
            .iter()
            .map(|(_, h)| h.level())
            .max()
            .unwrap_or(Severity::Low)
    }
}

/// Terrain characteristics for a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TerrainProfile {
    /// Terrain type, e.g. "Temperate rainforest".
    pub terrain_type: String,
    /// Exposure category.
    pub exposure: String,
    /// Named hazards, in the order the model listed them.
    pub hazards: Vec<String>,
    /// Advisory note.
    pub ranger_note: String,
}

impl TerrainProfile {
    /// Fallback used when no terrain analysis is available.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            terrain_type: "Unknown".to_string(),
            exposure: "Moderate".to_string(),
            hazards: Vec::new(),
            ranger_note: "Maintain visual scout.".to_string(),
        }
    }
}

/// Go / no-go recommendation status.
///
/// The variants are listed by increasing severity for color mapping, but
/// this is deliberately not `Ord`: use [`Self::severity_rank`] for display
/// only.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum GuidanceStatus {
    /// Conditions are favorable.
    Go,
    /// Proceed with care.
    Caution,
    /// Change the plan (route, timing, party).
    Modify,
    /// Do not go.
    #[serde(rename = "NOGO", alias = "NO_GO", alias = "NO-GO")]
    #[strum(serialize = "NOGO")]
    NoGo,
}

impl GuidanceStatus {
    /// 0 for GO through 3 for NOGO.
    #[must_use]
    pub const fn severity_rank(self) -> u8 {
        match self {
            Self::Go => 0,
            Self::Caution => 1,
            Self::Modify => 2,
            Self::NoGo => 3,
        }
    }
}

/// The ranger's recommendation for the planned outing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidanceVerdict {
    /// Recommendation.
    pub status: GuidanceStatus,
    /// Why.
    pub reasoning: String,
    /// Packing and preparation hints, in priority order.
    pub packing_hints: Vec<String>,
    /// Narrative summary.
    pub summary: String,
    /// Safety index, 0-100, higher is safer.
    pub safety_index: f64,
}

impl GuidanceVerdict {
    /// Fallback used when the guidance model cannot be reached.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            status: GuidanceStatus::Caution,
            reasoning: "AI Logic unreachable. Use local terrain observation.".to_string(),
            packing_hints: vec!["Review local signs".to_string(), "Stay alert".to_string()],
            summary: "Intelligence engine connection failed.".to_string(),
            safety_index: 50.0,
        }
    }
}

/// Color band for a 0-100 safety index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SafetyBand {
    /// Above 80.
    Safe,
    /// Above 50.
    Fair,
    /// Above 30.
    Poor,
    /// 30 or below.
    Critical,
}

impl SafetyBand {
    /// Buckets a safety index.
    #[must_use]
    pub fn from_index(index: f64) -> Self {
        if index > 80.0 {
            Self::Safe
        } else if index > 50.0 {
            Self::Fair
        } else if index > 30.0 {
            Self::Poor
        } else {
            Self::Critical
        }
    }
}
