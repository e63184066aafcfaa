//! Hazard severity scale and the score-to-level mapping.
//!
//! Every [`HazardLevel`] is derived from a raw 0-100 score through
//! [`HazardLevel::from_score`]; callers never pick a severity by hand.

use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumString};

/// Score above which a hazard is [`Severity::Extreme`].
pub const EXTREME_THRESHOLD: f64 = 80.0;
/// Score above which a hazard is [`Severity::High`].
pub const HIGH_THRESHOLD: f64 = 60.0;
/// Score above which a hazard is [`Severity::Moderate`].
pub const MODERATE_THRESHOLD: f64 = 30.0;

/// Four-valued ordinal hazard severity.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Score 30 or below.
    Low,
    /// Score above 30, up to 60.
    Moderate,
    /// Score above 60, up to 80.
    High,
    /// Score above 80.
    Extreme,
}

impl Severity {
    /// Maps a raw score to a severity. Thresholds are checked from the top
    /// down and the first match wins; anything else (including NaN) is
    /// [`Severity::Low`].
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score > EXTREME_THRESHOLD {
            Self::Extreme
        } else if score > HIGH_THRESHOLD {
            Self::High
        } else if score > MODERATE_THRESHOLD {
            Self::Moderate
        } else {
            Self::Low
        }
    }
}

/// A scored hazard rating for a single risk category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HazardLevel {
    level: Severity,
    score: f64,
    label: String,
    description: String,
}

impl HazardLevel {
    /// Derives a hazard level from an optional raw score. A missing score
    /// counts as 0.
    #[must_use]
    pub fn from_score(score: Option<f64>) -> Self {
        let score = score.unwrap_or(0.0);
        let level = Severity::from_score(score);

        Self {
            level,
            score,
            label: level.to_string(),
            description: format!("{score}% calculated risk"),
        }
    }

    /// Placeholder rating used when no assessment could be obtained.
    #[must_use]
    pub fn unassessed() -> Self {
        Self {
            level: Severity::Low,
            score: 0.0,
            label: Severity::Low.to_string(),
            description: "N/A".to_string(),
        }
    }

    /// The discrete severity.
    #[must_use]
    pub const fn level(&self) -> Severity {
        self.level
    }

    /// The raw score that produced [`Self::level`].
    #[must_use]
    pub const fn score(&self) -> f64 {
        self.score
    }

    /// Display label; always the severity name.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Human-readable description embedding the score.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Maps an optional raw score to a [`HazardLevel`].
#[must_use]
pub fn score_to_level(score: Option<f64>) -> HazardLevel {
    HazardLevel::from_score(score)
}
