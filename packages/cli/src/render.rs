//! Terminal rendering of a [`DashboardState`].
//!
//! Colors are applied with `console` and disappear automatically when
//! stdout is not a terminal.

use std::fmt::Write as _;

use console::{Color, Style, style};
use wildsafe_intel::DashboardState;
use wildsafe_intel_models::{
    GuidanceStatus, GuidanceVerdict, HazardAssessment, SafetyBand, Severity, TerrainProfile,
    ThemeMode, WeatherSnapshot,
};

const RULE_WIDTH: usize = 60;

/// Accent color for a theme.
#[must_use]
pub const fn theme_accent(theme: ThemeMode) -> Color {
    match theme {
        ThemeMode::Night => Color::Color256(105),
        ThemeMode::Sunrise => Color::Color256(214),
        ThemeMode::Rain => Color::Color256(117),
        ThemeMode::Fire => Color::Color256(202),
        ThemeMode::Earth => Color::Color256(42),
    }
}

const fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Low => Color::Green,
        Severity::Moderate => Color::Yellow,
        Severity::High => Color::Color256(208),
        Severity::Extreme => Color::Red,
    }
}

const fn status_color(status: GuidanceStatus) -> Color {
    match status.severity_rank() {
        0 => Color::Green,
        1 => Color::Yellow,
        2 => Color::Color256(208),
        _ => Color::Red,
    }
}

const fn band_color(band: SafetyBand) -> Color {
    match band {
        SafetyBand::Safe => Color::Green,
        SafetyBand::Fair => Color::Yellow,
        SafetyBand::Poor => Color::Color256(208),
        SafetyBand::Critical => Color::Red,
    }
}

/// Renders the full dashboard as plain (optionally colored) text.
#[must_use]
pub fn render_dashboard(state: &DashboardState) -> String {
    let accent = Style::new().fg(theme_accent(state.theme)).bold();
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} {}",
        accent.apply_to("WILDSAFE"),
        style(format!("[{}]", state.theme)).dim()
    );
    let _ = writeln!(out, "Location: {}", state.location_input);
    if let Some(coordinates) = state.coordinates {
        let _ = writeln!(
            out,
            "Position: {:.4}, {:.4}",
            coordinates.latitude, coordinates.longitude
        );
    }
    if state.cycle.busy {
        let _ = writeln!(
            out,
            "{} {}%",
            style(state.cycle.phase).italic(),
            state.cycle.progress
        );
    }

    let report = &state.report;
    match &report.weather {
        Some(weather) => render_weather(&mut out, &accent, weather),
        None if state.cycle.weather_pending => {
            section(&mut out, &accent, "Conditions", "Scanning...");
        }
        None => section(&mut out, &accent, "Conditions", "No data yet."),
    }
    if let Some(guidance) = &report.guidance {
        render_guidance(&mut out, &accent, guidance);
    }
    if let Some(assessment) = &report.assessment {
        render_hazards(&mut out, &accent, assessment, state.is_fire_mode());
    }
    if let Some(terrain) = &report.terrain {
        render_terrain(&mut out, &accent, terrain);
    }
    if let Some(digest) = report.fire_alerts.as_ref().filter(|_| state.is_fire_mode()) {
        section(&mut out, &accent, "Fire Alerts", digest);
    }

    let _ = writeln!(
        out,
        "\n{}",
        style("Forecasts are model-generated and may be wrong. Verify with local authorities.")
            .dim()
    );

    out
}

fn heading(out: &mut String, accent: &Style, title: &str) {
    let _ = writeln!(
        out,
        "\n{} {}",
        accent.apply_to(title.to_uppercase()),
        style("-".repeat(RULE_WIDTH.saturating_sub(title.len() + 1))).dim()
    );
}

fn section(out: &mut String, accent: &Style, title: &str, body: &str) {
    heading(out, accent, title);
    let _ = writeln!(out, "{body}");
}

fn render_weather(out: &mut String, accent: &Style, weather: &WeatherSnapshot) {
    heading(out, accent, "Conditions");
    let condition = if weather.is_offline() {
        style(weather.condition.as_str()).red().bold()
    } else {
        style(weather.condition.as_str())
    };
    let _ = writeln!(
        out,
        "{}°C  {condition}  (confidence {}%)",
        weather.temperature_c, weather.confidence
    );
    let _ = writeln!(
        out,
        "Wind {} km/h {}  Humidity {}%  Precip {}%",
        weather.wind_speed_kmh,
        weather.wind_direction,
        weather.humidity_pct,
        weather.precip_probability_pct
    );
    let _ = writeln!(
        out,
        "Visibility {} km  Elevation {} m  Sunset {}",
        weather.visibility_km, weather.elevation_m, weather.sunset
    );
    let _ = writeln!(
        out,
        "{}",
        style(format!(
            "Captured {}",
            weather.captured_at.format("%Y-%m-%d %H:%M UTC")
        ))
        .dim()
    );
}

fn render_guidance(out: &mut String, accent: &Style, guidance: &GuidanceVerdict) {
    heading(out, accent, "Ranger Guidance");
    let band = SafetyBand::from_index(guidance.safety_index);
    let _ = writeln!(
        out,
        "{}  safety {}",
        style(guidance.status).fg(status_color(guidance.status)).bold(),
        style(format!("{}/100 ({band})", guidance.safety_index)).fg(band_color(band))
    );
    let _ = writeln!(out, "{}", guidance.summary);
    let _ = writeln!(out, "{}", style(guidance.reasoning.as_str()).dim());
    if !guidance.packing_hints.is_empty() {
        let _ = writeln!(out, "Pack:");
        for hint in &guidance.packing_hints {
            let _ = writeln!(out, "  - {hint}");
        }
    }
}

fn render_hazards(
    out: &mut String,
    accent: &Style,
    assessment: &HazardAssessment,
    fire_mode: bool,
) {
    heading(out, accent, "Hazards");
    for (name, hazard) in assessment.hazards() {
        let highlight = fire_mode && name == "Fire Weather";
        let label = format!("{name:<14}");
        let label = if highlight {
            style(label).fg(theme_accent(ThemeMode::Fire)).bold()
        } else {
            style(label)
        };
        let _ = writeln!(
            out,
            "{label} {:<9} {}",
            style(hazard.label()).fg(severity_color(hazard.level())),
            style(hazard.description()).dim()
        );
    }
    let band = SafetyBand::from_index(assessment.safety_score);
    let _ = writeln!(
        out,
        "Safety score {}",
        style(format!("{}/100", assessment.safety_score)).fg(band_color(band))
    );

    if let Some(details) = &assessment.fire_details {
        let _ = writeln!(out, "Fire danger: {}", details.danger_rating);
        let _ = writeln!(out, "  Wind effect:  {}", details.wind_effect);
        let _ = writeln!(out, "  Fuel dryness: {}", details.fuel_dryness);
        let _ = writeln!(out, "  Drying trend: {}", details.drying_trend);
        let _ = writeln!(out, "  {}", details.interpretation);
    }
}

fn render_terrain(out: &mut String, accent: &Style, terrain: &TerrainProfile) {
    heading(out, accent, "Terrain");
    let _ = writeln!(out, "{}  exposure {}", terrain.terrain_type, terrain.exposure);
    if !terrain.hazards.is_empty() {
        let _ = writeln!(out, "Hazards: {}", terrain.hazards.join(", "));
    }
    let _ = writeln!(out, "Ranger note: {}", terrain.ranger_note);
}

/// Renders the last-known results as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_json(state: &DashboardState) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&serde_json::json!({
        "location": state.location_input,
        "theme": state.theme,
        "coordinates": state.coordinates,
        "report": state.report,
    }))
}

#[cfg(test)]
mod tests {
    use wildsafe_intel::IntelReport;

    use super::*;

    fn state(theme: ThemeMode) -> DashboardState {
        let mut assessment = HazardAssessment::fallback();
        assessment.fire = wildsafe_intel_models::HazardLevel::from_score(Some(91.0));
        DashboardState {
            theme,
            report: IntelReport {
                weather: Some(WeatherSnapshot::offline("Olympic National Park")),
                assessment: Some(assessment),
                guidance: Some(GuidanceVerdict::fallback()),
                terrain: Some(TerrainProfile::fallback()),
                fire_alerts: Some("No localized fire alerts found.".to_string()),
            },
            ..DashboardState::default()
        }
    }

    #[test]
    fn renders_placeholders_and_hazards() {
        console::set_colors_enabled(false);
        let text = render_dashboard(&state(ThemeMode::Night));

        assert!(text.contains("OFFLINE/DATA ERROR"));
        assert!(text.contains("CAUTION"));
        assert!(text.contains("Fire Weather"));
        assert!(text.contains("EXTREME"));
        assert!(text.contains("91% calculated risk"));
        assert!(text.contains("Review local signs"));
        assert!(text.contains("Maintain visual scout."));
        assert!(!text.contains("FIRE ALERTS"));
    }

    #[test]
    fn fire_alerts_only_in_fire_mode() {
        console::set_colors_enabled(false);
        let text = render_dashboard(&state(ThemeMode::Fire));
        assert!(text.contains("FIRE ALERTS"));
        assert!(text.contains("No localized fire alerts found."));
    }

    #[test]
    fn empty_dashboard_has_no_data() {
        console::set_colors_enabled(false);
        let text = render_dashboard(&DashboardState::default());
        assert!(text.contains("No data yet."));
        assert!(!text.contains("HAZARDS"));
    }

    #[test]
    fn json_contains_report() {
        let json = render_json(&state(ThemeMode::Fire)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["theme"], "FIRE");
        assert_eq!(value["report"]["guidance"]["status"], "CAUTION");
        assert_eq!(value["report"]["assessment"]["fire"]["level"], "EXTREME");
        assert_eq!(value["report"]["weather"]["condition"], "OFFLINE/DATA ERROR");
    }
}
