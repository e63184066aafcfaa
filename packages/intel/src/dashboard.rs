//! Presentation state for one running application.
//!
//! [`Dashboard`] is the single owner of everything the UI renders: theme,
//! user profile, the location being searched, last-known results and the
//! state of the refresh cycle. Readers take cloned [`DashboardState`]
//! snapshots; only the orchestrator publishes results, through the
//! [`CycleGuard`] it holds for the duration of a cycle.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use strum_macros::{AsRefStr, Display};
use wildsafe_intel_models::{
    Coordinates, GuidanceVerdict, HazardAssessment, LocationQuery, TerrainProfile, ThemeMode,
    UserCapability, WeatherSnapshot,
};

use crate::progress::ProgressCallback;

/// Progress shown when a cycle starts.
pub const PROGRESS_STARTED: u8 = 10;
/// Progress once the weather request has been issued.
pub const PROGRESS_WEATHER_REQUESTED: u8 = 20;
/// Progress once weather has been published.
pub const PROGRESS_WEATHER_READY: u8 = 45;
/// Progress once hazard, guidance and terrain have settled.
pub const PROGRESS_DERIVED_READY: u8 = 85;
/// Progress at the end of a cycle, before the reset to idle.
pub const PROGRESS_DONE: u8 = 100;

/// Default location searched when nothing else is configured.
pub const DEFAULT_LOCATION: &str = "Olympic National Park";

/// Where the refresh state machine currently is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "title_case")]
pub enum RefreshPhase {
    #[default]
    Idle,
    FetchingWeather,
    FetchingDerived,
    FetchingFireAlerts,
}

impl RefreshPhase {
    /// Whether a cycle is in flight.
    #[must_use]
    pub const fn is_fetching(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// Transient state of the current refresh cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshCycle {
    pub phase: RefreshPhase,
    /// Coarse 0-100 progress.
    pub progress: u8,
    /// Set for the whole cycle; doubles as the reentrancy guard.
    pub busy: bool,
    /// Set until the cycle's weather has been published.
    pub weather_pending: bool,
    /// The query this cycle is answering.
    #[serde(skip)]
    pub query: Option<LocationQuery>,
}

/// Last-known results. Each slot is replaced wholesale by the next cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntelReport {
    pub weather: Option<WeatherSnapshot>,
    pub assessment: Option<HazardAssessment>,
    pub guidance: Option<GuidanceVerdict>,
    pub terrain: Option<TerrainProfile>,
    /// Only populated by cycles that ran in fire-mode.
    pub fire_alerts: Option<String>,
}

/// Cloned view of the dashboard for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardState {
    pub theme: ThemeMode,
    pub user: UserCapability,
    pub location_input: String,
    pub coordinates: Option<Coordinates>,
    pub report: IntelReport,
    pub cycle: RefreshCycle,
    pub mounted: bool,
}

impl DashboardState {
    /// Fire-mode is derived from the theme.
    #[must_use]
    pub const fn is_fire_mode(&self) -> bool {
        self.theme.is_fire_mode()
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            theme: ThemeMode::default(),
            user: UserCapability::default(),
            location_input: DEFAULT_LOCATION.to_string(),
            coordinates: None,
            report: IntelReport::default(),
            cycle: RefreshCycle::default(),
            mounted: false,
        }
    }
}

/// Why a refresh request did not start a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleRejection {
    Unmounted,
    EmptyLocation,
    Busy,
}

/// Inputs captured when a cycle starts. Later edits to the dashboard do
/// not leak into a cycle already in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleInputs {
    pub query: LocationQuery,
    pub user: UserCapability,
    pub fire_mode: bool,
}

/// Shared presentation state.
#[derive(Debug, Default)]
pub struct Dashboard {
    state: RwLock<DashboardState>,
}

impl Dashboard {
    #[must_use]
    pub fn new(theme: ThemeMode, user: UserCapability, location: impl Into<String>) -> Self {
        Self {
            state: RwLock::new(DashboardState {
                theme,
                user,
                location_input: location.into(),
                ..DashboardState::default()
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, DashboardState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, DashboardState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clones the current state.
    #[must_use]
    pub fn snapshot(&self) -> DashboardState {
        self.read().clone()
    }

    #[must_use]
    pub fn theme(&self) -> ThemeMode {
        self.read().theme
    }

    #[must_use]
    pub fn is_fire_mode(&self) -> bool {
        self.read().is_fire_mode()
    }

    #[must_use]
    pub fn location_input(&self) -> String {
        self.read().location_input.clone()
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.read().cycle.busy
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.read().mounted
    }

    /// Switches theme. Takes effect for the next cycle.
    pub fn set_theme(&self, theme: ThemeMode) {
        self.write().theme = theme;
    }

    /// Replaces the user profile. Takes effect for the next cycle.
    pub fn set_user(&self, user: UserCapability) {
        self.write().user = user;
    }

    /// Records the text in the location field.
    pub fn set_location_input(&self, location: impl Into<String>) {
        self.write().location_input = location.into();
    }

    /// Records a position reported by the geolocation provider.
    pub fn set_coordinates(&self, coordinates: Coordinates) {
        self.write().coordinates = Some(coordinates);
    }

    /// Marks the dashboard mounted. Returns `false` if it already was.
    pub fn mount(&self) -> bool {
        let mut state = self.write();
        if state.mounted {
            return false;
        }
        state.mounted = true;
        true
    }

    /// Marks the dashboard unmounted; later refresh requests are ignored.
    pub fn unmount(&self) {
        self.write().mounted = false;
    }

    /// Claims the refresh cycle for `location`.
    ///
    /// The check and the claim happen under one write lock, so two callers
    /// can never both start a cycle. On success the cycle is in
    /// [`RefreshPhase::FetchingWeather`] at [`PROGRESS_STARTED`] and stays
    /// claimed until the returned guard is dropped.
    ///
    /// # Errors
    ///
    /// * [`CycleRejection::Unmounted`] if the dashboard is not mounted
    /// * [`CycleRejection::EmptyLocation`] if `location` is blank
    /// * [`CycleRejection::Busy`] if a cycle is already in flight
    pub fn begin_cycle<'a>(
        &'a self,
        location: &str,
        progress: &'a dyn ProgressCallback,
    ) -> Result<(CycleGuard<'a>, CycleInputs), CycleRejection> {
        let inputs = {
            let mut state = self.write();

            if !state.mounted {
                return Err(CycleRejection::Unmounted);
            }
            let query = LocationQuery::new(location)
                .ok_or(CycleRejection::EmptyLocation)?
                .with_coordinates(state.coordinates);
            if state.cycle.busy {
                return Err(CycleRejection::Busy);
            }

            state.cycle = RefreshCycle {
                phase: RefreshPhase::FetchingWeather,
                progress: PROGRESS_STARTED,
                busy: true,
                weather_pending: true,
                query: Some(query.clone()),
            };

            CycleInputs {
                query,
                user: state.user.clone(),
                fire_mode: state.is_fire_mode(),
            }
        };

        progress.set_position(u64::from(PROGRESS_STARTED));
        progress.set_message(format!("Scanning {}", inputs.query.text()));

        Ok((
            CycleGuard {
                dashboard: self,
                progress,
            },
            inputs,
        ))
    }
}

/// Exclusive claim on the refresh cycle.
///
/// Results are published through the guard. Dropping it returns the cycle
/// to idle (busy cleared, progress 0) whichever way the cycle ended.
pub struct CycleGuard<'a> {
    dashboard: &'a Dashboard,
    progress: &'a dyn ProgressCallback,
}

impl CycleGuard<'_> {
    /// Moves to `phase` at `progress` percent.
    pub fn advance(&self, phase: RefreshPhase, progress: u8) {
        {
            let mut state = self.dashboard.write();
            state.cycle.phase = phase;
            state.cycle.progress = progress;
        }
        self.progress.set_position(u64::from(progress));
        self.progress.set_message(phase.to_string());
    }

    /// Moves to `phase` without moving the progress position.
    pub fn enter_phase(&self, phase: RefreshPhase) {
        self.dashboard.write().cycle.phase = phase;
        self.progress.set_message(phase.to_string());
    }

    /// Publishes this cycle's weather and moves to the derived phase.
    pub fn publish_weather(&self, weather: WeatherSnapshot) {
        {
            let mut state = self.dashboard.write();
            state.report.weather = Some(weather);
            state.cycle.weather_pending = false;
        }
        self.advance(RefreshPhase::FetchingDerived, PROGRESS_WEATHER_READY);
    }

    /// Publishes the derived group's results together.
    ///
    /// A slot whose fetcher panicked is passed as `None` and cleared, so a
    /// previous cycle's record is never shown beside this cycle's weather.
    pub fn publish_derived(
        &self,
        assessment: Option<HazardAssessment>,
        guidance: Option<GuidanceVerdict>,
        terrain: Option<TerrainProfile>,
    ) {
        {
            let mut state = self.dashboard.write();
            state.report.assessment = assessment;
            state.report.guidance = guidance;
            state.report.terrain = terrain;
            state.cycle.progress = PROGRESS_DERIVED_READY;
        }
        self.progress.set_position(u64::from(PROGRESS_DERIVED_READY));
    }

    /// Publishes the fire-alert digest, or clears it for a cycle that ran
    /// outside fire-mode.
    pub fn publish_fire_alerts(&self, digest: Option<String>) {
        self.dashboard.write().report.fire_alerts = digest;
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.dashboard.write().cycle = RefreshCycle::default();
        self.progress.set_position(0);
        self.progress.finish_and_clear();
    }
}
