//! Refresh orchestration.
//!
//! One cycle runs `Idle → FetchingWeather → FetchingDerived →
//! FetchingFireAlerts (fire-mode only) → Idle`. Weather strictly precedes
//! the derived group (hazard, guidance, terrain), which runs concurrently
//! and is awaited as a whole before the optional fire-alert search. A
//! panicking fetcher in that group does not discard its siblings' results.
//!
//! At most one cycle runs per [`Dashboard`]; a request that arrives while
//! one is in flight is dropped, not queued. There is no per-fetch
//! deadline, so a stalled collaborator stalls the cycle.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt as _;
use tokio::sync::mpsc;

use crate::dashboard::{
    CycleGuard, CycleInputs, CycleRejection, Dashboard, PROGRESS_DONE, PROGRESS_WEATHER_REQUESTED,
    RefreshPhase,
};
use crate::fetchers::{
    Collaborator, fetch_fire_alerts, fetch_guidance, fetch_hazard_assessment, fetch_terrain,
    fetch_weather,
};
use crate::geolocation::{GeolocationProvider, spawn_locate};
use crate::progress::{ProgressCallback, null_progress};

/// How a refresh request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The cycle ran to the end.
    Completed,
    /// A panic escaped a fetcher. Every result that settled is kept.
    Aborted,
    /// Another cycle was in flight.
    SkippedBusy,
    /// The location was blank.
    SkippedEmptyLocation,
    /// The dashboard is not mounted.
    SkippedUnmounted,
}

impl RefreshOutcome {
    /// Whether a cycle actually ran.
    #[must_use]
    pub const fn ran(self) -> bool {
        matches!(self, Self::Completed | Self::Aborted)
    }
}

impl From<CycleRejection> for RefreshOutcome {
    fn from(value: CycleRejection) -> Self {
        match value {
            CycleRejection::Unmounted => Self::SkippedUnmounted,
            CycleRejection::EmptyLocation => Self::SkippedEmptyLocation,
            CycleRejection::Busy => Self::SkippedBusy,
        }
    }
}

/// Milestones of a running cycle, for UIs that render incrementally.
///
/// Read the results themselves from [`Dashboard::snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshEvent {
    Started,
    WeatherReady,
    DerivedReady,
    FireAlertsReady,
    Finished(RefreshOutcome),
}

/// Drives refresh cycles against one [`Dashboard`].
pub struct Orchestrator {
    collaborator: Collaborator,
    dashboard: Arc<Dashboard>,
    progress: Arc<dyn ProgressCallback>,
    events: Option<mpsc::Sender<RefreshEvent>>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(collaborator: Collaborator, dashboard: Arc<Dashboard>) -> Self {
        Self {
            collaborator,
            dashboard,
            progress: null_progress(),
            events: None,
        }
    }

    /// Reports cycle progress to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    /// Sends [`RefreshEvent`]s to `events`. The receiver must be drained,
    /// otherwise a full channel holds up the cycle.
    #[must_use]
    pub fn with_events(mut self, events: mpsc::Sender<RefreshEvent>) -> Self {
        self.events = Some(events);
        self
    }

    #[must_use]
    pub const fn dashboard(&self) -> &Arc<Dashboard> {
        &self.dashboard
    }

    /// Mounts the dashboard: starts the geolocation lookup in the
    /// background (if a provider is given) and runs the initial refresh
    /// for the current location input.
    ///
    /// Returns `None` if the dashboard was already mounted.
    pub async fn mount(
        &self,
        geolocation: Option<Arc<dyn GeolocationProvider>>,
    ) -> Option<RefreshOutcome> {
        if !self.dashboard.mount() {
            log::debug!("Dashboard already mounted; skipping initial refresh");
            return None;
        }

        if let Some(provider) = geolocation {
            spawn_locate(provider, Arc::clone(&self.dashboard));
        }

        Some(self.recalculate().await)
    }

    /// Unmounts the dashboard. A cycle in flight finishes, but no new one
    /// starts.
    pub fn unmount(&self) {
        self.dashboard.unmount();
    }

    /// Stores `location` as the location input and refreshes for it.
    pub async fn submit_location(&self, location: &str) -> RefreshOutcome {
        self.dashboard.set_location_input(location);
        self.refresh(location).await
    }

    /// Refreshes for the current location input.
    pub async fn recalculate(&self) -> RefreshOutcome {
        let location = self.dashboard.location_input();
        self.refresh(&location).await
    }

    /// Runs one refresh cycle for `location`.
    ///
    /// Skipped requests have no side effects. A cycle that starts always
    /// ends idle with busy cleared and progress 0, including when a fetcher
    /// panics.
    pub async fn refresh(&self, location: &str) -> RefreshOutcome {
        let (guard, inputs) = match self.dashboard.begin_cycle(location, self.progress.as_ref()) {
            Ok(claimed) => claimed,
            Err(rejection) => {
                log::debug!("Refresh for {location:?} skipped: {rejection:?}");
                return rejection.into();
            }
        };

        log::info!(
            "Refreshing intel for {} (fire mode {})",
            inputs.query.text(),
            if inputs.fire_mode { "on" } else { "off" },
        );
        self.emit(RefreshEvent::Started).await;

        let outcome = match AssertUnwindSafe(self.run_cycle(&guard, &inputs))
            .catch_unwind()
            .await
        {
            Ok(()) => RefreshOutcome::Completed,
            Err(panic) => {
                log::error!(
                    "Refresh for {} aborted: {}",
                    inputs.query.text(),
                    panic_message(panic.as_ref()),
                );
                RefreshOutcome::Aborted
            }
        };

        drop(guard);
        log::debug!("Refresh for {} finished: {outcome:?}", inputs.query.text());
        self.emit(RefreshEvent::Finished(outcome)).await;

        outcome
    }

    async fn run_cycle(&self, guard: &CycleGuard<'_>, inputs: &CycleInputs) {
        let collaborator = &self.collaborator;

        guard.advance(RefreshPhase::FetchingWeather, PROGRESS_WEATHER_REQUESTED);
        let weather = fetch_weather(collaborator, inputs.query.text()).await;
        if weather.is_offline() {
            log::warn!(
                "Weather offline for {}; continuing with placeholders",
                weather.location_name
            );
        }
        guard.publish_weather(weather.clone());
        self.emit(RefreshEvent::WeatherReady).await;

        let (assessment, guidance, terrain) = tokio::join!(
            AssertUnwindSafe(fetch_hazard_assessment(
                collaborator,
                &weather,
                inputs.fire_mode
            ))
            .catch_unwind(),
            AssertUnwindSafe(fetch_guidance(
                collaborator,
                &weather,
                &inputs.user,
                inputs.query.coordinates(),
                inputs.fire_mode,
            ))
            .catch_unwind(),
            AssertUnwindSafe(fetch_terrain(collaborator, &weather.location_name)).catch_unwind(),
        );

        let mut panics = Vec::new();
        let assessment = settled("hazard", assessment, &mut panics);
        let guidance = settled("guidance", guidance, &mut panics);
        let terrain = settled("terrain", terrain, &mut panics);
        log::debug!(
            "Derived intel for {}: worst hazard {}, guidance {}",
            weather.location_name,
            assessment
                .as_ref()
                .map_or_else(|| "unavailable".to_string(), |a| a.worst().to_string()),
            guidance
                .as_ref()
                .map_or_else(|| "unavailable".to_string(), |g| g.status.to_string()),
        );
        guard.publish_derived(assessment, guidance, terrain);
        self.emit(RefreshEvent::DerivedReady).await;

        if let Some(panic) = panics.into_iter().next() {
            std::panic::resume_unwind(panic);
        }

        if inputs.fire_mode {
            guard.enter_phase(RefreshPhase::FetchingFireAlerts);
            let digest = fetch_fire_alerts(collaborator, &weather.location_name).await;
            guard.publish_fire_alerts(Some(digest));
            self.emit(RefreshEvent::FireAlertsReady).await;
        } else {
            guard.publish_fire_alerts(None);
        }

        guard.advance(RefreshPhase::Idle, PROGRESS_DONE);
    }

    async fn emit(&self, event: RefreshEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event).await;
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("collaborator", &self.collaborator)
            .field("dashboard", &self.dashboard)
            .field("events", &self.events.is_some())
            .finish_non_exhaustive()
    }
}

/// Unwraps one derived fetch, keeping its panic for the cycle to re-raise
/// once every sibling has settled.
fn settled<T>(
    name: &str,
    result: std::thread::Result<T>,
    panics: &mut Vec<Box<dyn Any + Send>>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(panic) => {
            log::warn!("The {name} fetch panicked: {}", panic_message(panic.as_ref()));
            panics.push(panic);
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use serde_json::json;
    use tokio::sync::Notify;
    use wildsafe_intel_models::{GuidanceStatus, Severity, ThemeMode, WeatherSnapshot};

    use super::*;
    use crate::fetchers::fire_alerts::{NO_ALERTS, SYNC_FAILED};
    use crate::test_support::{
        self, FIRE_ALERTS, GUIDANCE, HAZARD, Reply, ScriptedProvider, TERRAIN, WEATHER,
    };

    fn well_formed() -> ScriptedProvider {
        ScriptedProvider::new()
            .on(
                WEATHER,
                Reply::json(&json!({
                    "temp": 14, "condition": "Overcast", "windSpeed": 9, "windDir": "W",
                    "humidity": 80, "precipProb": 35, "visibility": 12, "sunset": "18:55",
                    "elevation": 230, "confidence": 77
                })),
            )
            .on(
                HAZARD,
                Reply::json(&json!({
                    "thunderstorm": 20, "heat": 5, "cold": 40, "fire": 10, "flood": 55,
                    "safetyScore": 72
                })),
            )
            .on(
                GUIDANCE,
                Reply::json(&json!({
                    "status": "CAUTION", "reasoning": "Slick trails.",
                    "packingHints": ["Gaiters"], "aiSummary": "Go slow.", "safetyIndex": 70
                })),
            )
            .on(
                TERRAIN,
                Reply::json(&json!({
                    "type": "Temperate rainforest", "exposure": "Low",
                    "hazards": ["Blowdown"], "rangerNote": "Watch for washouts."
                })),
            )
            .on(FIRE_ALERTS, Reply::Text("No active incidents.".to_string()))
    }

    fn mounted(provider: &Arc<ScriptedProvider>) -> Orchestrator {
        let dashboard = Arc::new(Dashboard::default());
        dashboard.mount();
        Orchestrator::new(test_support::collaborator(provider), dashboard)
    }

    #[derive(Default)]
    struct RecordingProgress {
        positions: Mutex<Vec<u64>>,
    }

    impl ProgressCallback for RecordingProgress {
        fn set_position(&self, pos: u64) {
            self.positions.lock().unwrap().push(pos);
        }
        fn set_message(&self, _msg: String) {}
        fn finish_and_clear(&self) {}
    }

    #[tokio::test]
    async fn completes_with_all_slots_and_returns_idle() {
        let provider = Arc::new(well_formed());
        let orchestrator = mounted(&provider);

        let outcome = orchestrator.refresh("Olympic National Park").await;
        assert_eq!(outcome, RefreshOutcome::Completed);

        let state = orchestrator.dashboard().snapshot();
        assert!(!state.cycle.busy);
        assert_eq!(state.cycle.progress, 0);
        assert_eq!(state.cycle.phase, RefreshPhase::Idle);

        let report = state.report;
        assert_eq!(report.weather.unwrap().condition, "Overcast");
        assert!((report.assessment.unwrap().safety_score - 72.0).abs() < f64::EPSILON);
        assert_eq!(report.guidance.unwrap().status, GuidanceStatus::Caution);
        assert_eq!(report.terrain.unwrap().hazards, vec!["Blowdown"]);
        assert!(report.fire_alerts.is_none());
        assert!(provider.calls_matching(FIRE_ALERTS).is_empty());
    }

    #[tokio::test]
    async fn offline_weather_still_feeds_derived_group() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .on(WEATHER, Reply::Fail("network unreachable".to_string()))
                .on(HAZARD, Reply::json(&json!({ "heat": 10 }))),
        );
        let orchestrator = mounted(&provider);

        assert_eq!(
            orchestrator.refresh("Olympic National Park").await,
            RefreshOutcome::Completed
        );

        let report = orchestrator.dashboard().snapshot().report;
        let weather = report.weather.unwrap();
        assert_eq!(weather.condition, WeatherSnapshot::OFFLINE_CONDITION);
        assert!(weather.temperature_c.abs() < f64::EPSILON);
        assert!(weather.confidence.abs() < f64::EPSILON);
        assert!(report.assessment.is_some());
        assert!(report.guidance.is_some());
        assert!(report.terrain.is_some());

        let guidance_prompt = &provider.calls_matching(GUIDANCE)[0].prompt;
        assert!(guidance_prompt.contains("OFFLINE/DATA ERROR"));
    }

    #[tokio::test]
    async fn fire_mode_runs_alert_search_after_derived_group() {
        let provider = Arc::new(well_formed());
        let orchestrator = mounted(&provider);
        orchestrator.dashboard().set_theme(ThemeMode::Fire);

        orchestrator.refresh("Shasta-Trinity").await;

        let calls = provider.calls();
        let last = calls.last().unwrap();
        assert!(last.prompt.contains(FIRE_ALERTS));
        assert!(calls[0].prompt.contains(WEATHER));
        assert_eq!(calls.len(), 5);
        assert_eq!(
            orchestrator.dashboard().snapshot().report.fire_alerts.as_deref(),
            Some("No active incidents.")
        );
    }

    #[tokio::test]
    async fn fire_alert_digest_placeholders() {
        let provider = Arc::new(ScriptedProvider::new().on(FIRE_ALERTS, Reply::Empty));
        let orchestrator = mounted(&provider);
        orchestrator.dashboard().set_theme(ThemeMode::Fire);
        orchestrator.refresh("Tahoe").await;
        assert_eq!(
            orchestrator.dashboard().snapshot().report.fire_alerts.as_deref(),
            Some(NO_ALERTS)
        );

        let provider = Arc::new(
            ScriptedProvider::new().on(FIRE_ALERTS, Reply::Fail("rate limited".to_string())),
        );
        let orchestrator = mounted(&provider);
        orchestrator.dashboard().set_theme(ThemeMode::Fire);
        orchestrator.refresh("Tahoe").await;
        assert_eq!(
            orchestrator.dashboard().snapshot().report.fire_alerts.as_deref(),
            Some(SYNC_FAILED)
        );
    }

    #[tokio::test]
    async fn progress_points_in_order() {
        let provider = Arc::new(well_formed());
        let progress = Arc::new(RecordingProgress::default());
        let orchestrator = mounted(&provider).with_progress(progress.clone());

        orchestrator.refresh("Olympic National Park").await;

        let positions = progress.positions.lock().unwrap().clone();
        assert_eq!(positions, vec![10, 20, 45, 85, 100, 0]);
    }

    #[tokio::test]
    async fn fire_mode_progress_points_in_order() {
        let provider = Arc::new(well_formed());
        let progress = Arc::new(RecordingProgress::default());
        let orchestrator = mounted(&provider).with_progress(progress.clone());
        orchestrator.dashboard().set_theme(ThemeMode::Fire);

        orchestrator.refresh("Olympic National Park").await;

        assert_eq!(provider.calls_matching(FIRE_ALERTS).len(), 1);
        let positions = progress.positions.lock().unwrap().clone();
        assert_eq!(positions, vec![10, 20, 45, 85, 100, 0]);
    }

    #[tokio::test]
    async fn events_follow_phases() {
        let provider = Arc::new(well_formed());
        let (tx, mut rx) = mpsc::channel(16);
        let orchestrator = mounted(&provider).with_events(tx);
        orchestrator.dashboard().set_theme(ThemeMode::Fire);

        orchestrator.refresh("Olympic National Park").await;
        drop(orchestrator);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(
            events,
            vec![
                RefreshEvent::Started,
                RefreshEvent::WeatherReady,
                RefreshEvent::DerivedReady,
                RefreshEvent::FireAlertsReady,
                RefreshEvent::Finished(RefreshOutcome::Completed),
            ]
        );
    }

    #[tokio::test]
    async fn second_refresh_mid_cycle_is_a_no_op() {
        let gate = Arc::new(Notify::new());
        let provider = Arc::new(ScriptedProvider::new().on(
            WEATHER,
            Reply::Gated(
                Arc::clone(&gate),
                Box::new(Reply::json(&json!({ "condition": "Fog" }))),
            ),
        ));
        let orchestrator = Arc::new(mounted(&provider));

        let first = tokio::spawn({
            let orchestrator = Arc::clone(&orchestrator);
            async move { orchestrator.refresh("Olympic National Park").await }
        });

        while provider.calls().is_empty() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        assert!(orchestrator.dashboard().is_busy());

        assert_eq!(
            orchestrator.refresh("Death Valley").await,
            RefreshOutcome::SkippedBusy
        );
        assert_eq!(provider.calls().len(), 1);

        gate.notify_one();
        assert_eq!(first.await.unwrap(), RefreshOutcome::Completed);

        let state = orchestrator.dashboard().snapshot();
        let weather = state.report.weather.unwrap();
        assert_eq!(weather.location_name, "Olympic National Park");
        assert_eq!(weather.condition, "Fog");
        assert!(provider.calls_matching("Death Valley").is_empty());
        assert!(!state.cycle.busy);
    }

    #[tokio::test]
    async fn panicking_fetcher_aborts_but_returns_idle() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .on(WEATHER, Reply::json(&json!({ "condition": "Clear" })))
                .on(TERRAIN, Reply::Panic),
        );
        let orchestrator = mounted(&provider);

        assert_eq!(
            orchestrator.refresh("Joshua Tree").await,
            RefreshOutcome::Aborted
        );

        let state = orchestrator.dashboard().snapshot();
        assert!(!state.cycle.busy);
        assert_eq!(state.cycle.progress, 0);
        assert_eq!(state.cycle.phase, RefreshPhase::Idle);
        assert_eq!(state.report.weather.unwrap().condition, "Clear");
        assert!(state.report.terrain.is_none());

        assert_eq!(
            orchestrator.refresh("Joshua Tree").await,
            RefreshOutcome::Aborted
        );
    }

    #[tokio::test]
    async fn panicking_fetcher_keeps_settled_siblings() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .on(TERRAIN, Reply::Panic)
                .on(
                    WEATHER,
                    Reply::json(&json!({ "condition": "Clear", "temp": 38 })),
                )
                .on(HAZARD, Reply::json(&json!({ "heat": 88, "safetyScore": 35 })))
                .on(
                    GUIDANCE,
                    Reply::json(&json!({ "status": "MODIFY", "safetyIndex": 40 })),
                )
                .on(
                    FIRE_ALERTS,
                    Reply::Text("Road closed at park entrance.".to_string()),
                ),
        );
        let (tx, mut rx) = mpsc::channel(16);
        let orchestrator = mounted(&provider).with_events(tx);
        orchestrator.dashboard().set_theme(ThemeMode::Fire);

        assert_eq!(
            orchestrator.refresh("Joshua Tree").await,
            RefreshOutcome::Aborted
        );
        assert_eq!(provider.calls_matching(HAZARD).len(), 1);
        assert_eq!(provider.calls_matching(GUIDANCE).len(), 1);
        assert!(provider.calls_matching(FIRE_ALERTS).is_empty());

        let report = orchestrator.dashboard().snapshot().report;
        let assessment = report.assessment.unwrap();
        assert_eq!(assessment.heat.level(), Severity::Extreme);
        assert!((assessment.safety_score - 35.0).abs() < f64::EPSILON);
        let guidance = report.guidance.unwrap();
        assert_eq!(guidance.status, GuidanceStatus::Modify);
        assert!((guidance.safety_index - 40.0).abs() < f64::EPSILON);
        assert!(report.terrain.is_none());
        assert!(report.fire_alerts.is_none());

        drop(orchestrator);
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(
            events,
            vec![
                RefreshEvent::Started,
                RefreshEvent::WeatherReady,
                RefreshEvent::DerivedReady,
                RefreshEvent::Finished(RefreshOutcome::Aborted),
            ]
        );
    }

    #[tokio::test]
    async fn skipped_requests_have_no_side_effects() {
        let provider = Arc::new(well_formed());
        let progress = Arc::new(RecordingProgress::default());
        let (tx, mut rx) = mpsc::channel(16);
        let orchestrator = mounted(&provider)
            .with_progress(progress.clone())
            .with_events(tx);

        assert_eq!(
            orchestrator.refresh("   ").await,
            RefreshOutcome::SkippedEmptyLocation
        );
        orchestrator.unmount();
        assert_eq!(
            orchestrator.refresh("Zion").await,
            RefreshOutcome::SkippedUnmounted
        );

        drop(orchestrator);
        assert!(rx.recv().await.is_none());
        assert!(provider.calls().is_empty());
        assert!(progress.positions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn mount_refreshes_once_for_location_input() {
        let provider = Arc::new(well_formed());
        let dashboard = Arc::new(Dashboard::new(
            ThemeMode::Night,
            wildsafe_intel_models::UserCapability::default(),
            "Mount Rainier",
        ));
        let orchestrator = Orchestrator::new(test_support::collaborator(&provider), dashboard);

        assert_eq!(orchestrator.mount(None).await, Some(RefreshOutcome::Completed));
        assert_eq!(orchestrator.mount(None).await, None);
        assert_eq!(provider.calls_matching(WEATHER).len(), 1);
        assert!(provider.calls_matching(WEATHER)[0]
            .prompt
            .contains("Mount Rainier"));
    }

    #[tokio::test]
    async fn submit_location_updates_input() {
        let provider = Arc::new(well_formed());
        let orchestrator = mounted(&provider);

        orchestrator.submit_location("Glacier National Park").await;
        let state = orchestrator.dashboard().snapshot();
        assert_eq!(state.location_input, "Glacier National Park");
        assert_eq!(
            state.report.weather.unwrap().location_name,
            "Glacier National Park"
        );
    }
}
