//! Interactive dashboard menu.
//!
//! Provides a menu-driven loop over a mounted [`Orchestrator`] using
//! `dialoguer`. Every action that changes what the dashboard shows is
//! followed by a re-render.

use dialoguer::{Input, Select};
use wildsafe_intel::{Orchestrator, RefreshOutcome};
use wildsafe_intel_models::{ThemeMode, UserCapability};

use crate::print_dashboard;

/// Actions in the dashboard menu.
enum DashboardAction {
    Refresh,
    ChangeLocation,
    EditProfile,
    SwitchTheme,
    Quit,
}

impl DashboardAction {
    const ALL: &[Self] = &[
        Self::Refresh,
        Self::ChangeLocation,
        Self::EditProfile,
        Self::SwitchTheme,
        Self::Quit,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Refresh => "Recalculate",
            Self::ChangeLocation => "Change location",
            Self::EditProfile => "Edit capability profile",
            Self::SwitchTheme => "Switch theme",
            Self::Quit => "Quit",
        }
    }
}

/// Runs the menu until the user quits.
///
/// # Errors
///
/// Returns an error if a user prompt fails or the dashboard cannot be
/// rendered.
pub async fn run(
    orchestrator: &Orchestrator,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let labels: Vec<&str> = DashboardAction::ALL
        .iter()
        .map(DashboardAction::label)
        .collect();

    loop {
        let idx = Select::new()
            .with_prompt("Dashboard")
            .items(&labels)
            .default(0)
            .interact()?;

        match DashboardAction::ALL[idx] {
            DashboardAction::Refresh => {
                report_outcome(orchestrator.recalculate().await);
            }
            DashboardAction::ChangeLocation => {
                let location: String = Input::new()
                    .with_prompt("Location")
                    .default(orchestrator.dashboard().location_input())
                    .interact_text()?;
                report_outcome(orchestrator.submit_location(&location).await);
            }
            DashboardAction::EditProfile => {
                let current = orchestrator.dashboard().snapshot().user;
                match prompt_profile(&current) {
                    Ok(user) => {
                        orchestrator.dashboard().set_user(user);
                        println!("Profile saved. Recalculate to update guidance.");
                    }
                    Err(e) => println!("Profile not saved: {e}"),
                }
                continue;
            }
            DashboardAction::SwitchTheme => {
                let themes = ThemeMode::all();
                let current = orchestrator.dashboard().theme();
                let names: Vec<String> = themes.iter().map(ToString::to_string).collect();
                let idx = Select::new()
                    .with_prompt("Theme")
                    .items(&names)
                    .default(themes.iter().position(|t| *t == current).unwrap_or(0))
                    .interact()?;
                orchestrator.dashboard().set_theme(themes[idx]);
                if themes[idx].is_fire_mode() != current.is_fire_mode() {
                    println!("Fire-mode changed. Recalculate to update hazards and alerts.");
                }
            }
            DashboardAction::Quit => return Ok(()),
        }

        print_dashboard(orchestrator, json)?;
    }
}

fn report_outcome(outcome: RefreshOutcome) {
    match outcome {
        RefreshOutcome::Completed => {}
        RefreshOutcome::Aborted => println!("Refresh aborted; showing partial results."),
        RefreshOutcome::SkippedBusy => println!("A refresh is already running."),
        RefreshOutcome::SkippedEmptyLocation => println!("Enter a location first."),
        RefreshOutcome::SkippedUnmounted => println!("Dashboard is closed."),
    }
}

/// Prompts for each profile field, starting from `current`.
fn prompt_profile(
    current: &UserCapability,
) -> Result<UserCapability, Box<dyn std::error::Error>> {
    let experience: u8 = Input::new()
        .with_prompt("Experience (0-100)")
        .default(current.experience)
        .interact_text()?;
    let fitness: u8 = Input::new()
        .with_prompt("Fitness (0-100)")
        .default(current.fitness)
        .interact_text()?;
    let pack_weight_kg: f64 = Input::new()
        .with_prompt("Pack weight (kg)")
        .default(current.pack_weight_kg)
        .interact_text()?;
    let group_size: u32 = Input::new()
        .with_prompt("Group size")
        .default(current.group_size)
        .interact_text()?;
    let start_time: String = Input::new()
        .with_prompt("Start time (HH:MM)")
        .default(current.start_time.clone())
        .interact_text()?;

    let user = UserCapability {
        experience,
        fitness,
        pack_weight_kg,
        group_size,
        start_time,
    };
    user.validate()?;
    Ok(user)
}
