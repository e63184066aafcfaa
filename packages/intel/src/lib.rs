#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Wilderness-safety intelligence pipeline.
//!
//! Gathers weather, hazard ratings, go / no-go guidance, terrain notes and
//! (in fire-mode) fire alerts for a location by delegating the domain
//! reasoning to an LLM collaborator. Model output is untrusted: every
//! fetcher normalizes it onto a fully-populated fallback record, so a
//! total collaborator outage produces clearly-flagged placeholder data
//! rather than an error.
//!
//! The [`orchestrator::Orchestrator`] sequences the fetchers into refresh
//! cycles and publishes results to a [`dashboard::Dashboard`].

pub mod dashboard;
pub mod fetchers;
pub mod geolocation;
pub mod normalize;
pub mod orchestrator;
pub mod progress;

#[cfg(test)]
mod test_support;

pub use dashboard::{Dashboard, DashboardState, IntelReport, RefreshCycle, RefreshPhase};
pub use fetchers::Collaborator;
pub use geolocation::{FixedLocation, GeolocationError, GeolocationProvider, IpGeolocation};
pub use orchestrator::{Orchestrator, RefreshEvent, RefreshOutcome};
pub use progress::{NullProgress, ProgressCallback, null_progress};
