#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared CLI utilities for the wildsafe toolchain.
//!
//! Provides an `indicatif`-backed refresh bar behind the
//! [`ProgressCallback`] trait, plus [`init_logger`] which sets up
//! `indicatif-log-bridge` so that `log::info!` and friends are suspended
//! while progress bars redraw.

use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use wildsafe_intel::ProgressCallback;

pub use indicatif::MultiProgress;

/// An `indicatif` [`ProgressBar`] that implements [`ProgressCallback`].
///
/// The bar is created hidden and only appears once a cycle reports its
/// first position, so an idle dashboard leaves the terminal alone.
pub struct IndicatifProgress {
    multi: MultiProgress,
    style: ProgressStyle,
    bar: std::sync::Mutex<Option<ProgressBar>>,
}

impl IndicatifProgress {
    /// Creates a 0-100 bar for refresh cycles.
    #[must_use]
    pub fn refresh_bar(multi: &MultiProgress) -> Arc<dyn ProgressCallback> {
        let style = ProgressStyle::with_template(
            "{spinner:.green} {msg} {wide_bar:.green/dim} {percent:>3}%",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");

        Arc::new(Self {
            multi: multi.clone(),
            style,
            bar: std::sync::Mutex::new(None),
        })
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        let mut slot = self
            .bar
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let bar = slot.get_or_insert_with(|| {
            let bar = self.multi.add(ProgressBar::new(100));
            bar.set_style(self.style.clone());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        });
        f(bar);
    }
}

impl ProgressCallback for IndicatifProgress {
    fn set_position(&self, pos: u64) {
        self.with_bar(|bar| bar.set_position(pos));
    }

    fn set_message(&self, msg: String) {
        self.with_bar(|bar| bar.set_message(msg));
    }

    fn finish_and_clear(&self) {
        let taken = self
            .bar
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        if let Some(bar) = taken {
            bar.finish_and_clear();
            self.multi.remove(&bar);
        }
    }
}

/// Initializes the global logger wrapped in `indicatif-log-bridge` so that
/// `log::info!` and friends are suspended while progress bars redraw.
///
/// Returns the [`MultiProgress`] that all progress bars must be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok(); // Ignore error if logger was already set (e.g., in tests)

    log::set_max_level(level);

    multi
}

#[cfg(test)]
mod tests {
    use indicatif::ProgressDrawTarget;

    use super::*;

    #[test]
    fn bar_is_recreated_for_each_cycle() {
        let multi = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());
        let progress = IndicatifProgress::refresh_bar(&multi);

        progress.set_position(10);
        progress.set_message("Fetching Weather".to_string());
        progress.finish_and_clear();
        progress.finish_and_clear();

        progress.set_position(45);
        progress.finish_and_clear();
    }
}
