//! Progress reporting for refresh cycles.
//!
//! Decouples the orchestrator's coarse 0-100 progress from any rendering
//! backend (an `indicatif` bar in the CLI, silence in tests).

use std::sync::Arc;

/// Trait for reporting refresh progress.
///
/// Implementations must be `Send + Sync` so one reporter can be shared
/// between the orchestrator and whatever renders it.
pub trait ProgressCallback: Send + Sync {
    /// Set the current position on a 0-100 scale (absolute, not delta).
    fn set_position(&self, pos: u64);

    /// Update the message displayed alongside the progress indicator.
    fn set_message(&self, msg: String);

    /// Mark progress as complete and remove the progress indicator.
    fn finish_and_clear(&self);
}

/// A no-op implementation of [`ProgressCallback`].
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_position(&self, _pos: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish_and_clear(&self) {}
}

/// Returns a shared [`NullProgress`] instance for convenient use.
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
