//! Client callback port

use crate::domain::error::RecorderError;
use crate::domain::recording::OutputArtifact;

/// Client-facing session notifications.
///
/// All methods default to no-ops so callers implement only what they need.
/// Invoked from background threads; implementations must be thread-safe and
/// cheap. A session ends with exactly one terminal notification:
/// `on_complete`, `on_cancel`, or a halting `on_error`.
pub trait RecorderCallback: Send + Sync {
    /// Encoded presentation time advanced
    fn on_progress(&self, _elapsed_ms: u64) {}

    fn on_pause(&self) {}

    fn on_resume(&self) {}

    /// Session cancelled; the output target has been deleted
    fn on_cancel(&self) {}

    /// Session completed. `artifact` is `None` in encode-only mode.
    fn on_complete(&self, _artifact: Option<&OutputArtifact>) {}

    fn on_error(&self, _error: &RecorderError) {}
}
