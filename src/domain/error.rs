//! Domain error types

use thiserror::Error;

/// Errors reported through `RecorderCallback::on_error`.
///
/// Each variant maps to a stable error code so callers can dispatch on the
/// failure class without parsing messages.
#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("Failed to start capture: {0}")]
    StartFailed(String),

    #[error("Failed to prepare encoder: {0}")]
    EncoderPrepareFailed(String),

    #[error("Failed to encode chunk: {0}")]
    EncodeFailed(String),

    #[error("Output target failed: {0}")]
    OutputTarget(String),
}

impl RecorderError {
    /// Stable error-code name for logging and client dispatch.
    pub const fn code(&self) -> &'static str {
        match self {
            RecorderError::StartFailed(_) => "ERROR_START_FAILED",
            RecorderError::EncoderPrepareFailed(_) => "ERROR_ENCODER_PREPARE_FAILED",
            RecorderError::EncodeFailed(_) => "ERROR_ENCODE_FAILED",
            RecorderError::OutputTarget(_) => "ERROR_OUTPUT_TARGET",
        }
    }
}
