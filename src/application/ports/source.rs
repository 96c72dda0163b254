//! PCM capture source port

use std::sync::Arc;
use thiserror::Error;

/// Capture source errors
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    #[error("No capture device available")]
    NoDevice,

    #[error("Capture device does not support {0}")]
    UnsupportedConfig(String),

    #[error("Capture stream failed: {0}")]
    StreamFailed(String),

    #[error("Capture source is already started")]
    AlreadyStarted,
}

/// Receives raw PCM chunks pushed from a capture source.
///
/// Called on the source's capture thread. The chunk is only valid for the
/// duration of the call; sources reuse capture buffers.
pub trait PcmListener: Send + Sync {
    fn on_pcm_chunk(&self, chunk: &[u8]);
}

/// Continuous PCM capture source.
///
/// `start` acquires an exclusive hold on the underlying capture device;
/// failing to call `stop` leaks it.
pub trait PcmSource: Send {
    /// Acquire the capture device and begin pushing chunks to `listener`.
    /// Only valid when not already started.
    fn start(&mut self, listener: Arc<dyn PcmListener>) -> Result<(), SourceError>;

    /// Suspend chunk delivery. Only meaningful while started.
    fn pause(&mut self);

    /// Resume chunk delivery after `pause`.
    fn resume(&mut self);

    /// Release the capture device. Idempotent and always safe to call,
    /// including from an error state.
    fn stop(&mut self);
}
