//! Output target port

use std::fs::File;

use thiserror::Error;

use crate::domain::recording::{AudioOptions, OutputArtifact};

/// Output target errors
#[derive(Debug, Error)]
pub enum TargetError {
    #[error("Failed to create pending target: {0}")]
    Create(String),

    #[error("Failed to publish target: {0}")]
    Publish(String),
}

/// A resolved, writable destination that is not yet visible to external
/// consumers. Exactly one of `publish` or `discard` terminates it.
pub trait PendingTarget: Send {
    /// Hand the write handle over to the encoder. Returns `None` once taken.
    fn take_writer(&mut self) -> Option<File>;

    /// Make the artifact visible and permanent.
    fn publish(self: Box<Self>) -> Result<OutputArtifact, TargetError>;

    /// Delete the underlying bytes.
    fn discard(self: Box<Self>);
}

/// Decides where the encoded bitstream lands, before recording starts.
///
/// One strategy is selected at startup; the recorder never branches on the
/// environment itself.
pub trait OutputTargetResolver: Send + Sync {
    fn resolve(&self, options: &AudioOptions) -> Result<Box<dyn PendingTarget>, TargetError>;
}
