//! Domain layer - Core value objects and errors
//!
//! This layer has no dependencies on external systems.

pub mod error;
pub mod recording;

// Re-export common types
pub use error::RecorderError;
pub use recording::{
    AudioOptions, ChannelLayout, EncodeType, EncodedFrame, FormatDescriptor, OutputArtifact,
};
