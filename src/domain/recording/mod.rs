//! Recording value objects and session configuration

mod artifact;
mod frame;
mod options;

pub use artifact::OutputArtifact;
pub use frame::{EncodedFrame, FormatDescriptor};
pub use options::{
    AudioOptions, ChannelLayout, EncodeType, DEFAULT_MAX_DURATION_MS, DEFAULT_SAMPLE_RATE,
};
