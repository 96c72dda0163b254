//! Port interfaces (traits) for the recorder pipeline
//!
//! These traits define the boundaries between the recorder controller
//! and the capture, codec, output, and scheduling adapters.

pub mod callback;
pub mod encoder;
pub mod output;
pub mod scheduler;
pub mod source;

// Re-export common types
pub use callback::RecorderCallback;
pub use encoder::{EncodeError, EncoderContext, FrameSink, StreamingEncoder};
pub use output::{OutputTargetResolver, PendingTarget, TargetError};
pub use scheduler::TaskScheduler;
pub use source::{PcmListener, PcmSource, SourceError};
