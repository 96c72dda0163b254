//! Streaming encoder port

use std::fs::File;

use thiserror::Error;

use crate::domain::recording::{ChannelLayout, EncodedFrame, FormatDescriptor};

/// Encoder errors
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Unsupported format parameters: {0}")]
    UnsupportedFormat(String),

    #[error("Codec fault: {0}")]
    Codec(String),

    #[error("Output write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encoder has not been prepared")]
    NotPrepared,
}

/// Everything an encoder needs to open its bitstream.
pub struct EncoderContext {
    pub sample_rate: u32,
    pub channel_layout: ChannelLayout,
    pub bits_per_sample: u16,
    /// Deliver frames via the sink only; nothing is persisted
    pub encode_only: bool,
    /// Write handle for the pending output target. `None` when encode-only.
    /// Owned by the encoder once handed over.
    pub writer: Option<File>,
}

/// Downstream consumer of encoder output.
///
/// `on_format_changed` fires exactly once per session, before any
/// data-bearing frame reaches `on_frame_encoded`.
pub trait FrameSink: Send + Sync {
    fn on_format_changed(&self, format: &FormatDescriptor);
    fn on_frame_encoded(&self, frame: &EncodedFrame);
}

/// Incremental single-track audio encoder.
///
/// Output flows through the sink argument rather than return values because
/// some codec backends produce frames asynchronously relative to the input
/// that caused them.
pub trait StreamingEncoder: Send {
    /// Open the bitstream. May be called again after a failure.
    fn prepare(&mut self, ctx: EncoderContext) -> Result<(), EncodeError>;

    /// Consume one PCM chunk, emitting zero or more frames through `sink`.
    /// The chunk must not be retained past this call.
    fn encode(&mut self, chunk: &[u8], sink: &dyn FrameSink) -> Result<(), EncodeError>;

    /// Flush and close the bitstream, emitting the end-of-stream frame.
    /// Idempotent.
    fn finish(&mut self, sink: &dyn FrameSink) -> Result<(), EncodeError>;
}
