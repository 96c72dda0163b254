//! Encoded bitstream value objects

/// One encoded frame of the output bitstream.
///
/// Ownership is transient: a frame is only valid for the duration of the
/// callback invocation that delivers it. Consumers that need the payload
/// longer must copy it.
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    pub data: Vec<u8>,
    /// Presentation timestamp in microseconds
    pub pts_us: u64,
    /// Set on the final frame of a session
    pub end_of_stream: bool,
}

/// Codec metadata emitted exactly once per session, before any data-bearing
/// frame is delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatDescriptor {
    pub mime_type: &'static str,
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}
