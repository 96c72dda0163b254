//! Recording session configuration

use std::path::PathBuf;

/// Default sample rate (16kHz, speech-optimized)
pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;

/// Default auto-stop ceiling (60 seconds)
pub const DEFAULT_MAX_DURATION_MS: u64 = 60_000;

/// Channel layout of the captured PCM stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    Mono,
    Stereo,
}

impl ChannelLayout {
    /// Interleaved channel count.
    pub const fn channels(&self) -> u16 {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }
}

/// Codec family selector.
///
/// The set of supported codecs is closed; the encoder factory keyed on this
/// enum is the single seam for adding another family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeType {
    /// PCM in a WAV container (lossless, streaming-friendly)
    Wav,
    /// MP3 via the embedded LAME encoder
    Mp3,
}

impl EncodeType {
    pub const fn mime(&self) -> &'static str {
        match self {
            EncodeType::Wav => "audio/wav",
            EncodeType::Mp3 => "audio/mpeg",
        }
    }

    pub const fn file_suffix(&self) -> &'static str {
        match self {
            EncodeType::Wav => "wav",
            EncodeType::Mp3 => "mp3",
        }
    }
}

/// Immutable configuration for one recording session, supplied at
/// construction.
#[derive(Debug, Clone)]
pub struct AudioOptions {
    /// Capture sample rate in Hz
    pub sample_rate: u32,
    pub channel_layout: ChannelLayout,
    /// Bit depth of one PCM sample. Only 16-bit is currently supported by
    /// the bundled encoders.
    pub bits_per_sample: u16,
    /// Codec family for the encoded bitstream
    pub encode_type: EncodeType,
    /// Auto-stop ceiling: the session completes itself once the encoded
    /// presentation time reaches this value.
    pub max_duration_ms: u64,
    /// Directory that receives the published artifact
    pub output_dir: PathBuf,
    /// Deliver encoded frames via callback only; no file is persisted
    pub encode_only: bool,
}

impl Default for AudioOptions {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channel_layout: ChannelLayout::Mono,
            bits_per_sample: 16,
            encode_type: EncodeType::Wav,
            max_duration_ms: DEFAULT_MAX_DURATION_MS,
            output_dir: std::env::temp_dir(),
            encode_only: false,
        }
    }
}
