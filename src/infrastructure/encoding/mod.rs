//! Encoding infrastructure
//!
//! Streaming codec adapters behind the `StreamingEncoder` port. The factory
//! keyed on `EncodeType` is the single seam for adding codec families.

mod mp3;
mod wav;

pub use mp3::Mp3Encoder;
pub use wav::WavEncoder;

use crate::application::ports::{EncodeError, StreamingEncoder};
use crate::domain::recording::EncodeType;

/// Create the encoder for the selected codec family.
pub fn create_encoder(kind: EncodeType) -> Box<dyn StreamingEncoder> {
    match kind {
        EncodeType::Wav => Box::new(WavEncoder::new()),
        EncodeType::Mp3 => Box::new(Mp3Encoder::new()),
    }
}

/// Reinterpret a PCM chunk as little-endian i16 samples.
pub(crate) fn i16_samples_from_bytes(chunk: &[u8]) -> Result<Vec<i16>, EncodeError> {
    if chunk.len() % 2 != 0 {
        return Err(EncodeError::UnsupportedFormat(
            "chunk is not aligned to 16-bit samples".into(),
        ));
    }
    Ok(chunk
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

/// Presentation timestamp in microseconds after `frames` per-channel sample
/// frames at `sample_rate`.
pub(crate) fn pts_us(frames: u64, sample_rate: u32) -> u64 {
    frames * 1_000_000 / sample_rate.max(1) as u64
}
