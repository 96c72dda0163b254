//! Streaming WAV encoder over hound
//!
//! WAV carries PCM unchanged, so every chunk becomes one frame whose
//! payload is the chunk itself and whose timestamp derives from the
//! cumulative sample count. The container header is finalized on `finish`.

use std::io::BufWriter;

use crate::application::ports::{EncodeError, EncoderContext, FrameSink, StreamingEncoder};
use crate::domain::recording::{EncodedFrame, FormatDescriptor};

use super::{i16_samples_from_bytes, pts_us};

pub struct WavEncoder {
    state: Option<WavState>,
}

struct WavState {
    writer: Option<hound::WavWriter<BufWriter<std::fs::File>>>,
    format: FormatDescriptor,
    format_sent: bool,
    finished: bool,
    /// Per-channel sample frames consumed so far
    frames_consumed: u64,
    sample_rate: u32,
    channels: u16,
}

impl WavEncoder {
    pub fn new() -> Self {
        Self { state: None }
    }
}

impl Default for WavEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl WavState {
    fn ensure_format_sent(&mut self, sink: &dyn FrameSink) {
        if !self.format_sent {
            sink.on_format_changed(&self.format);
            self.format_sent = true;
        }
    }
}

impl StreamingEncoder for WavEncoder {
    fn prepare(&mut self, ctx: EncoderContext) -> Result<(), EncodeError> {
        if ctx.bits_per_sample != 16 {
            return Err(EncodeError::UnsupportedFormat(format!(
                "{}-bit samples (only 16-bit supported)",
                ctx.bits_per_sample
            )));
        }
        let channels = ctx.channel_layout.channels();
        let spec = hound::WavSpec {
            channels,
            sample_rate: ctx.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let writer = match ctx.writer {
            Some(file) => Some(
                hound::WavWriter::new(BufWriter::new(file), spec)
                    .map_err(|e| EncodeError::Codec(e.to_string()))?,
            ),
            None => None,
        };
        self.state = Some(WavState {
            writer,
            format: FormatDescriptor {
                mime_type: "audio/wav",
                sample_rate: ctx.sample_rate,
                channels,
                bits_per_sample: 16,
            },
            format_sent: false,
            finished: false,
            frames_consumed: 0,
            sample_rate: ctx.sample_rate,
            channels,
        });
        Ok(())
    }

    fn encode(&mut self, chunk: &[u8], sink: &dyn FrameSink) -> Result<(), EncodeError> {
        let state = self.state.as_mut().ok_or(EncodeError::NotPrepared)?;
        if state.finished {
            return Err(EncodeError::Codec("encoder already finished".into()));
        }
        let samples = i16_samples_from_bytes(chunk)?;
        state.ensure_format_sent(sink);

        if let Some(writer) = state.writer.as_mut() {
            for &sample in &samples {
                writer
                    .write_sample(sample)
                    .map_err(|e| EncodeError::Codec(e.to_string()))?;
            }
        }

        state.frames_consumed += (samples.len() / state.channels as usize) as u64;
        let frame = EncodedFrame {
            data: chunk.to_vec(),
            pts_us: pts_us(state.frames_consumed, state.sample_rate),
            end_of_stream: false,
        };
        sink.on_frame_encoded(&frame);
        Ok(())
    }

    fn finish(&mut self, sink: &dyn FrameSink) -> Result<(), EncodeError> {
        let state = match self.state.as_mut() {
            Some(state) if !state.finished => state,
            _ => return Ok(()),
        };
        state.finished = true;
        state.ensure_format_sent(sink);

        if let Some(writer) = state.writer.take() {
            writer
                .finalize()
                .map_err(|e| EncodeError::Codec(e.to_string()))?;
        }

        let frame = EncodedFrame {
            data: Vec::new(),
            pts_us: pts_us(state.frames_consumed, state.sample_rate),
            end_of_stream: true,
        };
        sink.on_frame_encoded(&frame);
        Ok(())
    }
}
