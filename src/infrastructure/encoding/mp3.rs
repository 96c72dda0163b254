//! Streaming MP3 encoder over the embedded LAME library
//!
//! LAME is a true streaming codec: it drains encoded bytes as input
//! accumulates and flushes the remainder at end of stream. The raw codec
//! handle is confined to a dedicated worker thread; `encode` and `finish`
//! exchange blocks with it over channels, which keeps the adapter `Send`
//! without touching the handle from multiple threads.

use std::fs::File;
use std::io::Write;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};
use mp3lame_encoder::{Builder, FlushNoGap, InterleavedPcm, MonoPcm};
use tracing::debug;

use crate::application::ports::{EncodeError, EncoderContext, FrameSink, StreamingEncoder};
use crate::domain::recording::{EncodedFrame, FormatDescriptor};

use super::{i16_samples_from_bytes, pts_us};

/// LAME's documented worst-case flush size in bytes.
const FLUSH_BUFFER_SIZE: usize = 7200;

enum Mp3Request {
    Encode(Vec<i16>),
    Finish,
}

type Mp3Response = Result<Vec<u8>, String>;

pub struct Mp3Encoder {
    state: Option<Mp3State>,
}

struct Mp3State {
    req_tx: Sender<Mp3Request>,
    resp_rx: Receiver<Mp3Response>,
    worker: Option<JoinHandle<()>>,
    writer: Option<File>,
    format: FormatDescriptor,
    format_sent: bool,
    finished: bool,
    /// Per-channel sample frames consumed so far
    frames_consumed: u64,
    sample_rate: u32,
    channels: u16,
}

impl Mp3Encoder {
    pub fn new() -> Self {
        Self { state: None }
    }
}

impl Default for Mp3Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Mp3State {
    fn ensure_format_sent(&mut self, sink: &dyn FrameSink) {
        if !self.format_sent {
            sink.on_format_changed(&self.format);
            self.format_sent = true;
        }
    }

    fn roundtrip(&self, request: Mp3Request) -> Result<Vec<u8>, EncodeError> {
        self.req_tx
            .send(request)
            .map_err(|_| EncodeError::Codec("codec thread exited".into()))?;
        match self.resp_rx.recv() {
            Ok(Ok(bytes)) => Ok(bytes),
            Ok(Err(e)) => Err(EncodeError::Codec(e)),
            Err(_) => Err(EncodeError::Codec("codec thread exited".into())),
        }
    }
}

impl StreamingEncoder for Mp3Encoder {
    fn prepare(&mut self, ctx: EncoderContext) -> Result<(), EncodeError> {
        if ctx.bits_per_sample != 16 {
            return Err(EncodeError::UnsupportedFormat(format!(
                "{}-bit samples (only 16-bit supported)",
                ctx.bits_per_sample
            )));
        }
        let channels = ctx.channel_layout.channels();
        let sample_rate = ctx.sample_rate;

        let (req_tx, req_rx) = unbounded();
        let (resp_tx, resp_rx) = unbounded();
        let worker = thread::Builder::new()
            .name("soundtap-mp3".into())
            .spawn(move || codec_worker(sample_rate, channels, req_rx, resp_tx))
            .map_err(|e| EncodeError::Codec(e.to_string()))?;

        // The worker acks once LAME is configured; a rejected sample rate or
        // channel count surfaces here.
        match resp_rx.recv() {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                let _ = worker.join();
                return Err(EncodeError::UnsupportedFormat(e));
            }
            Err(_) => {
                let _ = worker.join();
                return Err(EncodeError::Codec("codec thread exited during setup".into()));
            }
        }

        self.state = Some(Mp3State {
            req_tx,
            resp_rx,
            worker: Some(worker),
            writer: ctx.writer,
            format: FormatDescriptor {
                mime_type: "audio/mpeg",
                sample_rate,
                channels,
                bits_per_sample: 16,
            },
            format_sent: false,
            finished: false,
            frames_consumed: 0,
            sample_rate,
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

        let bytes = state.roundtrip(Mp3Request::Encode(samples.clone()))?;
        state.frames_consumed += (samples.len() / state.channels as usize) as u64;

        // LAME buffers roughly one MPEG frame of input before it drains.
        if !bytes.is_empty() {
            if let Some(writer) = state.writer.as_mut() {
                writer.write_all(&bytes)?;
            }
            let frame = EncodedFrame {
                data: bytes,
                pts_us: pts_us(state.frames_consumed, state.sample_rate),
                end_of_stream: false,
            };
            sink.on_frame_encoded(&frame);
        }
        Ok(())
    }

    fn finish(&mut self, sink: &dyn FrameSink) -> Result<(), EncodeError> {
        let state = match self.state.as_mut() {
            Some(state) if !state.finished => state,
            _ => return Ok(()),
        };
        state.finished = true;
        state.ensure_format_sent(sink);

        let bytes = state.roundtrip(Mp3Request::Finish)?;
        if let Some(worker) = state.worker.take() {
            let _ = worker.join();
        }
        debug!(flushed = bytes.len(), "mp3 stream closed");

        if let Some(mut writer) = state.writer.take() {
            writer.write_all(&bytes)?;
            writer.flush()?;
        }
        let frame = EncodedFrame {
            data: bytes,
            pts_us: pts_us(state.frames_consumed, state.sample_rate),
            end_of_stream: true,
        };
        sink.on_frame_encoded(&frame);
        Ok(())
    }
}

impl Drop for Mp3Encoder {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            drop(state.req_tx);
            if let Some(worker) = state.worker {
                let _ = worker.join();
            }
        }
    }
}

/// Owns the LAME handle for the life of the session.
fn codec_worker(
    sample_rate: u32,
    channels: u16,
    req_rx: Receiver<Mp3Request>,
    resp_tx: Sender<Mp3Response>,
) {
    let mut encoder = match build_lame(sample_rate, channels) {
        Ok(encoder) => encoder,
        Err(e) => {
            let _ = resp_tx.send(Err(e));
            return;
        }
    };
    // Ready ack
    let _ = resp_tx.send(Ok(Vec::new()));

    while let Ok(request) = req_rx.recv() {
        match request {
            Mp3Request::Encode(samples) => {
                let _ = resp_tx.send(encode_block(&mut encoder, &samples, channels));
            }
            Mp3Request::Finish => {
                let _ = resp_tx.send(flush_block(&mut encoder));
                break;
            }
        }
    }
}

fn build_lame(sample_rate: u32, channels: u16) -> Result<mp3lame_encoder::Encoder, String> {
    let mut builder = Builder::new().ok_or_else(|| "failed to allocate LAME".to_string())?;
    builder
        .set_num_channels(channels as u8)
        .map_err(|e| format!("channels rejected: {e:?}"))?;
    builder
        .set_sample_rate(sample_rate)
        .map_err(|e| format!("sample rate rejected: {e:?}"))?;
    builder
        .set_brate(mp3lame_encoder::Bitrate::Kbps128)
        .map_err(|e| format!("bitrate rejected: {e:?}"))?;
    builder
        .set_quality(mp3lame_encoder::Quality::Good)
        .map_err(|e| format!("quality rejected: {e:?}"))?;
    builder.build().map_err(|e| format!("LAME init failed: {e:?}"))
}

fn encode_block(
    encoder: &mut mp3lame_encoder::Encoder,
    samples: &[i16],
    channels: u16,
) -> Result<Vec<u8>, String> {
    let mut out: Vec<u8> = Vec::new();
    out.reserve(mp3lame_encoder::max_required_buffer_size(samples.len()));
    let written = if channels == 1 {
        encoder.encode(MonoPcm(samples), out.spare_capacity_mut())
    } else {
        encoder.encode(InterleavedPcm(samples), out.spare_capacity_mut())
    }
    .map_err(|e| format!("encode failed: {e:?}"))?;
    // SAFETY: `encode` reports how many bytes of the spare capacity it
    // initialized on success.
    unsafe {
        out.set_len(written);
    }
    Ok(out)
}

fn flush_block(encoder: &mut mp3lame_encoder::Encoder) -> Result<Vec<u8>, String> {
    let mut out: Vec<u8> = Vec::new();
    out.reserve(FLUSH_BUFFER_SIZE);
    let written = encoder
        .flush::<FlushNoGap>(out.spare_capacity_mut())
        .map_err(|e| format!("flush failed: {e:?}"))?;
    // SAFETY: `flush` reports how many bytes of the spare capacity it
    // initialized on success.
    unsafe {
        out.set_len(written);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use crate::domain::recording::ChannelLayout;

    use super::*;

    #[derive(Default)]
    struct Collector {
        formats: Mutex<Vec<FormatDescriptor>>,
        frames: Mutex<Vec<EncodedFrame>>,
    }

    impl FrameSink for Collector {
        fn on_format_changed(&self, format: &FormatDescriptor) {
            self.formats.lock().unwrap().push(format.clone());
        }

        fn on_frame_encoded(&self, frame: &EncodedFrame) {
            self.frames.lock().unwrap().push(frame.clone());
        }
    }

    fn sine_chunk(samples: usize) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(samples * 2);
        for i in 0..samples {
            let t = i as f32 / 16_000.0;
            let value = (f32::sin(2.0 * std::f32::consts::PI * 440.0 * t) * 16000.0) as i16;
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn streams_mp3_frames_and_flushes() {
        let mut encoder = Mp3Encoder::new();
        encoder
            .prepare(EncoderContext {
                sample_rate: 16_000,
                channel_layout: ChannelLayout::Mono,
                bits_per_sample: 16,
                encode_only: true,
                writer: None,
            })
            .unwrap();

        let sink = Collector::default();
        // Half a second of input comfortably exceeds LAME's internal buffer.
        for _ in 0..5 {
            encoder.encode(&sine_chunk(1600), &sink).unwrap();
        }
        encoder.finish(&sink).unwrap();

        let formats = sink.formats.lock().unwrap();
        assert_eq!(formats.len(), 1);
        assert_eq!(formats[0].mime_type, "audio/mpeg");

        let frames = sink.frames.lock().unwrap();
        assert!(frames.last().unwrap().end_of_stream);
        let total: usize = frames.iter().map(|f| f.data.len()).sum();
        assert!(total > 0);
    }

    #[test]
    fn rejects_unsupported_bit_depth() {
        let mut encoder = Mp3Encoder::new();
        let result = encoder.prepare(EncoderContext {
            sample_rate: 16_000,
            channel_layout: ChannelLayout::Mono,
            bits_per_sample: 24,
            encode_only: true,
            writer: None,
        });
        assert!(matches!(result, Err(EncodeError::UnsupportedFormat(_))));
    }
}
