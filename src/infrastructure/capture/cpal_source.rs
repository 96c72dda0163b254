//! Cross-platform PCM capture source using cpal
//!
//! The cpal stream is not `Send`, so it is built and owned by a dedicated
//! capture thread. Lifecycle methods talk to that thread through atomics; a
//! startup handshake over an mpsc channel surfaces device and configuration
//! failures to the caller of `start`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig};
use tracing::{debug, error, warn};

use crate::application::ports::{PcmListener, PcmSource, SourceError};
use crate::domain::recording::AudioOptions;

/// PCM source over the default cpal input device.
pub struct CpalPcmSource {
    sample_rate: u32,
    channels: u16,
    running: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl CpalPcmSource {
    pub fn new(options: &AudioOptions) -> Self {
        Self {
            sample_rate: options.sample_rate,
            channels: options.channel_layout.channels(),
            running: Arc::new(AtomicBool::new(false)),
            paused: Arc::new(AtomicBool::new(false)),
            thread: None,
        }
    }
}

impl PcmSource for CpalPcmSource {
    fn start(&mut self, listener: Arc<dyn PcmListener>) -> Result<(), SourceError> {
        if self.thread.is_some() {
            return Err(SourceError::AlreadyStarted);
        }
        self.running.store(true, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);

        let running = Arc::clone(&self.running);
        let paused = Arc::clone(&self.paused);
        let sample_rate = self.sample_rate;
        let channels = self.channels;
        let (ready_tx, ready_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("soundtap-capture".into())
            .spawn(move || {
                capture_loop(sample_rate, channels, running, paused, listener, ready_tx);
            })
            .map_err(|e| SourceError::StreamFailed(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                self.thread = Some(handle);
                Ok(())
            }
            Ok(Err(e)) => {
                self.running.store(false, Ordering::SeqCst);
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                self.running.store(false, Ordering::SeqCst);
                let _ = handle.join();
                Err(SourceError::StreamFailed(
                    "capture thread exited during startup".into(),
                ))
            }
        }
    }

    fn pause(&mut self) {
        self.paused.store(true, Ordering::SeqCst);
        debug!("capture paused");
    }

    fn resume(&mut self) {
        self.paused.store(false, Ordering::SeqCst);
        debug!("capture resumed");
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                warn!("capture thread panicked during shutdown");
            }
        }
    }
}

impl Drop for CpalPcmSource {
    fn drop(&mut self) {
        // The device hold must never outlive the source.
        self.stop();
    }
}

/// Owns the cpal stream for the life of the capture.
fn capture_loop(
    sample_rate: u32,
    channels: u16,
    running: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    listener: Arc<dyn PcmListener>,
    ready_tx: mpsc::Sender<Result<(), SourceError>>,
) {
    let stream = match build_stream(sample_rate, channels, &running, &paused, listener) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(SourceError::StreamFailed(e.to_string())));
        return;
    }
    let _ = ready_tx.send(Ok(()));

    while running.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(50));
    }
    drop(stream);
}

/// Forwards device callbacks to the listener as little-endian i16 bytes,
/// downmixing to the requested channel count.
#[derive(Clone)]
struct ChunkForwarder {
    running: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    listener: Arc<dyn PcmListener>,
    device_channels: u16,
    want_channels: u16,
}

impl ChunkForwarder {
    fn forward(&self, data: &[i16]) {
        if !self.running.load(Ordering::SeqCst) || self.paused.load(Ordering::SeqCst) {
            return;
        }
        if self.device_channels == self.want_channels {
            self.listener.on_pcm_chunk(&i16_to_le_bytes(data));
        } else {
            let mono = downmix_to_mono(data, self.device_channels);
            self.listener.on_pcm_chunk(&i16_to_le_bytes(&mono));
        }
    }
}

fn build_stream(
    sample_rate: u32,
    want_channels: u16,
    running: &Arc<AtomicBool>,
    paused: &Arc<AtomicBool>,
    listener: Arc<dyn PcmListener>,
) -> Result<cpal::Stream, SourceError> {
    let host = cpal::default_host();
    let device = host.default_input_device().ok_or(SourceError::NoDevice)?;

    let (config, sample_format) = pick_config(&device, sample_rate, want_channels)?;
    let forwarder = ChunkForwarder {
        running: Arc::clone(running),
        paused: Arc::clone(paused),
        listener,
        device_channels: config.channels,
        want_channels,
    };
    let err_fn = |err| error!("capture stream error: {err}");

    let stream = match sample_format {
        SampleFormat::I16 => device
            .build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| forwarder.forward(data),
                err_fn,
                None,
            )
            .map_err(|e| SourceError::StreamFailed(e.to_string()))?,

        SampleFormat::F32 => device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    forwarder.forward(&f32_to_i16(data));
                },
                err_fn,
                None,
            )
            .map_err(|e| SourceError::StreamFailed(e.to_string()))?,

        other => {
            return Err(SourceError::UnsupportedConfig(format!(
                "sample format {other:?}"
            )))
        }
    };

    Ok(stream)
}

/// Pick an input configuration for the requested rate and channel count.
/// Prefers an exact channel match, then the fewest device channels.
fn pick_config(
    device: &cpal::Device,
    sample_rate: u32,
    want_channels: u16,
) -> Result<(StreamConfig, SampleFormat), SourceError> {
    let ranges = device
        .supported_input_configs()
        .map_err(|e| SourceError::StreamFailed(format!("failed to query configs: {e}")))?;

    let mut best: Option<cpal::SupportedStreamConfigRange> = None;
    for range in ranges {
        if range.sample_format() != SampleFormat::I16 && range.sample_format() != SampleFormat::F32
        {
            continue;
        }
        if range.min_sample_rate().0 > sample_rate || range.max_sample_rate().0 < sample_rate {
            continue;
        }
        // Downmix only goes toward mono; stereo targets need a stereo device.
        let usable =
            range.channels() == want_channels || (want_channels == 1 && range.channels() > 1);
        if !usable {
            continue;
        }
        let better = match &best {
            None => true,
            Some(current) => {
                let exact = range.channels() == want_channels;
                let current_exact = current.channels() == want_channels;
                (exact && !current_exact)
                    || (exact == current_exact && range.channels() < current.channels())
            }
        };
        if better {
            best = Some(range);
        }
    }

    let range = best.ok_or_else(|| {
        SourceError::UnsupportedConfig(format!(
            "{sample_rate} Hz / {want_channels} channel capture"
        ))
    })?;

    let sample_format = range.sample_format();
    let config = StreamConfig {
        channels: range.channels(),
        sample_rate: SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };
    Ok((config, sample_format))
}

/// Mix interleaved multi-channel samples down to mono by averaging.
fn downmix_to_mono(samples: &[i16], channels: u16) -> Vec<i16> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks(channels as usize)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / channels as i32) as i16
        })
        .collect()
}

fn f32_to_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16)
        .collect()
}

fn i16_to_le_bytes(samples: &[i16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}
