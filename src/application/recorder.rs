//! Recorder controller
//!
//! Couples one PCM source to one streaming encoder, tracks elapsed encoded
//! time, enforces the auto-stop ceiling, and serializes lifecycle
//! transitions onto an injected scheduler. Chunk and frame delivery happen
//! on whatever thread the source and encoder use internally, so all shared
//! state lives in atomics.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::domain::error::RecorderError;
use crate::domain::recording::{AudioOptions, EncodedFrame, FormatDescriptor};
use crate::infrastructure::capture::CpalPcmSource;
use crate::infrastructure::encoding::create_encoder;

use super::ports::{
    EncodeError, EncoderContext, FrameSink, OutputTargetResolver, PcmListener, PcmSource,
    PendingTarget, RecorderCallback, StreamingEncoder, TaskScheduler,
};

// Session phases, stored in an AtomicU8 so the capture thread, the worker
// pool, and the caller agree on the lifecycle without locking.
const PHASE_IDLE: u8 = 0;
const PHASE_STARTING: u8 = 1;
const PHASE_RECORDING: u8 = 2;
const PHASE_PAUSED: u8 = 3;
const PHASE_FINISHED: u8 = 4;

/// Single-track audio recording session.
///
/// Owns exactly one PCM source and one streaming encoder for the session's
/// lifetime. `start`, `cancel`, and `complete` return immediately and report
/// outcomes through the [`RecorderCallback`]; `pause` and `resume` are cheap
/// synchronous device calls.
pub struct AudioRecorder {
    inner: Arc<SessionInner>,
}

impl AudioRecorder {
    /// Create a recorder over the default capture source (cpal) and the
    /// codec selected by `options.encode_type`.
    pub fn new(
        options: AudioOptions,
        resolver: Box<dyn OutputTargetResolver>,
        scheduler: Arc<dyn TaskScheduler>,
        callback: Arc<dyn RecorderCallback>,
    ) -> Self {
        let source = Box::new(CpalPcmSource::new(&options));
        let encoder = create_encoder(options.encode_type);
        Self::with_parts(options, source, encoder, resolver, scheduler, callback)
    }

    /// Create a recorder with a caller-supplied source and encoder.
    pub fn with_parts(
        options: AudioOptions,
        source: Box<dyn PcmSource>,
        encoder: Box<dyn StreamingEncoder>,
        resolver: Box<dyn OutputTargetResolver>,
        scheduler: Arc<dyn TaskScheduler>,
        callback: Arc<dyn RecorderCallback>,
    ) -> Self {
        let inner = Arc::new_cyclic(|weak| SessionInner {
            weak: weak.clone(),
            options,
            phase: AtomicU8::new(PHASE_IDLE),
            cancelled: AtomicBool::new(false),
            auto_stop_fired: AtomicBool::new(false),
            elapsed_ms: AtomicU64::new(0),
            source: Mutex::new(source),
            encoder: Mutex::new(encoder),
            target: Mutex::new(None),
            observer: Mutex::new(None),
            resolver,
            scheduler,
            callback,
        });
        Self { inner }
    }

    /// Register a secondary consumer of encoded output. Must be called
    /// before `start`; later registrations are ignored with a warning.
    pub fn set_encode_observer(&self, observer: Arc<dyn FrameSink>) {
        if self.inner.phase.load(Ordering::SeqCst) != PHASE_IDLE {
            warn!("encode observer must be registered before start; ignored");
            return;
        }
        *self.inner.observer.lock().unwrap() = Some(observer);
    }

    /// Whether the session is live (recording or paused).
    pub fn is_recording(&self) -> bool {
        matches!(
            self.inner.phase.load(Ordering::SeqCst),
            PHASE_RECORDING | PHASE_PAUSED
        )
    }

    /// Elapsed encoded time in milliseconds, derived from the latest frame's
    /// presentation timestamp. Monotonically non-decreasing.
    pub fn elapsed_ms(&self) -> u64 {
        self.inner.elapsed_ms.load(Ordering::SeqCst)
    }

    /// Begin the session: resolve the output target, prepare the encoder,
    /// start capture. No-op if the session was already started.
    pub fn start(&self) {
        if self
            .inner
            .phase
            .compare_exchange(
                PHASE_IDLE,
                PHASE_STARTING,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_err()
        {
            warn!("start ignored: session already started");
            return;
        }
        let inner = Arc::clone(&self.inner);
        self.inner
            .scheduler
            .submit(Box::new(move || inner.run_start()));
    }

    /// Suspend capture. Valid only while recording.
    pub fn pause(&self) {
        let swapped = self.inner.phase.compare_exchange(
            PHASE_RECORDING,
            PHASE_PAUSED,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
        if swapped.is_err() {
            info!("pause ignored: not recording");
            return;
        }
        self.inner.source.lock().unwrap().pause();
        self.inner.callback.on_pause();
    }

    /// Resume capture after `pause`.
    pub fn resume(&self) {
        let swapped = self.inner.phase.compare_exchange(
            PHASE_PAUSED,
            PHASE_RECORDING,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
        if swapped.is_err() {
            info!("resume ignored: not paused");
            return;
        }
        self.inner.source.lock().unwrap().resume();
        self.inner.callback.on_resume();
    }

    /// Abort the session and delete the output target. Valid only while
    /// recording or paused.
    pub fn cancel(&self) {
        if !self.is_recording() {
            info!("cancel ignored: not recording");
            return;
        }
        let inner = Arc::clone(&self.inner);
        self.inner
            .scheduler
            .submit(Box::new(move || inner.run_cancel()));
    }

    /// Finish the session and publish the output target. No-op if not
    /// recording.
    pub fn complete(&self) {
        if !self.is_recording() {
            debug!("complete ignored: not recording");
            return;
        }
        let inner = Arc::clone(&self.inner);
        self.inner
            .scheduler
            .submit(Box::new(move || inner.run_complete()));
    }
}

struct SessionInner {
    weak: std::sync::Weak<SessionInner>,
    options: AudioOptions,
    phase: AtomicU8,
    cancelled: AtomicBool,
    auto_stop_fired: AtomicBool,
    elapsed_ms: AtomicU64,
    source: Mutex<Box<dyn PcmSource>>,
    encoder: Mutex<Box<dyn StreamingEncoder>>,
    target: Mutex<Option<Box<dyn PendingTarget>>>,
    observer: Mutex<Option<Arc<dyn FrameSink>>>,
    resolver: Box<dyn OutputTargetResolver>,
    scheduler: Arc<dyn TaskScheduler>,
    callback: Arc<dyn RecorderCallback>,
}

impl SessionInner {
    fn run_start(self: Arc<Self>) {
        // The output target comes first so the encoder context can own its
        // write handle.
        let writer = if self.options.encode_only {
            None
        } else {
            match self.resolver.resolve(&self.options) {
                Ok(mut target) => {
                    let writer = target.take_writer();
                    *self.target.lock().unwrap() = Some(target);
                    writer
                }
                Err(e) => {
                    self.fail_start(RecorderError::OutputTarget(e.to_string()));
                    return;
                }
            }
        };

        let ctx = EncoderContext {
            sample_rate: self.options.sample_rate,
            channel_layout: self.options.channel_layout,
            bits_per_sample: self.options.bits_per_sample,
            encode_only: self.options.encode_only,
            writer,
        };

        let prepared = self.encoder.lock().unwrap().prepare(ctx);
        if let Err(e) = prepared {
            self.discard_target();
            self.fail_start(RecorderError::EncoderPrepareFailed(e.to_string()));
            return;
        }

        let listener: Arc<dyn PcmListener> = self.clone();
        let started = self.source.lock().unwrap().start(listener);
        if let Err(e) = started {
            // Release the device even on the failure path.
            self.source.lock().unwrap().stop();
            self.discard_target();
            self.fail_start(RecorderError::StartFailed(e.to_string()));
            return;
        }

        self.phase.store(PHASE_RECORDING, Ordering::SeqCst);
        debug!(
            sample_rate = self.options.sample_rate,
            channels = self.options.channel_layout.channels(),
            "recording started"
        );
    }

    fn run_cancel(self: Arc<Self>) {
        if !self.try_finish() {
            debug!("cancel lost the terminal race");
            return;
        }
        self.cancelled.store(true, Ordering::SeqCst);
        // The bitstream is being thrown away anyway.
        if let Err(e) = self.shutdown_pipeline() {
            warn!("encoder shutdown failed: {e}");
        }
        self.discard_target();
        info!("recording cancelled");
        self.callback.on_cancel();
    }

    fn run_complete(self: Arc<Self>) {
        if !self.try_finish() {
            debug!("complete lost the terminal race");
            return;
        }
        // A failed flush means the container was never closed; publishing
        // would hand the caller a corrupt artifact.
        if let Err(e) = self.shutdown_pipeline() {
            let err = RecorderError::EncodeFailed(e.to_string());
            warn!(code = err.code(), "finish failed: {err}");
            self.discard_target();
            self.callback.on_error(&err);
            return;
        }
        let target = self.target.lock().unwrap().take();
        match target {
            Some(target) => match target.publish() {
                Ok(artifact) => {
                    info!(path = %artifact.path.display(), "recording published");
                    self.callback.on_complete(Some(&artifact));
                }
                Err(e) => {
                    let err = RecorderError::OutputTarget(e.to_string());
                    warn!(code = err.code(), "publish failed: {err}");
                    self.callback.on_error(&err);
                }
            },
            // Encode-only sessions have nothing to publish.
            None => self.callback.on_complete(None),
        }
    }

    /// Decide the terminal transition. Cancel and complete race here; the
    /// single atomic swap guarantees exactly one winner.
    fn try_finish(&self) -> bool {
        let prev = self.phase.swap(PHASE_FINISHED, Ordering::SeqCst);
        matches!(prev, PHASE_RECORDING | PHASE_PAUSED)
    }

    /// Stop capture, then flush and close the encoder. Safe to call from any
    /// teardown path; the source guarantees idempotent device release.
    fn shutdown_pipeline(&self) -> Result<(), EncodeError> {
        self.source.lock().unwrap().stop();
        let mut encoder = self.encoder.lock().unwrap();
        encoder.finish(self)
    }

    fn discard_target(&self) {
        if let Some(target) = self.target.lock().unwrap().take() {
            target.discard();
        }
    }

    fn fail_start(&self, err: RecorderError) {
        warn!(code = err.code(), "session failed to start: {err}");
        self.callback.on_error(&err);
        // Back to Idle: a later start attempt is accepted.
        self.phase.store(PHASE_IDLE, Ordering::SeqCst);
    }

    fn observer(&self) -> Option<Arc<dyn FrameSink>> {
        self.observer.lock().unwrap().clone()
    }
}

impl PcmListener for SessionInner {
    fn on_pcm_chunk(&self, chunk: &[u8]) {
        // The encoder is closed once the session finishes; any capture
        // buffers still in flight are dropped.
        if self.phase.load(Ordering::SeqCst) == PHASE_FINISHED {
            return;
        }
        let result = self.encoder.lock().unwrap().encode(chunk, self);
        if let Err(e) = result {
            let err = RecorderError::EncodeFailed(e.to_string());
            warn!(code = err.code(), "chunk dropped: {err}");
            // A single bad chunk does not end the session.
            self.callback.on_error(&err);
        }
    }
}

impl FrameSink for SessionInner {
    fn on_format_changed(&self, format: &FormatDescriptor) {
        if let Some(observer) = self.observer() {
            observer.on_format_changed(format);
        }
    }

    fn on_frame_encoded(&self, frame: &EncodedFrame) {
        // Progress is encoded presentation time, not wall clock, so it stays
        // consistent with the bitstream under encoder lag.
        self.elapsed_ms
            .fetch_max(frame.pts_us / 1000, Ordering::SeqCst);
        let elapsed = self.elapsed_ms.load(Ordering::SeqCst);

        let live = matches!(
            self.phase.load(Ordering::SeqCst),
            PHASE_RECORDING | PHASE_PAUSED
        );
        if live {
            self.callback.on_progress(elapsed);
        }

        if !self.cancelled.load(Ordering::SeqCst) {
            if let Some(observer) = self.observer() {
                observer.on_frame_encoded(frame);
            }
        }

        // Auto-stop once the ceiling is reached. The terminal work runs on
        // the scheduler, never inline from this callback, so it cannot
        // re-enter the encoder.
        if live
            && elapsed >= self.options.max_duration_ms
            && !self.auto_stop_fired.swap(true, Ordering::SeqCst)
        {
            debug!(elapsed, "duration ceiling reached, auto-completing");
            if let Some(inner) = self.weak.upgrade() {
                self.scheduler
                    .submit(Box::new(move || inner.run_complete()));
            }
        }
    }
}
