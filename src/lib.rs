//! Soundtap - single-track audio capture and encoding pipeline
//!
//! Continuously captures raw PCM from a source, streams it through a codec,
//! writes the encoded bitstream to a managed output target, and exposes
//! lifecycle controls (start, pause, resume, cancel, complete) while
//! reporting progress, format changes, and errors through callbacks.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: session options, frame/format/artifact value objects, errors
//! - **Application**: the recorder controller and the port interfaces it
//!   drives (PCM source, streaming encoder, output target, scheduler,
//!   client callback)
//! - **Infrastructure**: cpal capture, WAV/MP3 codec adapters, filesystem
//!   output targets, worker-pool and same-thread schedulers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use soundtap::{AudioOptions, AudioRecorder, MediaDirResolver, WorkerPool};
//!
//! struct Printer;
//! impl soundtap::RecorderCallback for Printer {
//!     fn on_progress(&self, elapsed_ms: u64) {
//!         println!("{elapsed_ms} ms");
//!     }
//! }
//!
//! let recorder = AudioRecorder::new(
//!     AudioOptions::default(),
//!     Box::new(MediaDirResolver::new()),
//!     Arc::new(WorkerPool::default()),
//!     Arc::new(Printer),
//! );
//! recorder.start();
//! ```

pub mod application;
pub mod domain;
pub mod infrastructure;

// Re-export the public surface
pub use application::ports::{
    EncodeError, EncoderContext, FrameSink, OutputTargetResolver, PcmListener, PcmSource,
    PendingTarget, RecorderCallback, SourceError, StreamingEncoder, TargetError, TaskScheduler,
};
pub use application::AudioRecorder;
pub use domain::{
    AudioOptions, ChannelLayout, EncodeType, EncodedFrame, FormatDescriptor, OutputArtifact,
    RecorderError,
};
pub use infrastructure::{
    create_encoder, CpalPcmSource, DeferredScheduler, MediaDirResolver, Mp3Encoder, WavEncoder,
    WorkerPool,
};
