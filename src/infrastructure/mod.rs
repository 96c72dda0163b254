//! Infrastructure layer - Adapter implementations
//!
//! Concrete implementations of the port interfaces: cpal capture, codec
//! adapters, filesystem output targets, and task schedulers.

pub mod capture;
pub mod encoding;
pub mod exec;
pub mod output;

// Re-export adapters
pub use capture::CpalPcmSource;
pub use encoding::{create_encoder, Mp3Encoder, WavEncoder};
pub use exec::{DeferredScheduler, WorkerPool};
pub use output::MediaDirResolver;
