//! Application layer - the recorder controller and port interfaces

pub mod ports;
pub mod recorder;

// Re-export the controller
pub use recorder::AudioRecorder;
