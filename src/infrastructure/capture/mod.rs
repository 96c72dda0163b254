//! Capture infrastructure
//!
//! Reference `PcmSource` implementation over cpal.

mod cpal_source;

pub use cpal_source::CpalPcmSource;
