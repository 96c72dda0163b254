//! Published recording artifact

use std::path::PathBuf;

/// Final handle to a published recording.
///
/// Only valid once `on_complete` has fired; before that the underlying file
/// is a pending target invisible to external consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    /// Platform-addressable URI (`file://...`)
    pub uri: String,
    /// Local filesystem path
    pub path: PathBuf,
}
