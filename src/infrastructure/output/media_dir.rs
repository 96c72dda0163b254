//! Filesystem output target strategy
//!
//! A pending recording lives in a named temp file inside the destination
//! directory, invisible under its temporary name. Publish persists it to
//! `rec_<epoch-millis>.<suffix>` in one rename; discard lets the temp file
//! clean itself up.

use std::fs::{self, File};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::application::ports::{OutputTargetResolver, PendingTarget, TargetError};
use crate::domain::recording::{AudioOptions, OutputArtifact};

/// Resolves output targets inside the options' output directory.
pub struct MediaDirResolver;

impl MediaDirResolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MediaDirResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputTargetResolver for MediaDirResolver {
    fn resolve(&self, options: &AudioOptions) -> Result<Box<dyn PendingTarget>, TargetError> {
        fs::create_dir_all(&options.output_dir).map_err(|e| TargetError::Create(e.to_string()))?;
        let temp = tempfile::Builder::new()
            .prefix(".soundtap-")
            .suffix(".part")
            .tempfile_in(&options.output_dir)
            .map_err(|e| TargetError::Create(e.to_string()))?;
        let final_path = options.output_dir.join(format!(
            "rec_{}.{}",
            epoch_millis(),
            options.encode_type.file_suffix()
        ));
        debug!(pending = %temp.path().display(), "output target resolved");
        Ok(Box::new(FsPendingTarget {
            temp: Some(temp),
            final_path,
        }))
    }
}

struct FsPendingTarget {
    temp: Option<NamedTempFile>,
    final_path: PathBuf,
}

impl PendingTarget for FsPendingTarget {
    fn take_writer(&mut self) -> Option<File> {
        self.temp
            .as_ref()
            .and_then(|temp| temp.as_file().try_clone().ok())
    }

    fn publish(mut self: Box<Self>) -> Result<OutputArtifact, TargetError> {
        let temp = self
            .temp
            .take()
            .ok_or_else(|| TargetError::Publish("target already consumed".into()))?;
        temp.persist(&self.final_path)
            .map_err(|e| TargetError::Publish(e.to_string()))?;
        Ok(OutputArtifact {
            uri: format!("file://{}", self.final_path.display()),
            path: self.final_path.clone(),
        })
    }

    fn discard(mut self: Box<Self>) {
        // NamedTempFile removes the backing file on drop.
        self.temp.take();
    }
}

fn epoch_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn options_in(dir: &std::path::Path) -> AudioOptions {
        AudioOptions {
            output_dir: dir.to_path_buf(),
            ..AudioOptions::default()
        }
    }

    #[test]
    fn publish_makes_the_artifact_visible() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = MediaDirResolver::new();
        let mut target = resolver.resolve(&options_in(dir.path())).unwrap();

        let mut writer = target.take_writer().unwrap();
        writer.write_all(b"encoded bytes").unwrap();

        let artifact = target.publish().unwrap();
        assert!(artifact.path.exists());
        assert!(artifact.uri.starts_with("file://"));
        assert_eq!(fs::read(&artifact.path).unwrap(), b"encoded bytes");
        assert_eq!(artifact.path.extension().unwrap(), "wav");
    }

    #[test]
    fn discard_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = MediaDirResolver::new();
        let mut target = resolver.resolve(&options_in(dir.path())).unwrap();
        let mut writer = target.take_writer().unwrap();
        writer.write_all(b"doomed").unwrap();

        target.discard();
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn pending_target_is_hidden_before_publish() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = MediaDirResolver::new();
        let _target = resolver.resolve(&options_in(dir.path())).unwrap();

        // Only the dotted .part file exists; no published artifact yet.
        for entry in fs::read_dir(dir.path()).unwrap() {
            let name = entry.unwrap().file_name();
            let name = name.to_string_lossy().into_owned();
            assert!(name.starts_with(".soundtap-") && name.ends_with(".part"));
        }
    }

    #[test]
    fn writer_can_only_be_taken_from_a_live_target() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = MediaDirResolver::new();
        let mut target = resolver.resolve(&options_in(dir.path())).unwrap();
        assert!(target.take_writer().is_some());
    }

    #[test]
    fn resolve_creates_missing_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("recordings");
        let resolver = MediaDirResolver::new();
        assert!(resolver.resolve(&options_in(&nested)).is_ok());
        assert!(nested.is_dir());
    }
}
