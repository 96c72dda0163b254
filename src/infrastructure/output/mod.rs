//! Output target infrastructure

mod media_dir;

pub use media_dir::MediaDirResolver;
