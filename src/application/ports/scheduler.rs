//! Task scheduling port

/// Background execution context for lifecycle work.
///
/// All state transitions (`start`, `cancel`, `complete`) are submitted here
/// so device acquisition and file I/O stay off the caller's thread. An
/// explicit, injected scheduler also lets tests run the pipeline
/// deterministically on a single thread.
pub trait TaskScheduler: Send + Sync {
    fn submit(&self, job: Box<dyn FnOnce() + Send + 'static>);
}
