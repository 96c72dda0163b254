//! Task scheduling infrastructure

mod deferred;
mod worker_pool;

pub use deferred::DeferredScheduler;
pub use worker_pool::{WorkerPool, DEFAULT_WORKERS};
