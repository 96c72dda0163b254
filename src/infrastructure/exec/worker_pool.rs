//! Fixed-size worker pool for lifecycle tasks
//!
//! One pool is shared by every recorder in the process; lifecycle jobs are
//! short (device calls, a rename, a codec flush), so a handful of threads
//! is plenty. Dropping the pool closes the feed channel and joins the
//! workers, giving shutdown a defined point instead of a process-global
//! singleton.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Sender};
use tracing::warn;

use crate::application::ports::TaskScheduler;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Default number of worker threads.
pub const DEFAULT_WORKERS: usize = 2;

pub struct WorkerPool {
    tx: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Self {
        let (tx, rx) = unbounded::<Job>();
        let workers = (0..workers.max(1))
            .map(|index| {
                let rx = rx.clone();
                thread::Builder::new()
                    .name(format!("soundtap-worker-{index}"))
                    .spawn(move || {
                        while let Ok(job) = rx.recv() {
                            job();
                        }
                    })
                    .expect("failed to spawn worker thread")
            })
            .collect();
        Self {
            tx: Some(tx),
            workers,
        }
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

impl TaskScheduler for WorkerPool {
    fn submit(&self, job: Job) {
        match &self.tx {
            Some(tx) => {
                if tx.send(job).is_err() {
                    warn!("worker pool is shut down; job dropped");
                }
            }
            None => warn!("worker pool is shut down; job dropped"),
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Closing the channel lets each worker drain and exit.
        self.tx.take();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}
