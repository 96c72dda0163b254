//! Same-thread scheduler with explicit pumping
//!
//! Queues jobs until `run_until_idle` is called, which gives tests a
//! deterministic execution order for lifecycle work. Auto-stop submitted
//! from inside a frame callback lands here and runs only when pumped, the
//! same decoupling the worker pool provides in production.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::application::ports::TaskScheduler;

type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
pub struct DeferredScheduler {
    queue: Mutex<VecDeque<Job>>,
}

impl DeferredScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run queued jobs, including any they enqueue, until none remain.
    pub fn run_until_idle(&self) {
        loop {
            let job = self.queue.lock().unwrap().pop_front();
            match job {
                Some(job) => job(),
                None => break,
            }
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().unwrap().len()
    }
}

impl TaskScheduler for DeferredScheduler {
    fn submit(&self, job: Job) {
        self.queue.lock().unwrap().push_back(job);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn jobs_wait_until_pumped() {
        let scheduler = DeferredScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let clone = Arc::clone(&counter);
        scheduler.submit(Box::new(move || {
            clone.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.pending(), 1);
        scheduler.run_until_idle();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn jobs_enqueued_by_jobs_also_run() {
        let scheduler = Arc::new(DeferredScheduler::new());
        let counter = Arc::new(AtomicUsize::new(0));

        let inner_counter = Arc::clone(&counter);
        let inner_scheduler = Arc::clone(&scheduler);
        scheduler.submit(Box::new(move || {
            let counter = Arc::clone(&inner_counter);
            inner_scheduler.submit(Box::new(move || {
                counter.fetch_add(10, Ordering::SeqCst);
            }));
            inner_counter.fetch_add(1, Ordering::SeqCst);
        }));

        scheduler.run_until_idle();
        assert_eq!(counter.load(Ordering::SeqCst), 11);
    }
}
