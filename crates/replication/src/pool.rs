//! Bounded worker pool.
//!
//! A FIFO task queue behind a mutex and a single condition variable, served
//! by a fixed set of OS threads. Submission is non-blocking; shutdown is
//! idempotent, wakes every worker, and lets them drain the remaining queue
//! before exiting. A panicking task is contained to the task, not the
//! worker.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::error;

type Task = Box<dyn FnOnce() + Send + 'static>;

struct PoolState {
    tasks: VecDeque<Task>,
    stop: bool,
}

struct Shared {
    state: Mutex<PoolState>,
    available: Condvar,
}

/// Fixed-size pool of worker threads over a shared FIFO queue.
pub struct WorkerPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn a pool of `size` workers (at least one).
    pub fn new(size: usize) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(PoolState {
                tasks: VecDeque::new(),
                stop: false,
            }),
            available: Condvar::new(),
        });

        let workers = (0..size.max(1))
            .map(|i| {
                let shared = Arc::clone(&shared);
                std::thread::Builder::new()
                    .name(format!("worker-{}", i))
                    .spawn(move || worker_loop(shared))
                    .expect("failed to spawn worker thread")
            })
            .collect();

        Self { shared, workers }
    }

    /// Queue a task. Never blocks; tasks submitted after shutdown are
    /// dropped.
    pub fn submit(&self, task: impl FnOnce() + Send + 'static) {
        let mut state = self.shared.state.lock();
        if state.stop {
            return;
        }
        state.tasks.push_back(Box::new(task));
        self.shared.available.notify_one();
    }

    /// Request stop and join the workers once the queue is drained.
    /// Idempotent.
    pub fn shutdown(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.stop = true;
        }
        self.shared.available.notify_all();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }

    /// Number of queued, not-yet-claimed tasks.
    pub fn backlog(&self) -> usize {
        self.shared.state.lock().tasks.len()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(shared: Arc<Shared>) {
    loop {
        let task = {
            let mut state = shared.state.lock();
            while state.tasks.is_empty() && !state.stop {
                shared.available.wait(&mut state);
            }
            // Stop requested: keep draining until the queue is empty.
            match state.tasks.pop_front() {
                Some(task) => task,
                None => return,
            }
        };
        if let Err(panic) = catch_unwind(AssertUnwindSafe(task)) {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(reason = %reason, "worker task panicked");
        }
    }
}
