//! Majority-wait primitive.
//!
//! Fan-out sub-tasks record successes against a shared counter; the
//! coordinator blocks until the count reaches a threshold or a deadline
//! passes. Sub-tasks are never cancelled by the coordinator's departure;
//! they finish on their own and their late successes are simply ignored.

use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Shared success counter with a condition variable.
pub struct QuorumWait {
    count: Mutex<usize>,
    reached: Condvar,
}

impl QuorumWait {
    /// Start the counter at `initial` successes (a primary counts its own
    /// local apply as one).
    pub fn new(initial: usize) -> Self {
        Self {
            count: Mutex::new(initial),
            reached: Condvar::new(),
        }
    }

    /// Record one success and wake the waiting coordinator.
    pub fn record_success(&self) {
        let mut count = self.count.lock();
        *count += 1;
        self.reached.notify_all();
    }

    /// Current success count.
    pub fn count(&self) -> usize {
        *self.count.lock()
    }

    /// Block until `threshold` successes were recorded or `timeout`
    /// elapsed. Returns whether the threshold was reached.
    pub fn wait(&self, threshold: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut count = self.count.lock();
        while *count < threshold {
            if self.reached.wait_until(&mut count, deadline).timed_out() {
                return *count >= threshold;
            }
        }
        true
    }
}
