//! Per-server in-memory store with a logical clock.
//!
//! One exclusive lock covers the entry map and the clock together; the
//! clock advance and the map write must be atomic for timestamp
//! monotonicity. The lock is only ever held across the in-memory update,
//! never across I/O.

use parking_lot::Mutex;
use std::collections::HashMap;

/// A stored value with its logical write timestamp.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub value: String,
    pub timestamp: u64,
}

struct StoreInner {
    entries: HashMap<String, Entry>,
    clock: u64,
}

/// The in-memory key-value store of a single server.
pub struct Store {
    inner: Mutex<StoreInner>,
}

impl Store {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                entries: HashMap::new(),
                clock: 1,
            }),
        }
    }

    /// Read an entry. No clock side effect.
    pub fn get(&self, key: &str) -> Option<Entry> {
        self.inner.lock().entries.get(key).cloned()
    }

    /// Apply a write and return the timestamp it was stored under.
    ///
    /// With a proposed timestamp (a forwarded replica write) the clock
    /// advances to `max(clock, proposed)`; without one (a locally
    /// originated write) it advances by exactly one. Either way the entry
    /// is overwritten unconditionally: conflict resolution is
    /// last-write-wins at read time, not a gate here. The max rule
    /// guarantees any later local write outbids every proposed timestamp
    /// this server has ever accepted.
    pub fn put(&self, key: &str, value: String, proposed_ts: Option<u64>) -> u64 {
        let mut inner = self.inner.lock();
        inner.clock = match proposed_ts {
            Some(ts) => inner.clock.max(ts),
            None => inner.clock + 1,
        };
        let timestamp = inner.clock;
        inner.entries.insert(key.to_owned(), Entry { value, timestamp });
        timestamp
    }

    /// Current clock value. After any put, `clock() >= ` every timestamp
    /// this store has ever returned.
    pub fn clock(&self) -> u64 {
        self.inner.lock().clock
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
