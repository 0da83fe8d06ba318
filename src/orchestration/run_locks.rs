//! # Keyed Run Locks
//!
//! Single-flight guard keyed by run id. Executions for different runs never
//! contend; two executions that share a run id are serialized. An entry lives
//! only while some caller holds or waits on it.

use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

#[derive(Clone, Default)]
pub struct RunLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl RunLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`
    ///
    /// Dropping the returned future while it waits still releases the entry.
    pub async fn acquire(&self, key: &str) -> RunLockGuard {
        // Declared before the lock clone so it is dropped after it on cancellation
        let cleanup = EntryCleanup {
            key: key.to_string(),
            locks: Arc::clone(&self.locks),
        };

        let lock = self
            .locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        if lock.try_lock().is_err() {
            debug!(run_id = %key, "Run already executing - waiting for single-flight lock");
        }

        let guard = lock.lock_owned().await;
        RunLockGuard {
            guard: Some(guard),
            cleanup,
        }
    }

    /// Keys currently held or awaited
    pub fn active_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.locks.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn is_active(&self, key: &str) -> bool {
        self.locks.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl fmt::Debug for RunLocks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunLocks")
            .field("active_keys", &self.active_keys())
            .finish()
    }
}

/// Removes the map entry once nobody else references its mutex
struct EntryCleanup {
    key: String,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl Drop for EntryCleanup {
    fn drop(&mut self) {
        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// Held for the duration of one execution; removes the entry when last out
pub struct RunLockGuard {
    guard: Option<OwnedMutexGuard<()>>,
    cleanup: EntryCleanup,
}

impl RunLockGuard {
    pub fn key(&self) -> &str {
        &self.cleanup.key
    }
}

impl Drop for RunLockGuard {
    fn drop(&mut self) {
        // Release the mutex before `cleanup` runs so the map holds the only reference
        drop(self.guard.take());
    }
}

impl fmt::Debug for RunLockGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunLockGuard")
            .field("key", &self.cleanup.key)
            .finish()
    }
}
