//! Debounce Scheduler
//!
//! Collapses bursts of triggers into a single delayed action per token.
//! Scheduling again for the same token before the delay elapses discards the
//! pending action; it is never invoked.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

struct Pending {
    generation: u64,
    handle: JoinHandle<()>,
}

pub struct DebounceScheduler<K> {
    pending: Arc<Mutex<HashMap<K, Pending>>>,
    generation: AtomicU64,
}

impl<K> DebounceScheduler<K>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
            generation: AtomicU64::new(0),
        }
    }

    /// Run `action` after `delay` unless `token` is rescheduled or cancelled
    /// first. Must be called from within a tokio runtime.
    ///
    /// Once the action starts it is no longer pending and later calls do not
    /// abort it.
    pub fn schedule<F, Fut>(&self, token: K, delay: Duration, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let pending = Arc::clone(&self.pending);
        let task_token = token.clone();

        // Held across spawn so the task cannot observe the map before its own entry.
        let mut guard = self.pending.lock();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut map = pending.lock();
                match map.get(&task_token) {
                    Some(entry) if entry.generation == generation => {
                        map.remove(&task_token);
                    }
                    _ => return,
                }
            }
            action().await;
        });

        if let Some(previous) = guard.insert(token, Pending { generation, handle }) {
            previous.handle.abort();
        }
    }

    /// Discard the pending action for `token`. Returns whether one existed.
    pub fn cancel(&self, token: &K) -> bool {
        match self.pending.lock().remove(token) {
            Some(entry) => {
                entry.handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) {
        for (_, entry) in self.pending.lock().drain() {
            entry.handle.abort();
        }
    }

    pub fn is_pending(&self, token: &K) -> bool {
        self.pending.lock().contains_key(token)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }
}

impl<K> Default for DebounceScheduler<K>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Drop for DebounceScheduler<K> {
    fn drop(&mut self) {
        for (_, entry) in self.pending.lock().drain() {
            entry.handle.abort();
        }
    }
}
