//! Request Lifecycle
//!
//! Tracks the single in-flight request per channel. Beginning a request
//! supersedes (and signals cancellation of) the previous one; completing a
//! request applies its outcome only while it is still current.
//!
//! Transport cancellation is best effort. The id check in `complete` is the
//! authoritative guard against stale outcomes.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;

/// Independent request streams of a search box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Autocomplete,
    Search,
    AiSearch,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Autocomplete => "autocomplete",
            Channel::Search => "search",
            Channel::AiSearch => "ai_search",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monotonic request identifier, unique per manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A begun request: its identity plus the signal to hand to the transport.
#[derive(Debug, Clone)]
pub struct RequestHandle {
    pub channel: Channel,
    pub id: RequestId,
    cancel: CancellationToken,
}

impl RequestHandle {
    pub fn signal(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

struct Current {
    id: RequestId,
    cancel: CancellationToken,
}

pub struct RequestLifecycle {
    current: Mutex<HashMap<Channel, Current>>,
    next_id: AtomicU64,
}

impl RequestLifecycle {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Start a request on `channel`, superseding any unfinished one.
    pub fn begin(&self, channel: Channel) -> RequestHandle {
        self.begin_with(channel, |_| ()).0
    }

    /// Like `begin`, running `f` with the new id while the lifecycle lock is
    /// held, so state transitions tied to the new request cannot interleave
    /// with a concurrent `complete`.
    pub fn begin_with<R>(&self, channel: Channel, f: impl FnOnce(RequestId) -> R) -> (RequestHandle, R) {
        let mut current = self.current.lock();

        let id = RequestId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let cancel = CancellationToken::new();

        if let Some(previous) = current.insert(
            channel,
            Current {
                id,
                cancel: cancel.clone(),
            },
        ) {
            log::debug!("{} request {} superseded by {}", channel, previous.id, id);
            previous.cancel.cancel();
        }

        let output = f(id);
        (RequestHandle { channel, id, cancel }, output)
    }

    pub fn is_current(&self, channel: Channel, id: RequestId) -> bool {
        self.current
            .lock()
            .get(&channel)
            .is_some_and(|c| c.id == id)
    }

    pub fn current(&self, channel: Channel) -> Option<RequestId> {
        self.current.lock().get(&channel).map(|c| c.id)
    }

    /// Apply `outcome` if `id` is still current on `channel`, then retire it.
    /// Stale completions are a silent no-op returning `None`.
    pub fn complete<R>(&self, channel: Channel, id: RequestId, outcome: impl FnOnce() -> R) -> Option<R> {
        let mut current = self.current.lock();
        match current.get(&channel) {
            Some(c) if c.id == id => {
                current.remove(&channel);
                Some(outcome())
            }
            _ => {
                log::debug!("Discarding stale {} outcome for request {}", channel, id);
                None
            }
        }
    }

    /// Cancel and forget the current request on `channel`.
    pub fn invalidate(&self, channel: Channel) -> Option<RequestId> {
        self.invalidate_with(channel, || ()).0
    }

    /// Like `invalidate`, running `f` under the lifecycle lock.
    pub fn invalidate_with<R>(&self, channel: Channel, f: impl FnOnce() -> R) -> (Option<RequestId>, R) {
        let mut current = self.current.lock();
        let invalidated = current.remove(&channel).map(|c| {
            c.cancel.cancel();
            c.id
        });
        (invalidated, f())
    }

    pub fn cancel_all(&self) {
        for (_, c) in self.current.lock().drain() {
            c.cancel.cancel();
        }
    }
}

impl Default for RequestLifecycle {
    fn default() -> Self {
        Self::new()
    }
}
