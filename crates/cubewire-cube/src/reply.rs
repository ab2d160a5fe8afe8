//! Request/reply rendezvous for commands answered by a later notification.
//!
//! A caller registers interest in a key (an operation id, or `()` when only
//! one reply kind exists) *before* writing the request. The notification
//! handler resolves every waiter on that key. Waiting always carries a
//! deadline; a [`ReplyCanceller`] can abort it early from another thread.
//! Dropping a pending reply deregisters it.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::{CubeError, Result};

enum Outcome<T> {
    Ready(T),
    Cancelled,
}

type Completion<T> = Box<dyn FnOnce(Outcome<T>) + Send>;
type Deregister = Box<dyn FnOnce() + Send>;

/// Registry of outstanding waiters keyed by `K`.
pub(crate) struct Waiters<K, T> {
    next_token: AtomicU64,
    slots: Mutex<HashMap<K, Vec<(u64, Completion<T>)>>>,
}

impl<K, T> Waiters<K, T>
where
    K: Eq + Hash + Copy + Send + Sync + 'static,
    T: Clone + Send + 'static,
{
    pub(crate) fn new() -> Self {
        Self {
            next_token: AtomicU64::new(0),
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn insert(&self, key: K, completion: Completion<T>) -> u64 {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        self.slots
            .lock()
            .entry(key)
            .or_default()
            .push((token, completion));
        token
    }

    fn remove(&self, key: &K, token: u64) {
        let mut slots = self.slots.lock();
        if let Some(waiting) = slots.get_mut(key) {
            waiting.retain(|(t, _)| *t != token);
            if waiting.is_empty() {
                slots.remove(key);
            }
        }
    }

    fn deregister(self: &Arc<Self>, key: K, token: u64) -> Deregister {
        let weak: Weak<Self> = Arc::downgrade(self);
        Box::new(move || {
            if let Some(waiters) = weak.upgrade() {
                waiters.remove(&key, token);
            }
        })
    }

    /// Wait for the next reply on `key`.
    pub(crate) fn register(self: &Arc<Self>, key: K) -> PendingReply<T> {
        let (tx, rx) = mpsc::channel();
        let canceller = ReplyCanceller { tx: tx.clone() };
        let token = self.insert(
            key,
            Box::new(move |outcome| {
                let _ = tx.send(outcome);
            }),
        );
        PendingReply {
            rx,
            canceller,
            deregister: Some(self.deregister(key, token)),
        }
    }

    #[cfg(feature = "async")]
    pub(crate) fn register_async(self: &Arc<Self>, key: K) -> AsyncPendingReply<T> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let token = self.insert(
            key,
            Box::new(move |outcome| {
                let _ = tx.send(outcome);
            }),
        );
        AsyncPendingReply {
            rx,
            deregister: Some(self.deregister(key, token)),
        }
    }

    /// Complete every waiter on `key` with `value`. Returns how many there were.
    pub(crate) fn resolve(&self, key: &K, value: T) -> usize {
        let waiting = self.slots.lock().remove(key).unwrap_or_default();
        let count = waiting.len();
        for (_, complete) in waiting {
            complete(Outcome::Ready(value.clone()));
        }
        count
    }

    pub(crate) fn is_waiting(&self, key: &K) -> bool {
        self.slots.lock().contains_key(key)
    }

    /// Cancel every outstanding waiter.
    pub(crate) fn cancel_all(&self) -> usize {
        let drained: Vec<_> = self.slots.lock().drain().collect();
        let mut count = 0;
        for (_, waiting) in drained {
            for (_, complete) in waiting {
                complete(Outcome::Cancelled);
                count += 1;
            }
        }
        count
    }
}

/// A reply that has been requested but not yet received.
pub struct PendingReply<T> {
    rx: mpsc::Receiver<Outcome<T>>,
    canceller: ReplyCanceller<T>,
    deregister: Option<Deregister>,
}

impl<T> PendingReply<T> {
    /// Handle that aborts [`PendingReply::wait`] from another thread.
    pub fn canceller(&self) -> ReplyCanceller<T> {
        self.canceller.clone()
    }

    /// Block until the reply arrives, `timeout` elapses, or the wait is
    /// cancelled.
    pub fn wait(self, timeout: Duration) -> Result<T> {
        match self.rx.recv_timeout(timeout) {
            Ok(Outcome::Ready(value)) => Ok(value),
            Ok(Outcome::Cancelled) | Err(RecvTimeoutError::Disconnected) => {
                Err(CubeError::Cancelled)
            }
            Err(RecvTimeoutError::Timeout) => Err(CubeError::Timeout(timeout)),
        }
    }
}

impl<T> Drop for PendingReply<T> {
    fn drop(&mut self) {
        if let Some(deregister) = self.deregister.take() {
            deregister();
        }
    }
}

impl<T> std::fmt::Debug for PendingReply<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingReply").finish_non_exhaustive()
    }
}

/// Cancels a [`PendingReply`].
pub struct ReplyCanceller<T> {
    tx: mpsc::Sender<Outcome<T>>,
}

impl<T> ReplyCanceller<T> {
    /// Wake the waiter with [`CubeError::Cancelled`]. No effect once the
    /// reply has been consumed.
    pub fn cancel(&self) {
        let _ = self.tx.send(Outcome::Cancelled);
    }
}

impl<T> Clone for ReplyCanceller<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> std::fmt::Debug for ReplyCanceller<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplyCanceller").finish_non_exhaustive()
    }
}

/// Async counterpart of [`PendingReply`]. Dropping the future cancels it.
#[cfg(feature = "async")]
pub struct AsyncPendingReply<T> {
    rx: tokio::sync::oneshot::Receiver<Outcome<T>>,
    deregister: Option<Deregister>,
}

#[cfg(feature = "async")]
impl<T> AsyncPendingReply<T> {
    pub async fn wait(mut self, timeout: Duration) -> Result<T> {
        match tokio::time::timeout(timeout, &mut self.rx).await {
            Ok(Ok(Outcome::Ready(value))) => Ok(value),
            Ok(Ok(Outcome::Cancelled)) | Ok(Err(_)) => Err(CubeError::Cancelled),
            Err(_) => Err(CubeError::Timeout(timeout)),
        }
    }
}

#[cfg(feature = "async")]
impl<T> Drop for AsyncPendingReply<T> {
    fn drop(&mut self) {
        if let Some(deregister) = self.deregister.take() {
            deregister();
        }
    }
}
