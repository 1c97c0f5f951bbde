//! Call Deduplication
//!
//! Collapses concurrent calls for the same key into one unit of work whose
//! result is handed to every caller.

use std::collections::HashMap;
use std::future::Future;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::debug;

type Slot<T> = watch::Receiver<Option<T>>;

/// Outcome of claiming a key.
enum Role<T> {
    /// No call in flight; this caller runs the work
    Leader(watch::Sender<Option<T>>),
    /// Another caller is running the work
    Waiter(Slot<T>),
}

// == Call Deduplicator ==
/// Runs at most one unit of work per key at a time.
///
/// The pending-call table is locked only to claim or release a key, never
/// while work runs, so a slow key does not hold up other keys.
pub struct CallDeduplicator<T> {
    calls: Mutex<HashMap<String, Slot<T>>>,
}

impl<T: Clone> CallDeduplicator<T> {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }

    // == Run ==
    /// Runs `work` for `key` unless a call for `key` is already in flight,
    /// in which case waits for that call and returns a clone of its result.
    ///
    /// If the caller running the work is dropped before it finishes, the
    /// waiters race to claim the key again and one of them runs its own work.
    pub async fn run<F, Fut>(&self, key: &str, work: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let tx = loop {
            match self.claim(key) {
                Role::Leader(tx) => break tx,
                Role::Waiter(mut rx) => {
                    let outcome = rx
                        .wait_for(Option::is_some)
                        .await
                        .map(|value| (*value).clone());
                    match outcome {
                        Ok(Some(value)) => return value,
                        _ => debug!(key, "in-flight call abandoned, claiming again"),
                    }
                }
            }
        };

        let release = Release {
            calls: &self.calls,
            key,
        };
        let value = work().await;
        let _ = tx.send(Some(value.clone()));
        drop(release);
        value
    }

    /// Returns the number of keys with a call in flight.
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }

    fn claim(&self, key: &str) -> Role<T> {
        let mut calls = self.calls.lock();
        if let Some(rx) = calls.get(key) {
            return Role::Waiter(rx.clone());
        }
        let (tx, rx) = watch::channel(None);
        calls.insert(key.to_string(), rx);
        Role::Leader(tx)
    }
}

impl<T: Clone> Default for CallDeduplicator<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Drops the pending call for `key` when the leader finishes or is cancelled.
struct Release<'a, T> {
    calls: &'a Mutex<HashMap<String, Slot<T>>>,
    key: &'a str,
}

impl<T> Drop for Release<'_, T> {
    fn drop(&mut self) {
        self.calls.lock().remove(self.key);
    }
}
