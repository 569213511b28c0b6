// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cancellable delays.
//!
//! Every pause the engine takes (settle time after a mode switch, the
//! backoff after exhausted session retries, the DAB wake-up dance) goes
//! through a [`SleepRegistry`], so that shutdown can resolve all of them at
//! once and no timer outlives the device.
//!
//! Cancellation resolves a wait early instead of failing it.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use fsapi_lib::sleep::{SleepRegistry, WaitOutcome};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let sleeps = SleepRegistry::new();
//! sleeps.close();
//!
//! // A closed registry resolves every wait immediately.
//! let outcome = sleeps.wait(Duration::from_secs(3600)).await;
//! assert_eq!(outcome, WaitOutcome::Cancelled);
//! # }
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::time::Instant;

/// Identifies one pending wait.
///
/// Waits are ordered by creation time; the sequence number tells apart
/// waits created at the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WaitKey {
    created_at: Instant,
    seq: u64,
}

impl WaitKey {
    /// Returns when the wait was created.
    #[must_use]
    pub fn created_at(&self) -> Instant {
        self.created_at
    }
}

/// How a wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The full duration elapsed.
    Elapsed,
    /// The wait was resolved early by a cancellation.
    Cancelled,
}

#[derive(Debug, Default)]
struct RegistryState {
    waits: BTreeMap<WaitKey, oneshot::Sender<()>>,
    closed: bool,
}

/// Registry of cancellable waits.
#[derive(Debug, Default)]
pub struct SleepRegistry {
    state: Mutex<RegistryState>,
    seq: AtomicU64,
}

impl SleepRegistry {
    /// Creates an empty, open registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a wait of `duration` starting now.
    ///
    /// The wait only runs once [`PendingWait::finish`] is awaited, but it is
    /// cancellable from the moment it is registered. On a closed registry
    /// the wait is already resolved.
    pub fn start(&self, duration: Duration) -> PendingWait<'_> {
        let key = WaitKey {
            created_at: Instant::now(),
            seq: self.seq.fetch_add(1, Ordering::Relaxed),
        };
        let (tx, rx) = oneshot::channel();

        let mut state = self.state.lock();
        if !state.closed {
            state.waits.insert(key, tx);
        }

        PendingWait {
            registry: self,
            key,
            deadline: key.created_at + duration,
            rx,
        }
    }

    /// Waits for `duration` unless cancelled first.
    pub async fn wait(&self, duration: Duration) -> WaitOutcome {
        self.start(duration).finish().await
    }

    /// Cancels one wait. Returns false if it already ended.
    pub fn cancel(&self, key: WaitKey) -> bool {
        let sender = self.state.lock().waits.remove(&key);
        sender.is_some_and(|tx| tx.send(()).is_ok())
    }

    /// Cancels every outstanding wait and returns how many were pending.
    pub fn cancel_all(&self) -> usize {
        let waits = std::mem::take(&mut self.state.lock().waits);
        let count = waits.len();
        for tx in waits.into_values() {
            let _ = tx.send(());
        }
        count
    }

    /// Cancels the waits created more than `age` ago.
    ///
    /// Returns how many waits were cancelled. Newer waits are left intact.
    pub fn sweep_older_than(&self, age: Duration) -> usize {
        let now = Instant::now();
        let stale: Vec<_> = {
            let mut state = self.state.lock();
            let keys: Vec<WaitKey> = state
                .waits
                .keys()
                .take_while(|k| now.saturating_duration_since(k.created_at) > age)
                .copied()
                .collect();
            keys.iter()
                .filter_map(|k| state.waits.remove(k))
                .collect()
        };
        let count = stale.len();
        for tx in stale {
            let _ = tx.send(());
        }
        if count > 0 {
            tracing::debug!(count, "Swept stale waits");
        }
        count
    }

    /// Cancels every wait and resolves all future waits immediately.
    ///
    /// Idempotent.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.cancel_all();
    }

    /// Returns true once [`close`](Self::close) was called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Returns the number of outstanding waits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().waits.len()
    }

    /// Returns true if no wait is outstanding.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A registered wait. Dropping it deregisters the wait.
#[derive(Debug)]
pub struct PendingWait<'a> {
    registry: &'a SleepRegistry,
    key: WaitKey,
    deadline: Instant,
    rx: oneshot::Receiver<()>,
}

impl PendingWait<'_> {
    /// Returns the key to cancel this wait with.
    #[must_use]
    pub fn key(&self) -> WaitKey {
        self.key
    }

    /// Runs the wait to its deadline or until it is cancelled.
    pub async fn finish(mut self) -> WaitOutcome {
        tokio::select! {
            biased;
            _ = &mut self.rx => WaitOutcome::Cancelled,
            () = tokio::time::sleep_until(self.deadline) => WaitOutcome::Elapsed,
        }
    }
}

impl Drop for PendingWait<'_> {
    fn drop(&mut self) {
        self.registry.state.lock().waits.remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn wait_elapses() {
        let sleeps = SleepRegistry::new();
        let started = Instant::now();
        assert_eq!(
            sleeps.wait(Duration::from_secs(2)).await,
            WaitOutcome::Elapsed
        );
        assert!(started.elapsed() >= Duration::from_secs(2));
        assert!(sleeps.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_single_wait() {
        let sleeps = SleepRegistry::new();
        let first = sleeps.start(Duration::from_secs(60));
        let second = sleeps.start(Duration::from_secs(60));
        assert_eq!(sleeps.len(), 2);

        assert!(sleeps.cancel(first.key()));
        assert!(!sleeps.cancel(first.key()));
        assert_eq!(first.finish().await, WaitOutcome::Cancelled);

        assert_eq!(sleeps.len(), 1);
        drop(second);
        assert!(sleeps.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn same_instant_waits_have_distinct_keys() {
        let sleeps = SleepRegistry::new();
        let a = sleeps.start(Duration::from_secs(1));
        let b = sleeps.start(Duration::from_secs(1));
        assert_eq!(a.key().created_at(), b.key().created_at());
        assert_ne!(a.key(), b.key());

        sleeps.cancel(a.key());
        assert_eq!(a.finish().await, WaitOutcome::Cancelled);
        assert_eq!(b.finish().await, WaitOutcome::Elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_resolves_every_wait() {
        let sleeps = Arc::new(SleepRegistry::new());
        let mut tasks = Vec::new();
        for _ in 0..3 {
            let sleeps = Arc::clone(&sleeps);
            tasks.push(tokio::spawn(async move {
                sleeps.wait(Duration::from_secs(3600)).await
            }));
        }
        while sleeps.len() < 3 {
            tokio::task::yield_now().await;
        }

        assert_eq!(sleeps.cancel_all(), 3);
        for task in tasks {
            assert_eq!(task.await.unwrap(), WaitOutcome::Cancelled);
        }
        assert!(sleeps.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_cancels_only_old_waits() {
        let sleeps = SleepRegistry::new();
        let old = sleeps.start(Duration::from_secs(3600));

        tokio::time::advance(Duration::from_secs(10 * 60)).await;
        let young = sleeps.start(Duration::from_secs(3600));

        tokio::time::advance(Duration::from_secs(6 * 60)).await;
        assert_eq!(sleeps.sweep_older_than(Duration::from_secs(15 * 60)), 1);

        assert_eq!(sleeps.len(), 1);
        assert!(!sleeps.cancel(old.key()));
        assert!(sleeps.cancel(young.key()));
        assert_eq!(old.finish().await, WaitOutcome::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_registry_resolves_immediately() {
        let sleeps = SleepRegistry::new();
        let pending = sleeps.start(Duration::from_secs(60));
        sleeps.close();
        sleeps.close();
        assert!(sleeps.is_closed());
        assert_eq!(pending.finish().await, WaitOutcome::Cancelled);

        let started = Instant::now();
        assert_eq!(
            sleeps.wait(Duration::from_secs(60)).await,
            WaitOutcome::Cancelled
        );
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert!(sleeps.is_empty());
    }
}
