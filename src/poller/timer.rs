// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Self-rescheduling poll timer.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

type Hook = Box<dyn Fn() + Send + Sync>;

/// One-shot timer that fires a hook after a delay.
///
/// At most one firing is pending: arming the timer replaces the previous
/// schedule. While suppressed (session backoff, terminal session failure)
/// or after close, arming is a no-op.
pub struct PollTimer {
    interval: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
    suppressed: AtomicBool,
    closed: AtomicBool,
    hook: OnceLock<Hook>,
}

impl PollTimer {
    /// Creates an idle timer whose regular delay is `interval`.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: Mutex::new(None),
            suppressed: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            hook: OnceLock::new(),
        }
    }

    /// Returns the regular poll interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Installs the function called when the timer fires.
    ///
    /// Only the first installed hook is kept. The hook runs on the timer
    /// task and must not block.
    pub fn set_hook(&self, hook: impl Fn() + Send + Sync + 'static) {
        let _ = self.hook.set(Box::new(hook));
    }

    /// Schedules the hook after `delay`, replacing any pending schedule.
    ///
    /// Must be called from within a tokio runtime.
    pub fn arm(self: &Arc<Self>, delay: Duration) {
        if self.is_suppressed() || self.is_closed() {
            return;
        }
        let timer = Arc::clone(self);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if timer.is_suppressed() || timer.is_closed() {
                return;
            }
            if let Some(hook) = timer.hook.get() {
                hook();
            }
        });
        if let Some(previous) = self.pending.lock().replace(task) {
            previous.abort();
        }
    }

    /// Schedules the hook after the regular interval.
    pub fn arm_interval(self: &Arc<Self>) {
        self.arm(self.interval);
    }

    /// Drops the pending schedule, if any.
    pub fn cancel(&self) {
        if let Some(task) = self.pending.lock().take() {
            task.abort();
        }
    }

    /// Stops polling until [`resume`](Self::resume).
    pub fn suppress(&self) {
        self.suppressed.store(true, Ordering::SeqCst);
        self.cancel();
    }

    /// Lifts a suppression and schedules the next poll after the interval.
    ///
    /// Returns false if the timer was not suppressed.
    pub fn resume(self: &Arc<Self>) -> bool {
        if !self.suppressed.swap(false, Ordering::SeqCst) {
            return false;
        }
        self.arm_interval();
        true
    }

    /// Returns true while suppressed.
    #[must_use]
    pub fn is_suppressed(&self) -> bool {
        self.suppressed.load(Ordering::SeqCst)
    }

    /// Returns true if a firing is scheduled and has not happened yet.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Cancels the timer for good. Idempotent.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.cancel();
    }

    /// Returns true once closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for PollTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollTimer")
            .field("interval", &self.interval)
            .field("armed", &self.is_armed())
            .field("suppressed", &self.is_suppressed())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    fn counting_timer(interval: Duration) -> (Arc<PollTimer>, Arc<AtomicUsize>) {
        let timer = Arc::new(PollTimer::new(interval));
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        timer.set_hook(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (timer, fired)
    }

    #[tokio::test(start_paused = true)]
    async fn fires_after_delay() {
        let (timer, fired) = counting_timer(Duration::from_secs(5));
        timer.arm_interval();
        assert!(timer.is_armed());

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!timer.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_replaces_pending_schedule() {
        let (timer, fired) = counting_timer(Duration::from_secs(5));
        timer.arm_interval();
        timer.arm(Duration::ZERO);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn suppressed_timer_does_not_fire() {
        let (timer, fired) = counting_timer(Duration::from_secs(5));
        timer.arm_interval();
        timer.suppress();
        timer.arm(Duration::ZERO);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        assert!(timer.resume());
        assert!(!timer.resume());
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_timer_stays_closed() {
        let (timer, fired) = counting_timer(Duration::from_secs(5));
        timer.arm_interval();
        timer.close();
        timer.close();
        timer.arm(Duration::ZERO);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(timer.is_closed());
    }
}
