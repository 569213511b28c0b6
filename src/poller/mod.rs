// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Notification polling.
//!
//! The device reports state changes through the `GET_NOTIFIES` long-poll.
//! [`NotificationPoller`] runs one cycle per timer tick:
//!
//! 1. Skip if a cycle is still running.
//! 2. Every ten minutes, cancel sleep registry waits older than fifteen
//!    minutes.
//! 3. Fetch the pending notifications and apply them in device order.
//! 4. Refresh the cover art after a non-empty batch.
//! 5. Schedule the next cycle after the poll interval.
//!
//! Errors in a cycle are logged and never stop polling.

mod handlers;
mod timer;

pub use handlers::NotifyKind;
pub use timer::PollTimer;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::command::Request;
use crate::discovery::{refresh_graphic, write_ack};
use crate::error::{Error, ParseError};
use crate::invoker::CommandInvoker;
use crate::protocol::Transport;
use crate::response::Notification;
use crate::sleep::SleepRegistry;
use crate::store::{StateStore, paths};

/// How often the sleep registry is swept.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Waits older than this are cancelled by a sweep.
pub const SWEEP_MAX_AGE: Duration = Duration::from_secs(15 * 60);

/// Added to the poll interval to get the early-poll threshold of writes.
pub const DEBOUNCE_SLACK: Duration = Duration::from_secs(40);

/// Result of one timer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Another cycle was running, or polling is suppressed or closed.
    Skipped,
    /// A cycle ran.
    Polled {
        /// Notifications received.
        items: usize,
        /// Errors logged during the cycle.
        errors: usize,
    },
}

/// Runs notification poll cycles.
pub struct NotificationPoller<P> {
    invoker: Arc<CommandInvoker<P>>,
    store: Arc<dyn StateStore>,
    sleeps: Arc<SleepRegistry>,
    timer: Arc<PollTimer>,
    diagnostics: bool,
    in_progress: AtomicBool,
    last_poll: Mutex<Option<Instant>>,
    last_sweep: Mutex<Option<Instant>>,
}

impl<P: Transport> NotificationPoller<P> {
    /// Creates a poller. Nothing is polled until the timer fires or
    /// [`tick`](Self::tick) is called.
    #[must_use]
    pub fn new(
        invoker: Arc<CommandInvoker<P>>,
        store: Arc<dyn StateStore>,
        sleeps: Arc<SleepRegistry>,
        timer: Arc<PollTimer>,
    ) -> Self {
        Self {
            invoker,
            store,
            sleeps,
            timer,
            diagnostics: false,
            in_progress: AtomicBool::new(false),
            last_poll: Mutex::new(None),
            last_sweep: Mutex::new(None),
        }
    }

    /// Enables the `debug.lastNotifyCall` and `debug.lastNotifyError`
    /// fields.
    #[must_use]
    pub fn with_diagnostics(mut self, enabled: bool) -> Self {
        self.diagnostics = enabled;
        self
    }

    /// Returns the timer driving this poller.
    #[must_use]
    pub fn timer(&self) -> &Arc<PollTimer> {
        &self.timer
    }

    /// Returns true while a cycle is running.
    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.in_progress.load(Ordering::SeqCst)
    }

    /// Returns when the last cycle started.
    #[must_use]
    pub fn last_poll(&self) -> Option<Instant> {
        *self.last_poll.lock()
    }

    /// Runs one poll cycle unless one is already running.
    pub async fn tick(&self) -> PollOutcome {
        if self.timer.is_suppressed() || self.timer.is_closed() {
            tracing::debug!("Polling suppressed, tick skipped");
            return PollOutcome::Skipped;
        }
        if self
            .in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("Poll already in progress, tick skipped");
            return PollOutcome::Skipped;
        }

        let outcome = self.cycle().await;

        self.in_progress.store(false, Ordering::SeqCst);
        self.timer.arm_interval();
        outcome
    }

    /// Schedules an early poll if the last one is older than the poll
    /// interval plus [`DEBOUNCE_SLACK`].
    ///
    /// Called for every external state write. Returns true if a poll was
    /// scheduled.
    pub fn note_external_write(&self) -> bool {
        let threshold = self.timer.interval() + DEBOUNCE_SLACK;
        let due = self.last_poll().is_none_or(|at| at.elapsed() >= threshold);
        if due {
            tracing::debug!("Last poll too old, polling now");
            self.timer.arm(Duration::ZERO);
        }
        due
    }

    async fn cycle(&self) -> PollOutcome {
        let now = Instant::now();
        *self.last_poll.lock() = Some(now);
        let mut errors = 0;

        if self.diagnostics
            && let Err(e) = write_ack(
                self.store.as_ref(),
                paths::DEBUG_LAST_NOTIFY_CALL,
                Utc::now().timestamp_millis(),
            )
        {
            self.report(&e);
            errors += 1;
        }

        self.sweep_if_due(now);

        let result = self.invoker.invoke(&Request::notifies()).await;
        let Some(response) = result.payload() else {
            if let Some(failure) = result.failure() {
                tracing::debug!(failure = ?failure, "No notifications");
            }
            return PollOutcome::Polled { items: 0, errors };
        };

        let items = response.notifications.len();
        for notification in &response.notifications {
            if let Err(e) = self.apply(notification).await {
                self.report(&e);
                errors += 1;
            }
        }

        if items > 0
            && let Err(e) = refresh_graphic(&*self.invoker, self.store.as_ref()).await
        {
            self.report(&e);
            errors += 1;
        }

        tracing::debug!(items, errors, "Poll cycle finished");
        PollOutcome::Polled { items, errors }
    }

    async fn apply(&self, notification: &Notification) -> Result<(), Error> {
        let Some(kind) = NotifyKind::from_node(&notification.node) else {
            tracing::debug!(node = %notification.node, "Unhandled notification");
            return Ok(());
        };
        let value = notification
            .value()
            .ok_or_else(|| ParseError::MissingField(format!("{}/value", notification.node)))?;
        tracing::debug!(node = %notification.node, value = %value, "Notification");
        handlers::handle(kind, value, &*self.invoker, self.store.as_ref()).await
    }

    fn sweep_if_due(&self, now: Instant) {
        let mut last_sweep = self.last_sweep.lock();
        if last_sweep.is_some_and(|at| now.duration_since(at) < SWEEP_INTERVAL) {
            return;
        }
        *last_sweep = Some(now);
        let cancelled = self.sleeps.sweep_older_than(SWEEP_MAX_AGE);
        if cancelled > 0 {
            tracing::info!(cancelled, "Cancelled stale waits");
        }
    }

    fn report(&self, error: &Error) {
        tracing::warn!(error = %error, "Poll cycle error");
        if self.diagnostics
            && let Err(e) = self.store.write(
                paths::DEBUG_LAST_NOTIFY_ERROR,
                error.to_string().into(),
                true,
            )
        {
            tracing::warn!(error = %e, "Failed to record poll error");
        }
    }
}
