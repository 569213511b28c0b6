// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session creation, renewal and recovery.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::time::Instant;

use super::{Session, SessionPolicy, SessionState};
use crate::command::create_session_url;
use crate::error::SessionError;
use crate::poller::PollTimer;
use crate::protocol::Transport;
use crate::response::FsapiResponse;
use crate::sleep::SleepRegistry;
use crate::store::{StateStore, StateValue, paths};
use crate::types::Pin;

enum Attempt {
    Created,
    Exhausted,
    Failed(SessionError),
}

/// Owns the device session and its retry policy.
///
/// The manager is the only writer of the session and of the `connected`
/// indicator (`info.connection` in the state store).
pub struct SessionManager<P> {
    transport: Arc<P>,
    base_url: RwLock<String>,
    pin: Pin,
    policy: SessionPolicy,
    session: RwLock<Option<Session>>,
    generation: AtomicU64,
    state: Mutex<SessionState>,
    backoff_until: Mutex<Option<Instant>>,
    retries_remaining: AtomicU32,
    connected: AtomicBool,
    creation: tokio::sync::Mutex<()>,
    store: Arc<dyn StateStore>,
    sleeps: Arc<SleepRegistry>,
    timer: Arc<PollTimer>,
    diagnostics: bool,
}

impl<P: Transport> SessionManager<P> {
    /// Creates a manager without session.
    ///
    /// The FSAPI base URL must be set with [`set_base_url`](Self::set_base_url)
    /// before the first session is created.
    #[must_use]
    pub fn new(
        transport: Arc<P>,
        pin: Pin,
        policy: SessionPolicy,
        store: Arc<dyn StateStore>,
        sleeps: Arc<SleepRegistry>,
        timer: Arc<PollTimer>,
    ) -> Self {
        Self {
            transport,
            base_url: RwLock::new(String::new()),
            pin,
            policy,
            session: RwLock::new(None),
            generation: AtomicU64::new(0),
            state: Mutex::new(SessionState::Unstarted),
            backoff_until: Mutex::new(None),
            retries_remaining: AtomicU32::new(policy.max_retries),
            connected: AtomicBool::new(false),
            creation: tokio::sync::Mutex::new(()),
            store,
            sleeps,
            timer,
            diagnostics: false,
        }
    }

    /// Enables writing the `debug.session*` diagnostic state.
    #[must_use]
    pub fn with_diagnostics(mut self, enabled: bool) -> Self {
        self.diagnostics = enabled;
        self
    }

    /// Sets the FSAPI base URL, without trailing slash.
    pub fn set_base_url(&self, url: &str) {
        *self.base_url.write() = url.trim_end_matches('/').to_string();
    }

    /// Returns the FSAPI base URL.
    #[must_use]
    pub fn base_url(&self) -> String {
        self.base_url.read().clone()
    }

    /// Returns the PIN.
    #[must_use]
    pub fn pin(&self) -> &Pin {
        &self.pin
    }

    /// Returns the transport.
    #[must_use]
    pub fn transport(&self) -> &P {
        &self.transport
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    /// Returns a copy of the current session.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.session.read().clone()
    }

    /// Returns the current session id.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.session.read().as_ref().map(|s| s.token().to_string())
    }

    /// Returns a counter bumped on every successful creation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Returns the fast retries left before backing off.
    #[must_use]
    pub fn retries_remaining(&self) -> u32 {
        self.retries_remaining.load(Ordering::SeqCst)
    }

    /// Returns true while a session is established.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Returns the retry policy.
    #[must_use]
    pub fn policy(&self) -> SessionPolicy {
        self.policy
    }

    /// Creates a new session, replacing the current one.
    ///
    /// Unreachable devices are retried immediately up to the retry budget,
    /// then after a full renewal interval, for as long as it takes. The
    /// backoff ends early, with `SessionError::Unreachable`, only when the
    /// sleep registry is closed.
    ///
    /// A call made while another caller backs off joins that backoff and
    /// returns once the shared retry after it settles.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::PinMismatch` on HTTP 403,
    /// `SessionError::InvalidRequest` on HTTP 404 and
    /// `SessionError::Unknown` for any other failure.
    pub async fn create_session(&self, is_renewal: bool) -> Result<(), SessionError> {
        self.create_if(is_renewal, |_| true).await
    }

    /// Renews the session if it is older than the renewal interval.
    pub(crate) async fn renew_if_stale(&self) -> Result<(), SessionError> {
        if !self.needs_renewal() {
            return Ok(());
        }
        self.create_if(true, Self::needs_renewal).await
    }

    /// Recreates the session after a failed call.
    ///
    /// Does nothing if another session was created since `seen_generation`
    /// or while backing off.
    pub(crate) async fn recover(&self, seen_generation: u64) -> Result<(), SessionError> {
        let still_needed = |manager: &Self| {
            manager.generation() == seen_generation && manager.state() != SessionState::Backoff
        };
        if !still_needed(self) {
            return Ok(());
        }
        self.create_if(true, still_needed).await
    }

    /// Marks the session as not connected.
    pub(crate) fn mark_disconnected(&self) {
        self.set_connected(false);
    }

    fn needs_renewal(&self) -> bool {
        if matches!(self.state(), SessionState::Backoff | SessionState::Failed) {
            return false;
        }
        self.session
            .read()
            .as_ref()
            .is_some_and(|s| s.age() > self.policy.renewal_interval)
    }

    async fn create_if(
        &self,
        is_renewal: bool,
        still_needed: impl Fn(&Self) -> bool,
    ) -> Result<(), SessionError> {
        let mut after_backoff = false;
        loop {
            if !after_backoff && !still_needed(self) {
                return Ok(());
            }
            if self.wait_out_backoff().await? {
                after_backoff = true;
            }

            let _flight = self.creation.lock().await;
            if self.backoff_remaining().is_some() {
                continue;
            }
            if after_backoff {
                if self.state() == SessionState::Active {
                    return Ok(());
                }
            } else if !still_needed(self) {
                return Ok(());
            }

            match self.attempt(is_renewal && !after_backoff).await {
                Attempt::Created => return Ok(()),
                Attempt::Failed(err) => return Err(err),
                Attempt::Exhausted => after_backoff = true,
            }
        }
    }

    /// Sleeps until the running backoff, if any, is over.
    ///
    /// Returns whether there was one. A wait cancelled by anything but
    /// closing the registry is resumed until the deadline.
    async fn wait_out_backoff(&self) -> Result<bool, SessionError> {
        let mut waited = false;
        while let Some(remaining) = self.backoff_remaining() {
            waited = true;
            self.sleeps.wait(remaining).await;
            if self.sleeps.is_closed() {
                return Err(SessionError::Unreachable);
            }
        }
        Ok(waited)
    }

    fn backoff_remaining(&self) -> Option<Duration> {
        let until = (*self.backoff_until.lock())?;
        let remaining = until.saturating_duration_since(Instant::now());
        (!remaining.is_zero()).then_some(remaining)
    }

    /// One creation attempt including its burst of fast retries.
    ///
    /// Must be called with the creation lock held.
    async fn attempt(&self, is_renewal: bool) -> Attempt {
        self.set_state(SessionState::Creating);
        let base_url = self.base_url();

        if !is_renewal {
            tracing::info!(
                device = %self.device_name(),
                base_url = %base_url,
                "Trying to create session"
            );
        }

        loop {
            let url = create_session_url(&base_url, self.pin.as_str());
            tracing::debug!(url = %url, "Creating session");

            let outcome = match self.transport.get(&url).await {
                Ok(body) => parse_token(&body),
                Err(err) => {
                    tracing::debug!(error = %err, "Session request failed");
                    Err(SessionError::from(&err))
                }
            };

            match outcome {
                Ok(token) => {
                    self.install(token, is_renewal);
                    return Attempt::Created;
                }
                Err(SessionError::Unreachable) => {
                    self.set_connected(false);
                    let remaining = self.retries_remaining();
                    if remaining > 0 {
                        tracing::warn!(
                            device = %self.device_name(),
                            remaining,
                            "Device unreachable, retrying session creation"
                        );
                        self.retries_remaining
                            .store(remaining - 1, Ordering::SeqCst);
                        continue;
                    }

                    self.retries_remaining
                        .store(self.policy.max_retries, Ordering::SeqCst);
                    tracing::error!(
                        device = %self.device_name(),
                        retry_in_secs = self.policy.renewal_interval.as_secs(),
                        "Device unreachable, retrying after session renewal interval"
                    );
                    self.set_state(SessionState::Backoff);
                    *self.backoff_until.lock() =
                        Some(Instant::now() + self.policy.renewal_interval);
                    self.sleeps.cancel_all();
                    self.timer.suppress();
                    return Attempt::Exhausted;
                }
                Err(err) => {
                    self.set_connected(false);
                    self.set_state(SessionState::Failed);
                    self.timer.suppress();
                    tracing::error!(error = %err, "Session creation failed, polling stopped");
                    return Attempt::Failed(err);
                }
            }
        }
    }

    fn install(&self, token: String, is_renewal: bool) {
        let session = Session::new(token);
        let created_ms = session.created_wall().timestamp_millis();
        let token = session.token().to_string();

        *self.session.write() = Some(session);
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.retries_remaining
            .store(self.policy.max_retries, Ordering::SeqCst);
        self.set_state(SessionState::Active);
        *self.backoff_until.lock() = None;
        self.set_connected(true);

        if is_renewal {
            tracing::debug!(session = %token, device = %self.device_name(), "Session created");
        } else {
            tracing::info!(session = %token, device = %self.device_name(), "Session created");
        }

        if self.diagnostics {
            self.write_state(paths::DEBUG_SESSION, StateValue::from(token));
            self.write_state(paths::DEBUG_SESSION_CREATION_TIME, created_ms.into());
        }

        if self.timer.resume() {
            tracing::info!("Polling resumed");
        }
    }

    fn set_state(&self, state: SessionState) {
        *self.state.lock() = state;
    }

    fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
        self.write_state(paths::CONNECTION, connected.into());
    }

    fn write_state(&self, path: &str, value: StateValue) {
        if let Err(e) = self.store.write(path, value, true) {
            tracing::warn!(error = %e, "Failed to write session state");
        }
    }

    fn device_name(&self) -> String {
        self.store
            .read(paths::DEVICE_FRIENDLY_NAME)
            .and_then(|v| v.as_text().map(str::to_string))
            .unwrap_or_else(|| "unknown".to_string())
    }
}

fn parse_token(body: &str) -> Result<String, SessionError> {
    let response =
        FsapiResponse::parse(body).map_err(|e| SessionError::Unknown(e.to_string()))?;
    response
        .session_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| SessionError::Unknown(format!("no sessionId, status {}", response.status)))
}
