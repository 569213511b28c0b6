// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session lifecycle.
//!
//! Every FSAPI call carries a session id obtained from `CREATE_SESSION`.
//! The [`SessionManager`] owns that session and its lifecycle:
//!
//! ```text
//! Unstarted -> Creating -> Active
//!                 ^  |       |
//!                 |  v       | transport failure / stale session
//!               Backoff <----+--> Creating
//! ```
//!
//! - A transport failure while creating consumes one of the fast retries
//!   and tries again immediately.
//! - Once the retries are used up the counter is reset, polling is
//!   suppressed, pending waits are cancelled and the manager sleeps a full
//!   renewal interval before trying again.
//! - HTTP 403 (PIN mismatch) and 404 end the attempt without retry.
//!
//! Creation is single-flight: concurrent callers that find the session
//! stale wait for one creation instead of racing each other.

mod manager;

pub use manager::SessionManager;

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::config::{DeviceConfig, SESSION_RETRIES};

/// An authenticated session with the device.
///
/// Sessions are never modified: every successful creation replaces the
/// current session as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
    created_at: Instant,
    created_wall: DateTime<Utc>,
}

impl Session {
    pub(crate) fn new(token: String) -> Self {
        Self {
            token,
            created_at: Instant::now(),
            created_wall: Utc::now(),
        }
    }

    /// Returns the session id sent as `sid`.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns when the session was created.
    #[must_use]
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Returns the wall clock time the session was created.
    #[must_use]
    pub fn created_wall(&self) -> DateTime<Utc> {
        self.created_wall
    }

    /// Returns the age of the session.
    #[must_use]
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}

/// Lifecycle state of the session manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No creation attempted yet.
    Unstarted,
    /// A creation attempt is running.
    Creating,
    /// A session is established.
    Active,
    /// Retries are exhausted, waiting before the next attempt.
    Backoff,
    /// The last attempt ended with a PIN or request error.
    Failed,
}

/// Retry and renewal settings of the session manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    /// Immediate retries before backing off.
    pub max_retries: u32,
    /// Age after which the session is renewed; also the backoff duration.
    pub renewal_interval: Duration,
}

impl SessionPolicy {
    /// Builds the policy from a device configuration.
    #[must_use]
    pub fn from_config(config: &DeviceConfig) -> Self {
        Self {
            max_retries: SESSION_RETRIES,
            renewal_interval: config.session_renewal,
        }
    }
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            max_retries: SESSION_RETRIES,
            renewal_interval: DeviceConfig::DEFAULT_SESSION_RENEWAL,
        }
    }
}
