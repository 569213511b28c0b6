// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! High-level device handle.
//!
//! [`FsapiDevice`] wires the session manager, the command invoker, the
//! notification poller and the dispatcher to one state store:
//!
//! ```no_run
//! use fsapi_lib::FsapiDevice;
//! use fsapi_lib::config::DeviceConfig;
//! use fsapi_lib::store::{MemoryStore, StateStore, StateValue};
//!
//! # async fn example() -> fsapi_lib::Result<()> {
//! let store = MemoryStore::new();
//! let device = FsapiDevice::builder(DeviceConfig::new("192.168.1.40")?)
//!     .with_store(store.clone())
//!     .build()?;
//!
//! device.connect().await?;
//! device.write("audio.volume", StateValue::Number(12)).await?;
//! println!("{:?}", store.read("media.name"));
//!
//! device.shutdown();
//! # Ok(())
//! # }
//! ```

mod builder;

pub use builder::{DeviceBuilder, TransportSource};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use crate::command::Request;
use crate::config::DeviceConfig;
use crate::discovery::{
    DeviceProfile, discover_features, fetch_descriptor, read_all_presets, refresh_state,
};
use crate::dispatch::{Dispatcher, WriteOutcome};
use crate::error::Error;
use crate::invoker::CommandInvoker;
use crate::poller::{NotificationPoller, PollOutcome, PollTimer};
use crate::protocol::{HttpClient, HttpConfig, Transport};
use crate::response::CommandResult;
use crate::session::{Session, SessionManager, SessionPolicy, SessionState};
use crate::sleep::SleepRegistry;
use crate::store::{StateStore, StateValue};

/// A Frontier Silicon device.
///
/// Cloning is cheap; clones share the same session and poller.
pub struct FsapiDevice<P: Transport = HttpClient> {
    inner: Arc<Inner<P>>,
}

struct Inner<P> {
    config: DeviceConfig,
    store: Arc<dyn StateStore>,
    sleeps: Arc<SleepRegistry>,
    timer: Arc<PollTimer>,
    session: Arc<SessionManager<P>>,
    invoker: Arc<CommandInvoker<P>>,
    poller: Arc<NotificationPoller<P>>,
    dispatcher: Dispatcher<P>,
    base_url: Option<String>,
    discovery: bool,
    shut_down: AtomicBool,
}

impl<P: Transport> Clone for FsapiDevice<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl FsapiDevice<HttpClient> {
    /// Creates a builder for the device described by `config`.
    #[must_use]
    pub fn builder(config: DeviceConfig) -> DeviceBuilder<HttpConfig> {
        DeviceBuilder::new(config)
    }
}

impl<P: Transport> FsapiDevice<P> {
    pub(crate) fn new(
        config: DeviceConfig,
        transport: P,
        store: Arc<dyn StateStore>,
        base_url: Option<String>,
        discovery: bool,
    ) -> Self {
        let sleeps = Arc::new(SleepRegistry::new());
        let timer = Arc::new(PollTimer::new(config.poll_interval));

        let session = Arc::new(
            SessionManager::new(
                Arc::new(transport),
                config.pin.clone(),
                SessionPolicy::from_config(&config),
                Arc::clone(&store),
                Arc::clone(&sleeps),
                Arc::clone(&timer),
            )
            .with_diagnostics(config.diagnostics),
        );
        if let Some(url) = &base_url {
            session.set_base_url(url);
        }
        let invoker = Arc::new(CommandInvoker::new(Arc::clone(&session)));
        let poller = Arc::new(
            NotificationPoller::new(
                Arc::clone(&invoker),
                Arc::clone(&store),
                Arc::clone(&sleeps),
                Arc::clone(&timer),
            )
            .with_diagnostics(config.diagnostics),
        );
        let dispatcher = Dispatcher::new(
            Arc::clone(&invoker),
            Arc::clone(&poller),
            Arc::clone(&store),
            Arc::clone(&sleeps),
        )
        .with_diagnostics(config.diagnostics)
        .with_dab_wakeup_workaround(config.dab_wakeup_workaround);

        let poll_target = Arc::downgrade(&poller);
        timer.set_hook(move || spawn_tick(&poll_target));

        Self {
            inner: Arc::new(Inner {
                config,
                store,
                sleeps,
                timer,
                session,
                invoker,
                poller,
                dispatcher,
                base_url,
                discovery,
                shut_down: AtomicBool::new(false),
            }),
        }
    }

    /// Connects to the device and starts polling.
    ///
    /// Resolves the base URL from the device descriptor unless one was
    /// given, creates the first session, reads the device features, state
    /// and presets unless discovery is disabled, and schedules the first
    /// poll immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor cannot be fetched or the session
    /// cannot be created (for example `SessionError::PinMismatch`).
    pub async fn connect(&self) -> Result<(), Error> {
        let inner = &self.inner;
        if inner.shut_down.load(Ordering::SeqCst) {
            return Err(Error::NotConnected);
        }
        inner.session.mark_disconnected();

        let base_url = match &inner.base_url {
            Some(url) => url.clone(),
            None => {
                let transport = inner.session.transport();
                let descriptor =
                    fetch_descriptor(transport, &inner.config, inner.store.as_ref()).await?;
                descriptor.base_url().to_string()
            }
        };
        inner.session.set_base_url(&base_url);

        inner.session.create_session(false).await?;

        if inner.discovery
            && let Err(e) = self.discover().await
        {
            tracing::warn!(error = %e, "Device discovery incomplete");
        }

        inner.timer.arm(Duration::ZERO);
        tracing::info!(base_url = %base_url, "Device connected");
        Ok(())
    }

    async fn discover(&self) -> Result<(), Error> {
        let inner = &self.inner;
        let store = inner.store.as_ref();

        let profile = discover_features(&*inner.invoker, store).await?;
        inner.dispatcher.set_profile(profile);
        refresh_state(&*inner.invoker, store).await?;
        read_all_presets(
            &*inner.invoker,
            store,
            &inner.sleeps,
            profile.max_mode_index.unwrap_or(-1),
            false,
        )
        .await?;
        Ok(())
    }

    /// Stops polling and aborts every pending wait. Idempotent.
    pub fn shutdown(&self) {
        let inner = &self.inner;
        if inner.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        inner.sleeps.close();
        inner.timer.close();
        inner.session.mark_disconnected();
        tracing::info!("Device shut down");
    }

    /// Returns true once [`shutdown`](Self::shutdown) was called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.inner.shut_down.load(Ordering::SeqCst)
    }

    /// Sends a raw FSAPI request.
    pub async fn invoke(&self, request: &Request) -> CommandResult {
        self.inner.invoker.invoke(request).await
    }

    /// Writes a state value through to the device.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::write`].
    pub async fn write(
        &self,
        path: &str,
        value: impl Into<StateValue>,
    ) -> Result<WriteOutcome, Error> {
        self.inner.dispatcher.write(path, value.into()).await
    }

    /// Runs a poll cycle now.
    pub async fn poll_now(&self) -> PollOutcome {
        self.inner.poller.tick().await
    }

    /// Creates a new session, replacing the current one.
    ///
    /// # Errors
    ///
    /// Returns `Error::Session` if the device refuses the PIN or cannot be
    /// reached.
    pub async fn create_session(&self) -> Result<(), Error> {
        self.inner.session.create_session(false).await?;
        Ok(())
    }

    /// Returns the device configuration.
    #[must_use]
    pub fn config(&self) -> &DeviceConfig {
        &self.inner.config
    }

    /// Returns the state store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.inner.store
    }

    /// Returns the session lifecycle state.
    #[must_use]
    pub fn session_state(&self) -> SessionState {
        self.inner.session.state()
    }

    /// Returns the current session.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.inner.session.session()
    }

    /// Returns true while a session is established.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.session.is_connected()
    }

    /// Returns the capabilities found by discovery.
    #[must_use]
    pub fn profile(&self) -> DeviceProfile {
        self.inner.dispatcher.profile()
    }
}

fn spawn_tick<P: Transport>(poller: &Weak<NotificationPoller<P>>) {
    if let Some(poller) = poller.upgrade() {
        tokio::spawn(async move {
            poller.tick().await;
        });
    }
}
