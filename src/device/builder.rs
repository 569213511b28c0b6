// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device builder.

use std::sync::Arc;

use crate::config::DeviceConfig;
use crate::device::FsapiDevice;
use crate::error::{Error, ProtocolError};
use crate::protocol::{HttpClient, HttpConfig, Transport};
use crate::store::{MemoryStore, StateStore};

/// Something a transport can be made from.
///
/// Implemented for [`HttpConfig`], which builds an [`HttpClient`], and for
/// every ready [`Transport`].
pub trait TransportSource {
    /// The transport produced.
    type Transport: Transport;

    /// Builds the transport.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the transport cannot be created.
    fn into_transport(self) -> Result<Self::Transport, ProtocolError>;
}

impl TransportSource for HttpConfig {
    type Transport = HttpClient;

    fn into_transport(self) -> Result<HttpClient, ProtocolError> {
        self.into_client()
    }
}

impl<T: Transport> TransportSource for T {
    type Transport = T;

    fn into_transport(self) -> Result<T, ProtocolError> {
        Ok(self)
    }
}

/// Builder for [`FsapiDevice`].
///
/// # Examples
///
/// ```no_run
/// use fsapi_lib::FsapiDevice;
/// use fsapi_lib::config::DeviceConfig;
/// use fsapi_lib::store::MemoryStore;
///
/// # async fn example() -> fsapi_lib::Result<()> {
/// let store = MemoryStore::new();
/// let device = FsapiDevice::builder(DeviceConfig::new("192.168.1.40")?)
///     .with_store(store.clone())
///     .build()?;
///
/// device.connect().await?;
/// # Ok(())
/// # }
/// ```
pub struct DeviceBuilder<S = HttpConfig> {
    config: DeviceConfig,
    source: S,
    store: Option<Arc<dyn StateStore>>,
    base_url: Option<String>,
    discovery: bool,
}

impl DeviceBuilder<HttpConfig> {
    pub(crate) fn new(config: DeviceConfig) -> Self {
        Self {
            config,
            source: HttpConfig::new(),
            store: None,
            base_url: None,
            discovery: true,
        }
    }

    /// Sets the HTTP timeouts.
    #[must_use]
    pub fn with_http_config(mut self, http: HttpConfig) -> Self {
        self.source = http;
        self
    }
}

impl<S: TransportSource> DeviceBuilder<S> {
    /// Uses `store` instead of a fresh [`MemoryStore`].
    #[must_use]
    pub fn with_store(mut self, store: impl StateStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Talks to the device through `transport`.
    #[must_use]
    pub fn with_transport<T: Transport>(self, transport: T) -> DeviceBuilder<T> {
        DeviceBuilder {
            config: self.config,
            source: transport,
            store: self.store,
            base_url: self.base_url,
            discovery: self.discovery,
        }
    }

    /// Uses `url` as FSAPI base URL and skips the descriptor fetch.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Skips feature discovery, the initial state read and the preset scan
    /// on connect.
    #[must_use]
    pub fn without_discovery(mut self) -> Self {
        self.discovery = false;
        self
    }

    /// Builds the device. Nothing is sent until
    /// [`connect`](FsapiDevice::connect).
    ///
    /// # Errors
    ///
    /// Returns `Error::Protocol` if the transport cannot be created.
    pub fn build(self) -> Result<FsapiDevice<S::Transport>, Error> {
        let transport = self.source.into_transport()?;
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()));
        Ok(FsapiDevice::new(
            self.config,
            transport,
            store,
            self.base_url,
            self.discovery,
        ))
    }
}
