// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP transport for FSAPI devices.

use std::error::Error as StdError;
use std::future::Future;
use std::io;
use std::time::Duration;

use reqwest::Client;

use crate::error::ProtocolError;
use crate::protocol::Transport;

// ============================================================================
// HttpConfig - Configuration of the HTTP transport
// ============================================================================

/// Configuration for the HTTP transport.
///
/// FSAPI is stateless at the HTTP level: every call is an independent `GET`
/// and the session is carried in the query string.
///
/// # Examples
///
/// ```
/// use fsapi_lib::protocol::HttpConfig;
/// use std::time::Duration;
///
/// let config = HttpConfig::new().with_timeout(Duration::from_secs(5));
/// assert_eq!(config.timeout(), Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    timeout: Duration,
    connect_timeout: Duration,
}

impl HttpConfig {
    /// Default request timeout.
    ///
    /// Must exceed the time the device holds a `GET_NOTIFIES` long-poll open.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
    /// Default connect timeout.
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Creates a configuration with default timeouts.
    #[must_use]
    pub fn new() -> Self {
        Self {
            timeout: Self::DEFAULT_TIMEOUT,
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the connect timeout.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Creates an `HttpClient` from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn into_client(self) -> Result<HttpClient, ProtocolError> {
        let client = Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .build()
            .map_err(ProtocolError::Http)?;

        Ok(HttpClient { client })
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// HttpClient - reqwest backed transport
// ============================================================================

/// HTTP transport backed by `reqwest`.
///
/// # Examples
///
/// ```no_run
/// use fsapi_lib::protocol::{HttpClient, Transport};
///
/// # async fn example() -> Result<(), fsapi_lib::error::ProtocolError> {
/// let client = HttpClient::new()?;
/// let body = client.get("http://192.168.1.40/device").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a transport with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new() -> Result<Self, ProtocolError> {
        HttpConfig::new().into_client()
    }

    async fn fetch(&self, url: &str) -> Result<String, ProtocolError> {
        tracing::debug!(url = %url, "Sending FSAPI request");

        let response = self.client.get(url).send().await.map_err(classify)?;

        if !response.status().is_success() {
            return Err(ProtocolError::Status(response.status().as_u16()));
        }

        let body = response.text().await.map_err(classify)?;

        tracing::debug!(body = %body, "Received FSAPI response");

        Ok(body)
    }
}

impl Transport for HttpClient {
    fn get(&self, url: &str) -> impl Future<Output = Result<String, ProtocolError>> + Send {
        self.fetch(url)
    }
}

/// Sorts a `reqwest` failure into unreachable or generic HTTP failure.
fn classify(err: reqwest::Error) -> ProtocolError {
    if err.is_timeout() || err.is_connect() || has_unreachable_io_source(&err) {
        ProtocolError::Unreachable(err.to_string())
    } else {
        ProtocolError::Http(err)
    }
}

fn has_unreachable_io_source(err: &reqwest::Error) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<io::Error>()
            && is_unreachable_kind(io_err.kind())
        {
            return true;
        }
        source = cause.source();
    }
    false
}

fn is_unreachable_kind(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::TimedOut
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::HostUnreachable
            | io::ErrorKind::NetworkUnreachable
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof
    )
}
