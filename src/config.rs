// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device configuration.

use std::net::Ipv4Addr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, ParseError, ValueError};
use crate::types::Pin;

/// Number of immediate session creation retries before backing off.
pub const SESSION_RETRIES: u32 = 3;

/// Configuration of one FSAPI device.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use fsapi_lib::config::DeviceConfig;
/// use fsapi_lib::types::Pin;
///
/// let config = DeviceConfig::new("192.168.1.40")?
///     .with_pin(Pin::new("4711")?)
///     .with_poll_interval(Duration::from_secs(2))
///     .with_diagnostics(true);
///
/// assert_eq!(config.pin.as_str(), "4711");
/// assert_eq!(config.session_renewal, Duration::from_secs(15 * 60));
/// # Ok::<(), fsapi_lib::error::ValueError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// IPv4 address of the device.
    pub ip: Ipv4Addr,
    /// PIN used for every request.
    pub pin: Pin,
    /// Delay between two notification polls.
    pub poll_interval: Duration,
    /// Age after which a session is renewed before the next call.
    pub session_renewal: Duration,
    /// Enables the `debug.*` diagnostic state and the manual session reset.
    pub diagnostics: bool,
    /// Enables the DAB wake-up workaround after power on.
    pub dab_wakeup_workaround: bool,
}

impl DeviceConfig {
    /// Default poll interval.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
    /// Default session renewal interval.
    pub const DEFAULT_SESSION_RENEWAL: Duration = Duration::from_secs(15 * 60);

    /// Creates a configuration with defaults for the device at `ip`.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidAddress` unless `ip` is a dotted IPv4
    /// address.
    pub fn new(ip: &str) -> Result<Self, ValueError> {
        let ip = ip
            .trim()
            .parse()
            .map_err(|_| ValueError::InvalidAddress(ip.to_string()))?;
        Ok(Self {
            ip,
            pin: Pin::default(),
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            session_renewal: Self::DEFAULT_SESSION_RENEWAL,
            diagnostics: false,
            dab_wakeup_workaround: false,
        })
    }

    /// Loads a configuration from JSON.
    ///
    /// ```
    /// use fsapi_lib::config::DeviceConfig;
    ///
    /// let config = DeviceConfig::from_json(
    ///     r#"{ "ip": "10.0.0.7", "pin": "0000", "pollIntervalSecs": 3 }"#,
    /// )?;
    /// assert_eq!(config.poll_interval.as_secs(), 3);
    /// # Ok::<(), fsapi_lib::Error>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `Error::Parse` for malformed JSON and `Error::Value` for an
    /// invalid IP or PIN.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let raw: RawConfig = serde_json::from_str(json).map_err(|e| ParseError::InvalidValue {
            field: "config".to_string(),
            message: e.to_string(),
        })?;

        let mut config = Self::new(&raw.ip)?.with_pin(Pin::new(raw.pin)?);
        if let Some(secs) = raw.poll_interval_secs {
            config = config.with_poll_interval(Duration::from_secs(secs));
        }
        if let Some(minutes) = raw.session_renewal_minutes {
            config = config.with_session_renewal(Duration::from_secs(minutes * 60));
        }
        Ok(config
            .with_diagnostics(raw.diagnostics)
            .with_dab_wakeup_workaround(raw.dab_wakeup_workaround))
    }

    /// Sets the PIN.
    #[must_use]
    pub fn with_pin(mut self, pin: Pin) -> Self {
        self.pin = pin;
        self
    }

    /// Sets the poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the session renewal interval.
    #[must_use]
    pub fn with_session_renewal(mut self, interval: Duration) -> Self {
        self.session_renewal = interval;
        self
    }

    /// Enables or disables diagnostics.
    #[must_use]
    pub fn with_diagnostics(mut self, enabled: bool) -> Self {
        self.diagnostics = enabled;
        self
    }

    /// Enables or disables the DAB wake-up workaround.
    #[must_use]
    pub fn with_dab_wakeup_workaround(mut self, enabled: bool) -> Self {
        self.dab_wakeup_workaround = enabled;
        self
    }

    /// Returns the URL of the device descriptor.
    #[must_use]
    pub fn descriptor_url(&self) -> String {
        format!("http://{}/device", self.ip)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    ip: String,
    #[serde(default = "default_pin")]
    pin: String,
    #[serde(default)]
    poll_interval_secs: Option<u64>,
    #[serde(default)]
    session_renewal_minutes: Option<u64>,
    #[serde(default)]
    diagnostics: bool,
    #[serde(default)]
    dab_wakeup_workaround: bool,
}

fn default_pin() -> String {
    Pin::default().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = DeviceConfig::new("192.168.1.40").unwrap();
        assert_eq!(config.ip, Ipv4Addr::new(192, 168, 1, 40));
        assert_eq!(config.pin.as_str(), "1234");
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.session_renewal, Duration::from_secs(900));
        assert!(!config.diagnostics);
        assert!(!config.dab_wakeup_workaround);
        assert_eq!(config.descriptor_url(), "http://192.168.1.40/device");
    }

    #[test]
    fn rejects_invalid_ip() {
        assert_eq!(
            DeviceConfig::new("radio.local"),
            Err(ValueError::InvalidAddress("radio.local".to_string()))
        );
        assert!(DeviceConfig::new("192.168.1.256").is_err());
    }

    #[test]
    fn from_json_full() {
        let config = DeviceConfig::from_json(
            r#"{
                "ip": "10.0.0.7",
                "pin": "4711",
                "pollIntervalSecs": 2,
                "sessionRenewalMinutes": 5,
                "diagnostics": true,
                "dabWakeupWorkaround": true
            }"#,
        )
        .unwrap();
        assert_eq!(config.pin.as_str(), "4711");
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.session_renewal, Duration::from_secs(300));
        assert!(config.diagnostics);
        assert!(config.dab_wakeup_workaround);
    }

    #[test]
    fn from_json_defaults() {
        let config = DeviceConfig::from_json(r#"{ "ip": "10.0.0.7" }"#).unwrap();
        assert_eq!(config, DeviceConfig::new("10.0.0.7").unwrap());
    }

    #[test]
    fn from_json_validates_pin() {
        let err = DeviceConfig::from_json(r#"{ "ip": "10.0.0.7", "pin": "12" }"#).unwrap_err();
        assert!(matches!(err, Error::Value(ValueError::InvalidPin(_))));
    }

    #[test]
    fn from_json_malformed() {
        let err = DeviceConfig::from_json("{ ip: ").unwrap_err();
        assert!(matches!(err, Error::Parse(ParseError::InvalidValue { .. })));
    }
}
