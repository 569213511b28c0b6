// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device PIN type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// The four digit PIN that authorises FSAPI requests.
///
/// The PIN is set on the device itself (menu "Network > NetRemote PIN"),
/// factory default is `1234`.
///
/// # Examples
///
/// ```
/// use fsapi_lib::types::Pin;
///
/// let pin = Pin::new("4711").unwrap();
/// assert_eq!(pin.as_str(), "4711");
///
/// assert!(Pin::new("12a4").is_err());
/// assert!(Pin::new("12345").is_err());
/// assert_eq!(Pin::default().as_str(), "1234");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pin(String);

impl Pin {
    /// Number of digits of a valid PIN.
    pub const LEN: usize = 4;

    /// Creates a PIN after validating its format.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidPin` unless the input is exactly four
    /// ASCII digits.
    pub fn new(pin: impl Into<String>) -> Result<Self, ValueError> {
        let pin = pin.into();
        if pin.len() == Self::LEN && pin.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(pin))
        } else {
            Err(ValueError::InvalidPin(pin))
        }
    }

    /// Returns the PIN as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Pin {
    fn default() -> Self {
        Self("1234".to_string())
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Pin {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Pin {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Pin> for String {
    fn from(pin: Pin) -> Self {
        pin.0
    }
}
