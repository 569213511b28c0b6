// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Key/value state store the engine mirrors device state into.
//!
//! The engine never keeps device state of its own: every observed value is
//! written to a [`StateStore`] under a dotted path (see [`paths`]), and
//! handlers read back what they need. Writes carry an acknowledgement flag,
//! `true` when the value was confirmed by the device.
//!
//! [`MemoryStore`] is the default implementation. It keeps the latest value
//! per path and broadcasts every write on an [`EventBus`].
//!
//! # Examples
//!
//! ```
//! use fsapi_lib::store::{MemoryStore, StateStore, StateValue};
//!
//! let store = MemoryStore::new();
//! store.write("audio.volume", StateValue::from(12u8), true).unwrap();
//! assert_eq!(store.read("audio.volume"), Some(StateValue::Number(12)));
//! ```

mod event_bus;
mod memory;
pub mod paths;

pub use event_bus::EventBus;
pub use memory::MemoryStore;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A value held by the state store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    /// No value.
    Null,
    /// A flag.
    Bool(bool),
    /// An integer.
    Number(i64),
    /// A string.
    Text(String),
}

impl StateValue {
    /// Returns the flag value, accepting `0`/`1` numbers as well.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Number(0) => Some(false),
            Self::Number(1) => Some(true),
            _ => None,
        }
    }

    /// Returns the integer value, parsing numeric text as well.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Returns the text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true for [`StateValue::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for StateValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for StateValue {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<u8> for StateValue {
    fn from(value: u8) -> Self {
        Self::Number(i64::from(value))
    }
}

impl From<u32> for StateValue {
    fn from(value: u32) -> Self {
        Self::Number(i64::from(value))
    }
}

impl From<&str> for StateValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for StateValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<StateValue>> From<Option<T>> for StateValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// A write observed on a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateEvent {
    /// The written path.
    pub path: String,
    /// The written value.
    pub value: StateValue,
    /// Whether the value was confirmed by the device.
    pub ack: bool,
}

/// A key/value state store.
///
/// Implementations must be cheap to call; the engine writes from within its
/// poll cycle.
pub trait StateStore: Send + Sync {
    /// Returns the current value at `path`, if any.
    fn read(&self, path: &str) -> Option<StateValue>;

    /// Stores `value` at `path`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store rejects the write.
    fn write(&self, path: &str, value: StateValue, ack: bool) -> Result<(), StoreError>;
}
