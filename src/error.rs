// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `fsapi_lib` library.
//!
//! This module provides the error hierarchy for handling failures across the
//! library: value validation, transport communication, XML parsing, session
//! management and state store access.
//!
//! A device answering with a non-`FS_OK` status is *not* an error: it is a
//! failed [`CommandResult`](crate::response::CommandResult) that callers
//! inspect like any other outcome.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred during transport communication.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while parsing a response.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Creating a session with the device failed.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// The state store rejected a read or write.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// No session is currently connected.
    #[error("device is not connected")]
    NotConnected,

    /// A write was requested for a path the dispatcher does not handle.
    #[error("no command is mapped to state path {0}")]
    UnknownPath(String),
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// The PIN is not exactly four decimal digits.
    #[error("PIN {0:?} is not valid, expected four decimal digits (default is 1234)")]
    InvalidPin(String),

    /// The device address is not a dotted IPv4 address.
    #[error("device IP {0:?} is not valid, expected e.g. 192.168.123.123")]
    InvalidAddress(String),

    /// A volume outside the range reported by the device.
    #[error("volume {actual} is out of range [0, {max}]")]
    VolumeOutOfRange {
        /// Maximum volume reported by the device.
        max: u8,
        /// The requested volume.
        actual: i64,
    },

    /// A protocol or state value did not have the expected type.
    #[error("expected {expected} value, got {actual}")]
    UnexpectedType {
        /// The type the caller expected.
        expected: &'static str,
        /// The type that was found.
        actual: String,
    },
}

/// Errors related to transport communication with the device.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed for a reason other than reachability.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The device answered with a non-success HTTP status.
    #[error("HTTP status {0}")]
    Status(u16),

    /// The device could not be reached (timeout, reset, host unreachable).
    #[error("device unreachable: {0}")]
    Unreachable(String),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

impl ProtocolError {
    /// Returns true if this failure means the device is not reachable.
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }

    /// Returns the HTTP status code carried by this failure, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status(code) => Some(*code),
            _ => None,
        }
    }
}

/// Errors related to parsing device responses.
#[derive(Debug, Error)]
pub enum ParseError {
    /// XML deserialization failed.
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::DeError),

    /// Expected field is missing from the response.
    #[error("missing field in response: {0}")]
    MissingField(String),

    /// Unexpected response format.
    #[error("unexpected response format: {0}")]
    UnexpectedFormat(String),

    /// Failed to parse a specific value.
    #[error("failed to parse {field}: {message}")]
    InvalidValue {
        /// The field that failed to parse.
        field: String,
        /// Description of the parsing failure.
        message: String,
    },
}

/// Failures of a session creation attempt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The device rejected the PIN (HTTP 403).
    #[error("PIN mismatch - enter the PIN set on your device. Default is 1234")]
    PinMismatch,

    /// The device rejected the request (HTTP 404).
    #[error("session ID mismatch or invalid command")]
    InvalidRequest,

    /// The device could not be reached.
    #[error("device unreachable")]
    Unreachable,

    /// Any other failure.
    #[error("unknown session error: {0}")]
    Unknown(String),
}

impl SessionError {
    /// Returns true if the failure ends the creation attempt without retry.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Unreachable)
    }
}

impl From<&ProtocolError> for SessionError {
    fn from(err: &ProtocolError) -> Self {
        match err {
            ProtocolError::Status(403) => Self::PinMismatch,
            ProtocolError::Status(404) => Self::InvalidRequest,
            ProtocolError::Unreachable(_) => Self::Unreachable,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Error reported by a [`StateStore`](crate::store::StateStore) implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("cannot write {path}: {message}")]
pub struct StoreError {
    /// The state path that was written.
    pub path: String,
    /// Description of the failure.
    pub message: String,
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
