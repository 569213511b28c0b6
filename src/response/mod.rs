// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Response parsing for FSAPI XML envelopes.
//!
//! Every FSAPI call answers with an `fsapiResponse` document:
//!
//! ```xml
//! <fsapiResponse>
//!   <status>FS_OK</status>
//!   <value><u8>23</u8></value>
//! </fsapiResponse>
//! ```
//!
//! Depending on the call the envelope carries a `sessionId`, a single
//! `value`, a list of `item` elements or a list of `notify` elements.
//! [`CommandResult`] wraps a parsed envelope together with the outcome of
//! the call.

mod descriptor;

pub use descriptor::DeviceDescriptor;

use serde::Deserialize;

use crate::error::ParseError;
use crate::types::FsValue;

/// Status string of a successful call.
pub const STATUS_OK: &str = "FS_OK";

/// A parsed `fsapiResponse` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct FsapiResponse {
    /// Status string, [`STATUS_OK`] on success.
    pub status: String,

    /// Session token returned by `CREATE_SESSION`.
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<String>,

    #[serde(default)]
    value: Option<ValueElement>,

    /// Items returned by `LIST_GET_NEXT`.
    #[serde(rename = "item", default)]
    pub items: Vec<ListItem>,

    /// Change records returned by `GET_NOTIFIES`.
    #[serde(rename = "notify", default)]
    pub notifications: Vec<Notification>,
}

impl FsapiResponse {
    /// Parses an envelope from its XML text.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Xml` if the document is not a valid envelope.
    pub fn parse(xml: &str) -> Result<Self, ParseError> {
        quick_xml::de::from_str(xml).map_err(ParseError::from)
    }

    /// Returns true if the status is [`STATUS_OK`].
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status.trim() == STATUS_OK
    }

    /// Returns the single value of a `GET` response.
    #[must_use]
    pub fn value(&self) -> Option<&FsValue> {
        self.value.as_ref().map(|v| &v.inner)
    }
}

/// `<value>` wrapper around a typed scalar.
#[derive(Debug, Clone, Deserialize)]
struct ValueElement {
    #[serde(rename = "$value")]
    inner: FsValue,
}

/// One element of a `LIST_GET_NEXT` response.
///
/// ```xml
/// <item key="0">
///   <field name="id"><c8_array>IR</c8_array></field>
///   <field name="label"><c8_array>Internet radio</c8_array></field>
/// </item>
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ListItem {
    /// Position of the item in the list.
    #[serde(rename = "@key")]
    pub key: i64,

    #[serde(rename = "field", default)]
    fields: Vec<Field>,
}

impl ListItem {
    /// Returns the value of the named field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FsValue> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.value)
    }

    /// Returns the trimmed text of a `c8_array` field.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(|v| v.as_text().ok())
    }
}

#[derive(Debug, Clone, Deserialize)]
struct Field {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "$value")]
    value: FsValue,
}

/// One change record of a `GET_NOTIFIES` response.
///
/// ```xml
/// <notify node="netremote.sys.audio.volume"><value><u8>23</u8></value></notify>
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Notification {
    /// Dotted node name, compared case-insensitively.
    #[serde(rename = "@node")]
    pub node: String,

    #[serde(default)]
    value: Option<ValueElement>,
}

impl Notification {
    /// Returns the reported value.
    #[must_use]
    pub fn value(&self) -> Option<&FsValue> {
        self.value.as_ref().map(|v| &v.inner)
    }
}

// ============================================================================
// CommandResult
// ============================================================================

/// Why a call did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// No session is connected, no request was made.
    NotConnected,
    /// The device answered with a status other than `FS_OK`.
    Status(String),
    /// The request failed at the transport level.
    Transport(String),
    /// The answer was not a valid envelope.
    Parse(String),
}

/// The outcome of one FSAPI call.
///
/// A payload is only available on success, so a failed call can never be
/// mistaken for an empty answer.
#[derive(Debug, Clone)]
pub enum CommandResult {
    /// The device answered `FS_OK`.
    Success(FsapiResponse),
    /// The call failed.
    Failed(Failure),
}

impl CommandResult {
    /// Builds a result from a parsed envelope.
    #[must_use]
    pub fn from_response(response: FsapiResponse) -> Self {
        if response.is_ok() {
            Self::Success(response)
        } else {
            Self::Failed(Failure::Status(response.status))
        }
    }

    /// Returns true if the device answered `FS_OK`.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns the envelope of a successful call.
    #[must_use]
    pub fn payload(&self) -> Option<&FsapiResponse> {
        match self {
            Self::Success(response) => Some(response),
            Self::Failed(_) => None,
        }
    }

    /// Returns the failure reason of a failed call.
    #[must_use]
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Success(_) => None,
            Self::Failed(failure) => Some(failure),
        }
    }

    /// Returns the single value of a successful `GET`.
    #[must_use]
    pub fn value(&self) -> Option<&FsValue> {
        self.payload().and_then(FsapiResponse::value)
    }

    /// Returns the list items of a successful `LIST_GET_NEXT`.
    #[must_use]
    pub fn items(&self) -> &[ListItem] {
        self.payload().map_or(&[], |r| r.items.as_slice())
    }

    /// Returns the change records of a successful `GET_NOTIFIES`.
    #[must_use]
    pub fn notifications(&self) -> &[Notification] {
        self.payload().map_or(&[], |r| r.notifications.as_slice())
    }
}
