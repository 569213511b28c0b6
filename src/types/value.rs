// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed scalar values carried by FSAPI responses.

use std::fmt;

use serde::Deserialize;

use crate::error::ValueError;

/// A typed scalar as sent by the device.
///
/// FSAPI wraps every value in an element naming its type, for example
/// `<value><u8>23</u8></value>` or `<c8_array>Radio 1</c8_array>`. The type
/// of each node is fixed by the protocol.
///
/// # Examples
///
/// ```
/// use fsapi_lib::types::FsValue;
///
/// let volume = FsValue::U8(23);
/// assert_eq!(volume.as_u8().unwrap(), 23);
/// assert!(volume.as_text().is_err());
///
/// let name = FsValue::C8Array("  Radio 1 ".to_string());
/// assert_eq!(name.as_text().unwrap(), "Radio 1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub enum FsValue {
    /// Unsigned 8-bit integer.
    #[serde(rename = "u8")]
    U8(u8),
    /// Unsigned 16-bit integer.
    #[serde(rename = "u16")]
    U16(u16),
    /// Unsigned 32-bit integer.
    #[serde(rename = "u32")]
    U32(u32),
    /// Signed 8-bit integer.
    #[serde(rename = "s8")]
    S8(i8),
    /// Signed 16-bit integer.
    #[serde(rename = "s16")]
    S16(i16),
    /// Signed 32-bit integer.
    #[serde(rename = "s32")]
    S32(i32),
    /// Character array (string).
    #[serde(rename = "c8_array")]
    C8Array(String),
}

impl FsValue {
    /// Returns the protocol name of the value type.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::U8(_) => "u8",
            Self::U16(_) => "u16",
            Self::U32(_) => "u32",
            Self::S8(_) => "s8",
            Self::S16(_) => "s16",
            Self::S32(_) => "s32",
            Self::C8Array(_) => "c8_array",
        }
    }

    /// Returns the value of a `u8` element.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::UnexpectedType` for any other element type.
    pub fn as_u8(&self) -> Result<u8, ValueError> {
        match self {
            Self::U8(v) => Ok(*v),
            other => Err(other.mismatch("u8")),
        }
    }

    /// Returns the value of a `u32` element.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::UnexpectedType` for any other element type.
    pub fn as_u32(&self) -> Result<u32, ValueError> {
        match self {
            Self::U32(v) => Ok(*v),
            other => Err(other.mismatch("u32")),
        }
    }

    /// Interprets a `u8` flag, where `1` means true.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::UnexpectedType` for any other element type.
    pub fn as_bool(&self) -> Result<bool, ValueError> {
        self.as_u8().map(|v| v == 1)
    }

    /// Returns the trimmed text of a `c8_array` element.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::UnexpectedType` for any other element type.
    pub fn as_text(&self) -> Result<&str, ValueError> {
        match self {
            Self::C8Array(s) => Ok(s.trim()),
            other => Err(other.mismatch("c8_array")),
        }
    }

    /// Returns any integer element widened to `i64`.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::UnexpectedType` for `c8_array` elements.
    pub fn as_i64(&self) -> Result<i64, ValueError> {
        match self {
            Self::U8(v) => Ok(i64::from(*v)),
            Self::U16(v) => Ok(i64::from(*v)),
            Self::U32(v) => Ok(i64::from(*v)),
            Self::S8(v) => Ok(i64::from(*v)),
            Self::S16(v) => Ok(i64::from(*v)),
            Self::S32(v) => Ok(i64::from(*v)),
            Self::C8Array(_) => Err(self.mismatch("integer")),
        }
    }

    fn mismatch(&self, expected: &'static str) -> ValueError {
        ValueError::UnexpectedType {
            expected,
            actual: self.type_name().to_string(),
        }
    }
}

impl fmt::Display for FsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::U8(v) => write!(f, "{v}"),
            Self::U16(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::S8(v) => write!(f, "{v}"),
            Self::S16(v) => write!(f, "{v}"),
            Self::S32(v) => write!(f, "{v}"),
            Self::C8Array(s) => f.write_str(s),
        }
    }
}
