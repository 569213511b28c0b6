// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device descriptor served at `http://{ip}/device`.

use serde::Deserialize;

use crate::error::ParseError;

/// The static `netRemote` descriptor of a device.
///
/// ```xml
/// <netRemote>
///   <friendlyName>Kitchen</friendlyName>
///   <version>ir-mmi-FS2026-0500-0549.2.5.15.EX65933-1RC2</version>
///   <webfsapi>http://192.168.1.40:80/fsapi</webfsapi>
/// </netRemote>
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceDescriptor {
    /// Name shown on the device.
    #[serde(rename = "friendlyName", default)]
    pub friendly_name: String,
    /// Firmware version string.
    #[serde(default)]
    pub version: String,
    /// Base URL of the FSAPI endpoint.
    pub webfsapi: String,
}

impl DeviceDescriptor {
    /// Parses the descriptor document.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the document is malformed or has no
    /// `webfsapi` element.
    pub fn parse(xml: &str) -> Result<Self, ParseError> {
        let descriptor: Self = quick_xml::de::from_str(xml)?;
        if descriptor.webfsapi.trim().is_empty() {
            return Err(ParseError::MissingField("webfsapi".to_string()));
        }
        Ok(descriptor)
    }

    /// Returns the FSAPI base URL without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.webfsapi.trim().trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_descriptor() {
        let xml = r"<?xml version='1.0' encoding='UTF-8'?>
            <netRemote>
                <friendlyName>Kitchen</friendlyName>
                <version>ir-mmi-FS2026-0500-0549</version>
                <webfsapi>http://192.168.1.40:80/fsapi/</webfsapi>
            </netRemote>";
        let descriptor = DeviceDescriptor::parse(xml).unwrap();
        assert_eq!(descriptor.friendly_name, "Kitchen");
        assert_eq!(descriptor.version, "ir-mmi-FS2026-0500-0549");
        assert_eq!(descriptor.base_url(), "http://192.168.1.40:80/fsapi");
    }

    #[test]
    fn missing_webfsapi_is_error() {
        let xml = "<netRemote><friendlyName>Kitchen</friendlyName></netRemote>";
        assert!(DeviceDescriptor::parse(xml).is_err());
    }

    #[test]
    fn empty_webfsapi_is_missing_field() {
        let xml = "<netRemote><webfsapi> </webfsapi></netRemote>";
        assert!(matches!(
            DeviceDescriptor::parse(xml),
            Err(ParseError::MissingField(_))
        ));
    }
}
