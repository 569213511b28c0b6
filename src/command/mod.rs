// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! FSAPI request definitions.
//!
//! A [`Request`] names a device node and selects one of four request modes.
//! The mode decides which endpoint the URL is built for:
//!
//! | Mode | Endpoint |
//! |------|----------|
//! | [`RequestMode::Notify`] | `GET_NOTIFIES` (long-poll) |
//! | [`RequestMode::List`] | `LIST_GET_NEXT/{node}/{start}` |
//! | [`RequestMode::Set`] | `SET/{node}?value=...` |
//! | [`RequestMode::Get`] | `GET/{node}` |
//!
//! # Examples
//!
//! ```
//! use fsapi_lib::command::{Request, RequestMode};
//!
//! let req = Request::get("/fsapi/GET/netRemote.sys.power");
//! assert_eq!(req.command(), "netRemote.sys.power");
//! assert_eq!(req.mode(), RequestMode::Get);
//!
//! let url = req.url("http://192.168.1.40/fsapi", "1234", "42");
//! assert_eq!(
//!     url,
//!     "http://192.168.1.40/fsapi/GET/netRemote.sys.power?pin=1234&sid=42"
//! );
//! ```

pub mod nodes;

/// Start index meaning "no list request".
pub const NO_LIST_START: i32 = -65535;

/// The endpoint a request is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestMode {
    /// Long-poll for change notifications.
    Notify,
    /// Paginated list retrieval.
    List,
    /// Write a node value.
    Set,
    /// Read a node value.
    Get,
}

/// Pagination of a list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListRange {
    /// Key after which items are returned, `-1` for the first page.
    pub start: i32,
    /// Maximum number of items returned.
    pub max_items: u32,
}

/// One FSAPI request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    command: String,
    value: Option<String>,
    list: Option<ListRange>,
    notify: bool,
}

impl Request {
    /// Creates a request; the command name is normalized.
    ///
    /// The mode is chosen by priority: notify first, then list if `list`
    /// has a start above [`NO_LIST_START`], then set if `value` is
    /// non-empty, otherwise get.
    #[must_use]
    pub fn new(
        command: &str,
        value: Option<String>,
        list: Option<ListRange>,
        notify: bool,
    ) -> Self {
        Self {
            command: normalize_command(command).to_string(),
            value,
            list,
            notify,
        }
    }

    /// Reads a node.
    #[must_use]
    pub fn get(command: &str) -> Self {
        Self::new(command, None, None, false)
    }

    /// Writes a node.
    #[must_use]
    pub fn set(command: &str, value: impl ToString) -> Self {
        Self::new(command, Some(value.to_string()), None, false)
    }

    /// Reads up to `max_items` list items after key `start`.
    #[must_use]
    pub fn list(command: &str, start: i32, max_items: u32) -> Self {
        Self::new(command, None, Some(ListRange { start, max_items }), false)
    }

    /// Long-polls for change notifications.
    #[must_use]
    pub fn notifies() -> Self {
        Self::new("", None, None, true)
    }

    /// Returns the normalized command name.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Returns the value of a set request.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Returns the effective mode of this request.
    #[must_use]
    pub fn mode(&self) -> RequestMode {
        if self.notify {
            RequestMode::Notify
        } else if self.active_list().is_some() {
            RequestMode::List
        } else if self.value.as_deref().is_some_and(|v| !v.is_empty()) {
            RequestMode::Set
        } else {
            RequestMode::Get
        }
    }

    fn active_list(&self) -> Option<ListRange> {
        self.list.filter(|l| l.start > NO_LIST_START)
    }

    /// Builds the request URL against an FSAPI base URL.
    #[must_use]
    pub fn url(&self, base: &str, pin: &str, sid: &str) -> String {
        let cmd = &self.command;
        match self.mode() {
            RequestMode::Notify => format!("{base}/GET_NOTIFIES?pin={pin}&sid={sid}"),
            RequestMode::List => {
                let ListRange { start, max_items } = self.active_list().unwrap_or(ListRange {
                    start: -1,
                    max_items: 0,
                });
                format!(
                    "{base}/LIST_GET_NEXT/{cmd}/{start}?pin={pin}&sid={sid}&maxItems={max_items}"
                )
            }
            RequestMode::Set => {
                let value = urlencoding::encode(self.value.as_deref().unwrap_or_default());
                format!("{base}/SET/{cmd}?pin={pin}&sid={sid}&value={value}")
            }
            RequestMode::Get => format!("{base}/GET/{cmd}?pin={pin}&sid={sid}"),
        }
    }
}

/// Builds the `CREATE_SESSION` URL.
#[must_use]
pub fn create_session_url(base: &str, pin: &str) -> String {
    format!("{base}/CREATE_SESSION?pin={pin}")
}

/// Strips the path prefixes some callers include in node names.
///
/// Applied in order, each case-insensitively: `/FSAPI`, then `/GET/` or
/// `/SET/`, then `/LIST_GET_NEXT/`.
///
/// Prefixes are matched by name, not by a fixed character count: the `/`
/// following `/LIST_GET_NEXT` is removed as well, and `/GET` directly
/// followed by the node name keeps the whole node name.
///
/// ```
/// use fsapi_lib::command::normalize_command;
///
/// assert_eq!(normalize_command("/FSAPI/GET/netRemote.sys.power"), "netRemote.sys.power");
/// assert_eq!(normalize_command("/set/netRemote.sys.mode"), "netRemote.sys.mode");
/// assert_eq!(normalize_command("netRemote.sys.mode"), "netRemote.sys.mode");
/// ```
#[must_use]
pub fn normalize_command(command: &str) -> &str {
    let mut cmd = strip_prefix_ignore_case(command, "/FSAPI").unwrap_or(command);
    if let Some(rest) = strip_prefix_ignore_case(cmd, "/GET")
        .or_else(|| strip_prefix_ignore_case(cmd, "/SET"))
    {
        cmd = rest.strip_prefix('/').unwrap_or(rest);
    }
    if let Some(rest) = strip_prefix_ignore_case(cmd, "/LIST_GET_NEXT") {
        cmd = rest.strip_prefix('/').unwrap_or(rest);
    }
    cmd
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}
