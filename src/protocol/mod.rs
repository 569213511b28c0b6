// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transport layer for talking to FSAPI devices.
//!
//! Every FSAPI operation is a plain HTTP `GET` whose answer is an XML
//! document, so the transport seam is a single operation: fetch a URL and
//! return the body. [`HttpClient`] implements it on top of `reqwest`; the
//! engine is generic over [`Transport`] so it can be driven by other
//! implementations.

mod http;

use std::future::Future;

pub use http::{HttpClient, HttpConfig};

use crate::error::ProtocolError;

/// A transport able to fetch a device URL.
///
/// Implementations must map failures as follows:
///
/// - the device answered with a non-success HTTP status:
///   [`ProtocolError::Status`] carrying the code,
/// - the device could not be reached (timeout, connection refused or
///   reset, host unreachable): [`ProtocolError::Unreachable`],
/// - anything else: any other variant.
pub trait Transport: Send + Sync + 'static {
    /// Issues a `GET` request and returns the response body.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the request fails or the status is not a
    /// success.
    fn get(&self, url: &str) -> impl Future<Output = Result<String, ProtocolError>> + Send;
}

#[cfg(test)]
pub(crate) mod scripted {
    //! In-memory transport answering from a script of canned replies.

    use std::collections::VecDeque;
    use std::future::Future;
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::Transport;
    use crate::error::ProtocolError;

    type Reply = Result<String, ProtocolError>;

    #[derive(Default)]
    struct Script {
        rules: Vec<(String, VecDeque<Reply>, Option<fn() -> Reply>)>,
        requests: Vec<String>,
    }

    /// Transport that matches URLs by substring and replays queued replies.
    ///
    /// When a rule's queue runs dry its fallback reply is used; a request no
    /// rule matches fails with HTTP 404.
    #[derive(Clone, Default)]
    pub(crate) struct ScriptedTransport {
        script: Arc<Mutex<Script>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        /// Queues one reply for URLs containing `pattern`.
        pub(crate) fn push(&self, pattern: &str, reply: Reply) -> &Self {
            let mut script = self.script.lock();
            if let Some(rule) = script.rules.iter_mut().find(|r| r.0 == pattern) {
                rule.1.push_back(reply);
            } else {
                script
                    .rules
                    .push((pattern.to_string(), VecDeque::from([reply]), None));
            }
            self
        }

        /// Sets the reply used for `pattern` once its queue is empty.
        pub(crate) fn always(&self, pattern: &str, reply: fn() -> Reply) -> &Self {
            let mut script = self.script.lock();
            if let Some(rule) = script.rules.iter_mut().find(|r| r.0 == pattern) {
                rule.2 = Some(reply);
            } else {
                script
                    .rules
                    .push((pattern.to_string(), VecDeque::new(), Some(reply)));
            }
            self
        }

        /// Returns every URL requested so far.
        pub(crate) fn requests(&self) -> Vec<String> {
            self.script.lock().requests.clone()
        }

        /// Returns how many requested URLs contain `pattern`.
        pub(crate) fn count(&self, pattern: &str) -> usize {
            self.script
                .lock()
                .requests
                .iter()
                .filter(|u| u.contains(pattern))
                .count()
        }
    }

    impl Transport for ScriptedTransport {
        fn get(&self, url: &str) -> impl Future<Output = Reply> + Send {
            let reply = {
                let mut script = self.script.lock();
                script.requests.push(url.to_string());
                script
                    .rules
                    .iter_mut()
                    .find(|r| url.contains(r.0.as_str()))
                    .map_or(Err(ProtocolError::Status(404)), |rule| {
                        rule.1
                            .pop_front()
                            .or_else(|| rule.2.map(|f| f()))
                            .unwrap_or(Err(ProtocolError::Status(404)))
                    })
            };
            async move {
                tokio::task::yield_now().await;
                reply
            }
        }
    }

    pub(crate) fn ok(body: &str) -> Reply {
        Ok(body.to_string())
    }

    pub(crate) fn unreachable() -> Reply {
        Err(ProtocolError::Unreachable("connect timed out".to_string()))
    }

    pub(crate) fn session(id: &str) -> Reply {
        ok(&format!(
            "<fsapiResponse><status>FS_OK</status><sessionId>{id}</sessionId></fsapiResponse>"
        ))
    }

    pub(crate) fn u8_value(v: u8) -> Reply {
        ok(&format!(
            "<fsapiResponse><status>FS_OK</status><value><u8>{v}</u8></value></fsapiResponse>"
        ))
    }

    pub(crate) fn u32_value(v: u32) -> Reply {
        ok(&format!(
            "<fsapiResponse><status>FS_OK</status><value><u32>{v}</u32></value></fsapiResponse>"
        ))
    }

    pub(crate) fn text_value(v: &str) -> Reply {
        ok(&format!(
            "<fsapiResponse><status>FS_OK</status><value><c8_array>{v}</c8_array></value></fsapiResponse>"
        ))
    }

    pub(crate) fn fs_ok() -> Reply {
        ok("<fsapiResponse><status>FS_OK</status></fsapiResponse>")
    }

    pub(crate) fn fs_timeout() -> Reply {
        ok("<fsapiResponse><status>FS_TIMEOUT</status></fsapiResponse>")
    }
}
