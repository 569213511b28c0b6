// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command invocation against the current session.

use std::sync::Arc;

use crate::command::Request;
use crate::protocol::Transport;
use crate::response::{CommandResult, Failure, FsapiResponse};
use crate::session::SessionManager;

/// Issues FSAPI requests with the current session.
///
/// Before every call a session older than the renewal interval is renewed.
/// Calls made while disconnected fail without touching the network. A
/// transport failure marks the session disconnected and triggers one
/// recreation; its outcome is logged, never returned.
pub struct CommandInvoker<P> {
    session: Arc<SessionManager<P>>,
}

impl<P: Transport> CommandInvoker<P> {
    /// Creates an invoker on top of a session manager.
    #[must_use]
    pub fn new(session: Arc<SessionManager<P>>) -> Self {
        Self { session }
    }

    /// Returns the session manager.
    #[must_use]
    pub fn session(&self) -> &Arc<SessionManager<P>> {
        &self.session
    }

    /// Sends a request and returns its outcome.
    pub async fn invoke(&self, request: &Request) -> CommandResult {
        if let Err(e) = self.session.renew_if_stale().await {
            tracing::error!(error = %e, "Session renewal failed");
        }

        let Some(token) = self
            .session
            .token()
            .filter(|_| self.session.is_connected())
        else {
            tracing::debug!(command = %request.command(), "Not connected, skipping call");
            return CommandResult::Failed(Failure::NotConnected);
        };

        let generation = self.session.generation();
        let url = request.url(
            &self.session.base_url(),
            self.session.pin().as_str(),
            &token,
        );
        tracing::debug!(url = %url, "Calling FSAPI");

        match self.session.transport().get(&url).await {
            Ok(body) => match FsapiResponse::parse(&body) {
                Ok(response) => {
                    tracing::debug!(
                        status = %response.status,
                        command = %request.command(),
                        "FSAPI answered"
                    );
                    CommandResult::from_response(response)
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        command = %request.command(),
                        "Invalid FSAPI response"
                    );
                    CommandResult::Failed(Failure::Parse(e.to_string()))
                }
            },
            Err(err) => {
                tracing::info!(error = %err, "Session error, trying to re-establish session");
                self.session.mark_disconnected();
                if let Err(e) = self.session.recover(generation).await {
                    tracing::error!(error = %e, "Session re-establishment failed");
                }
                CommandResult::Failed(Failure::Transport(err.to_string()))
            }
        }
    }

    /// Reads a node.
    pub async fn get(&self, command: &str) -> CommandResult {
        self.invoke(&Request::get(command)).await
    }

    /// Writes a node.
    pub async fn set(&self, command: &str, value: impl ToString) -> CommandResult {
        self.invoke(&Request::set(command, value)).await
    }

    /// Reads list items.
    pub async fn list(&self, command: &str, start: i32, max_items: u32) -> CommandResult {
        self.invoke(&Request::list(command, start, max_items)).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::command::nodes;
    use crate::error::ProtocolError;
    use crate::poller::PollTimer;
    use crate::protocol::scripted::{
        ScriptedTransport, fs_timeout, session, u8_value, unreachable,
    };
    use crate::session::SessionPolicy;
    use crate::sleep::SleepRegistry;
    use crate::store::{MemoryStore, StateStore, StateValue, paths};
    use crate::types::{FsValue, Pin};

    fn invoker(
        transport: &ScriptedTransport,
        store: &MemoryStore,
    ) -> CommandInvoker<ScriptedTransport> {
        let manager = SessionManager::new(
            Arc::new(transport.clone()),
            Pin::default(),
            SessionPolicy::default(),
            Arc::new(store.clone()),
            Arc::new(SleepRegistry::new()),
            Arc::new(PollTimer::new(Duration::from_secs(5))),
        );
        manager.set_base_url("http://radio/fsapi");
        CommandInvoker::new(Arc::new(manager))
    }

    #[tokio::test(start_paused = true)]
    async fn get_uses_session_token() {
        let transport = ScriptedTransport::new();
        let store = MemoryStore::new();
        transport
            .push("CREATE_SESSION", session("42"))
            .push("GET/netRemote.sys.power", u8_value(1));
        let invoker = invoker(&transport, &store);
        invoker.session().create_session(false).await.unwrap();

        let result = invoker.get("/FSAPI/GET/netRemote.sys.power").await;

        assert!(result.is_success());
        assert_eq!(result.value(), Some(&FsValue::U8(1)));
        assert_eq!(
            transport.requests()[1],
            "http://radio/fsapi/GET/netRemote.sys.power?pin=1234&sid=42"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn disconnected_call_skips_network() {
        let transport = ScriptedTransport::new();
        let store = MemoryStore::new();
        let invoker = invoker(&transport, &store);

        let result = invoker.get(nodes::SYS_POWER).await;

        assert_eq!(result.failure(), Some(&Failure::NotConnected));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn non_ok_status_is_failed_result_without_recovery() {
        let transport = ScriptedTransport::new();
        let store = MemoryStore::new();
        transport
            .push("CREATE_SESSION", session("42"))
            .push("GET/netRemote.sys.mode", fs_timeout());
        let invoker = invoker(&transport, &store);
        invoker.session().create_session(false).await.unwrap();

        let result = invoker.get(nodes::SYS_MODE).await;

        assert_eq!(
            result.failure(),
            Some(&Failure::Status("FS_TIMEOUT".to_string()))
        );
        assert!(invoker.session().is_connected());
        assert_eq!(transport.count("CREATE_SESSION"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failure_recreates_session() {
        let transport = ScriptedTransport::new();
        let store = MemoryStore::new();
        transport
            .push("CREATE_SESSION", session("1"))
            .push("CREATE_SESSION", session("2"))
            .push("GET/netRemote.sys.power", unreachable());
        let invoker = invoker(&transport, &store);
        invoker.session().create_session(false).await.unwrap();

        let result = invoker.get(nodes::SYS_POWER).await;

        assert!(matches!(result.failure(), Some(Failure::Transport(_))));
        assert_eq!(transport.count("CREATE_SESSION"), 2);
        assert_eq!(invoker.session().token().as_deref(), Some("2"));
        assert!(invoker.session().is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_recovery_is_swallowed() {
        let transport = ScriptedTransport::new();
        let store = MemoryStore::new();
        transport
            .push("CREATE_SESSION", session("1"))
            .push("CREATE_SESSION", Err(ProtocolError::Status(403)))
            .push("GET/netRemote.sys.power", Err(ProtocolError::Status(404)));
        let invoker = invoker(&transport, &store);
        invoker.session().create_session(false).await.unwrap();

        let result = invoker.get(nodes::SYS_POWER).await;

        assert!(!result.is_success());
        assert!(!invoker.session().is_connected());
        assert_eq!(store.read(paths::CONNECTION), Some(StateValue::Bool(false)));
    }

    #[tokio::test(start_paused = true)]
    async fn pin_mismatch_after_recovery_stays_disconnected() {
        let transport = ScriptedTransport::new();
        let store = MemoryStore::new();
        transport
            .push("CREATE_SESSION", session("1"))
            .push("CREATE_SESSION", Err(ProtocolError::Status(403)))
            .push("GET/netRemote.sys.power", unreachable());
        let invoker = invoker(&transport, &store);
        invoker.session().create_session(false).await.unwrap();

        assert!(!invoker.get(nodes::SYS_POWER).await.is_success());
        assert_eq!(transport.count("CREATE_SESSION"), 2);

        tokio::time::advance(Duration::from_secs(16 * 60)).await;
        let result = invoker.get(nodes::SYS_POWER).await;

        assert_eq!(result.failure(), Some(&Failure::NotConnected));
        assert_eq!(transport.count("CREATE_SESSION"), 2);
        assert_eq!(transport.count("GET/netRemote.sys.power"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_session_renewed_before_call() {
        let transport = ScriptedTransport::new();
        let store = MemoryStore::new();
        transport
            .push("CREATE_SESSION", session("1"))
            .push("CREATE_SESSION", session("2"))
            .push("GET/netRemote.sys.power", u8_value(0));
        let invoker = invoker(&transport, &store);
        invoker.session().create_session(false).await.unwrap();

        tokio::time::advance(Duration::from_secs(16 * 60)).await;
        let result = invoker.get(nodes::SYS_POWER).await;

        assert!(result.is_success());
        assert!(transport.requests()[2].ends_with("sid=2"));
    }
}
