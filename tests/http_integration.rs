// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the FSAPI over HTTP using wiremock.

use fsapi_lib::command::Request;
use fsapi_lib::poller::PollOutcome;
use fsapi_lib::protocol::{HttpClient, Transport};
use fsapi_lib::store::{MemoryStore, StateStore, StateValue};
use fsapi_lib::{
    DeviceConfig, Error, FsValue, FsapiDevice, ProtocolError, SessionError, WriteOutcome,
};
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn envelope(inner: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><fsapiResponse>{inner}</fsapiResponse>"
    ))
}

fn status(status: &str) -> ResponseTemplate {
    envelope(&format!("<status>{status}</status>"))
}

fn u8_value(value: u8) -> ResponseTemplate {
    envelope(&format!(
        "<status>FS_OK</status><value><u8>{value}</u8></value>"
    ))
}

fn text_value(value: &str) -> ResponseTemplate {
    envelope(&format!(
        "<status>FS_OK</status><value><c8_array>{value}</c8_array></value>"
    ))
}

async fn mount_session(server: &MockServer, id: &str) {
    Mock::given(method("GET"))
        .and(path("/fsapi/CREATE_SESSION"))
        .and(query_param("pin", "1234"))
        .respond_with(envelope(&format!(
            "<status>FS_OK</status><sessionId>{id}</sessionId>"
        )))
        .mount(server)
        .await;
}

/// Answers every request no other mock matches with a node error.
async fn mount_fallback(server: &MockServer) {
    Mock::given(method("GET"))
        .respond_with(status("FS_NODE_DOES_NOT_EXIST"))
        .with_priority(10)
        .mount(server)
        .await;
}

fn device(server: &MockServer, store: &MemoryStore) -> FsapiDevice<HttpClient> {
    FsapiDevice::builder(DeviceConfig::new("127.0.0.1").unwrap())
        .with_store(store.clone())
        .with_base_url(format!("{}/fsapi", server.uri()))
        .without_discovery()
        .build()
        .unwrap()
}

// ============================================================================
// HttpClient Tests
// ============================================================================

mod http_client {
    use super::*;

    #[tokio::test]
    async fn returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/device"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<netRemote/>"))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let body = client.get(&format!("{}/device", server.uri())).await.unwrap();

        assert_eq!(body, "<netRemote/>");
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let err = client
            .get(&format!("{}/fsapi/CREATE_SESSION?pin=0000", server.uri()))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(403));
        assert!(!err.is_unreachable());
    }
}

// ============================================================================
// Session and Command Tests
// ============================================================================

mod commands {
    use super::*;

    #[tokio::test]
    async fn get_uses_session_id() {
        let server = MockServer::start().await;
        mount_session(&server, "42").await;
        Mock::given(method("GET"))
            .and(path("/fsapi/GET/netRemote.sys.power"))
            .and(query_param("pin", "1234"))
            .and(query_param("sid", "42"))
            .respond_with(u8_value(1))
            .expect(1)
            .mount(&server)
            .await;

        let store = MemoryStore::new();
        let device = device(&server, &store);
        device.create_session().await.unwrap();

        let result = device
            .invoke(&Request::get("/FSAPI/GET/netRemote.sys.power"))
            .await;

        assert!(result.is_success());
        assert_eq!(result.value(), Some(&FsValue::U8(1)));
        assert_eq!(device.session().unwrap().token(), "42");
    }

    #[tokio::test]
    async fn pin_mismatch_fails_connect() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fsapi/CREATE_SESSION"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;

        let store = MemoryStore::new();
        let device = device(&server, &store);
        let err = device.connect().await.unwrap_err();

        assert!(matches!(err, Error::Session(SessionError::PinMismatch)));
        assert_eq!(
            store.read("info.connection"),
            Some(StateValue::Bool(false))
        );
        device.shutdown();
    }

    #[tokio::test]
    async fn set_value_is_url_encoded() {
        let server = MockServer::start().await;
        mount_session(&server, "7").await;
        Mock::given(method("GET"))
            .and(path("/fsapi/SET/netRemote.sys.info.friendlyName"))
            .and(query_param("value", "Living Room & Co"))
            .respond_with(status("FS_OK"))
            .expect(1)
            .mount(&server)
            .await;

        let store = MemoryStore::new();
        let device = device(&server, &store);
        device.create_session().await.unwrap();

        let outcome = device
            .write("device.friendlyName", "Living Room & Co")
            .await
            .unwrap();

        assert_eq!(outcome, WriteOutcome::Applied);
        assert_eq!(
            store.read("device.friendlyName"),
            Some(StateValue::Text("Living Room & Co".to_string()))
        );
    }

    #[tokio::test]
    async fn list_returns_items() {
        let server = MockServer::start().await;
        mount_session(&server, "7").await;
        Mock::given(method("GET"))
            .and(path("/fsapi/LIST_GET_NEXT/netRemote.nav.presets/-1"))
            .and(query_param("maxItems", "20"))
            .respond_with(envelope(
                "<status>FS_OK</status>\
                 <item key=\"0\"><field name=\"name\"><c8_array>Radio One</c8_array></field></item>\
                 <item key=\"1\"><field name=\"name\"><c8_array>Jazz FM</c8_array></field></item>\
                 <listend/>",
            ))
            .mount(&server)
            .await;

        let store = MemoryStore::new();
        let device = device(&server, &store);
        device.create_session().await.unwrap();

        let result = device
            .invoke(&Request::list("netRemote.nav.presets", -1, 20))
            .await;

        let names: Vec<&str> = result
            .items()
            .iter()
            .filter_map(|item| item.text("name"))
            .collect();
        assert_eq!(names, ["Radio One", "Jazz FM"]);
    }

    #[tokio::test]
    async fn failed_status_is_not_applied() {
        let server = MockServer::start().await;
        mount_session(&server, "7").await;
        mount_fallback(&server).await;

        let store = MemoryStore::new();
        let device = device(&server, &store);
        device.create_session().await.unwrap();

        let outcome = device.write("device.power", true).await.unwrap();

        assert_eq!(outcome, WriteOutcome::NotApplied);
        assert_eq!(store.read("device.power"), None);
        assert!(device.is_connected());
    }
}

// ============================================================================
// Polling Tests
// ============================================================================

mod polling {
    use super::*;

    #[tokio::test]
    async fn volume_notification_written_to_store() {
        let server = MockServer::start().await;
        mount_session(&server, "42").await;
        mount_fallback(&server).await;
        Mock::given(method("GET"))
            .and(path("/fsapi/GET_NOTIFIES"))
            .and(query_param("sid", "42"))
            .respond_with(envelope(
                "<status>FS_OK</status>\
                 <notify node=\"netremote.sys.audio.volume\"><value><u8>23</u8></value></notify>",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let store = MemoryStore::new();
        let device = device(&server, &store);
        device.create_session().await.unwrap();

        let outcome = device.poll_now().await;

        assert_eq!(outcome, PollOutcome::Polled { items: 1, errors: 0 });
        assert_eq!(store.read("audio.volume"), Some(StateValue::Number(23)));
        assert_eq!(store.is_acked("audio.volume"), Some(true));
        device.shutdown();
    }
}

// ============================================================================
// Device Lifecycle Tests
// ============================================================================

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn connect_discovers_device() {
        let server = MockServer::start().await;
        mount_session(&server, "99").await;
        mount_fallback(&server).await;
        for (node, response) in [
            ("netRemote.sys.caps.volumeSteps", u8_value(33)),
            ("netRemote.sys.mode", envelope("<status>FS_OK</status><value><u32>0</u32></value>")),
            ("netRemote.sys.audio.mute", u8_value(0)),
            ("netRemote.sys.audio.volume", u8_value(12)),
            ("netRemote.play.info.name", text_value("Radio One")),
        ] {
            Mock::given(method("GET"))
                .and(path(format!("/fsapi/GET/{node}")))
                .respond_with(response)
                .mount(&server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path("/fsapi/LIST_GET_NEXT/netRemote.sys.caps.validModes/-1"))
            .respond_with(envelope(
                "<status>FS_OK</status>\
                 <item key=\"0\">\
                   <field name=\"id\"><c8_array>IR</c8_array></field>\
                   <field name=\"selectable\"><u8>1</u8></field>\
                   <field name=\"label\"><c8_array>Internet radio</c8_array></field>\
                   <field name=\"streamable\"><u8>0</u8></field>\
                 </item>",
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/fsapi/LIST_GET_NEXT/netRemote.nav.presets/-1"))
            .respond_with(envelope(
                "<status>FS_OK</status>\
                 <item key=\"0\"><field name=\"name\"><c8_array>Radio One</c8_array></field></item>",
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex("^/fsapi/SET/"))
            .respond_with(status("FS_OK"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/fsapi/GET_NOTIFIES"))
            .respond_with(status("FS_TIMEOUT"))
            .mount(&server)
            .await;

        let store = MemoryStore::new();
        let device = FsapiDevice::builder(DeviceConfig::new("127.0.0.1").unwrap())
            .with_store(store.clone())
            .with_base_url(format!("{}/fsapi", server.uri()))
            .build()
            .unwrap();

        device.connect().await.unwrap();

        assert!(device.is_connected());
        assert_eq!(device.profile().max_volume, Some(32));
        assert_eq!(store.read("audio.maxVolume"), Some(StateValue::Number(32)));
        assert_eq!(
            store.read("modes.0.label"),
            Some(StateValue::Text("Internet radio".to_string()))
        );
        assert_eq!(store.read("modes.selected"), Some(StateValue::Number(0)));
        assert_eq!(
            store.read("modes.selectedLabel"),
            Some(StateValue::Text("Internet radio".to_string()))
        );
        assert_eq!(store.read("audio.volume"), Some(StateValue::Number(12)));
        assert_eq!(
            store.read("modes.0.presets.0.name"),
            Some(StateValue::Text("Radio One".to_string()))
        );
        assert_eq!(
            store.read("modes.0.presets.available"),
            Some(StateValue::Bool(true))
        );

        let err = device.write("audio.volume", 40_i64).await.unwrap_err();
        assert!(matches!(err, Error::Value(_)));

        device.shutdown();
        assert!(!device.is_connected());
    }

    #[tokio::test]
    async fn unreachable_device_is_reported() {
        let client = HttpClient::new().unwrap();
        let err = client
            .get("http://127.0.0.1:9/fsapi/CREATE_SESSION?pin=1234")
            .await
            .unwrap_err();
        assert!(matches!(err, ProtocolError::Unreachable(_)));
    }
}
