// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device feature discovery.
//!
//! Discovery runs once after the first session is established:
//!
//! 1. [`fetch_descriptor`] resolves the FSAPI base URL from the device IP.
//! 2. [`discover_features`] reads the radio id, the volume range and the
//!    list of modes.
//! 3. The full state is read once and the presets of every mode are
//!    scanned.
//!
//! Everything found is written acknowledged to the state store. The values
//! the engine itself needs later are returned as a [`DeviceProfile`].

mod presets;
mod refresh;

pub(crate) use presets::{read_all_presets, update_selected_preset};
pub(crate) use refresh::{
    refresh_flag, refresh_graphic, refresh_mode, refresh_state, refresh_text, refresh_u8,
    write_ack, write_play_status, write_selected_mode,
};

use crate::command::nodes;
use crate::config::{DeviceConfig, SESSION_RETRIES};
use crate::error::Error;
use crate::invoker::CommandInvoker;
use crate::protocol::Transport;
use crate::response::DeviceDescriptor;
use crate::store::{StateStore, paths};

/// Mode id of the media player mode.
const MEDIAPLAYER_ID: &str = "MP";

/// Items requested from `netRemote.sys.caps.validModes`.
const MAX_MODES: u32 = 100;

/// Device capabilities the engine relies on after discovery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceProfile {
    /// Highest settable volume, one less than the volume step count.
    pub max_volume: Option<u8>,
    /// Highest mode key reported by the device.
    pub max_mode_index: Option<i64>,
    /// Key of the media player mode.
    pub mediaplayer_key: Option<i64>,
}

/// Fetches the device descriptor and records it in the store.
///
/// An unreachable device is retried up to [`SESSION_RETRIES`] times.
///
/// # Errors
///
/// Returns `Error::Protocol` if the device cannot be reached or answers
/// with an error status, `Error::Parse` if the descriptor is malformed.
pub async fn fetch_descriptor<P: Transport>(
    transport: &P,
    config: &DeviceConfig,
    store: &dyn StateStore,
) -> Result<DeviceDescriptor, Error> {
    let url = config.descriptor_url();
    let mut remaining = SESSION_RETRIES;
    let body = loop {
        tracing::debug!(url = %url, "Fetching device descriptor");
        match transport.get(&url).await {
            Ok(body) => break body,
            Err(e) if e.is_unreachable() && remaining > 0 => {
                remaining -= 1;
                tracing::warn!(error = %e, remaining, "Device descriptor unreachable, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    };
    tracing::debug!(body = %body, "Device descriptor");

    let descriptor = DeviceDescriptor::parse(&body)?;
    write_ack(store, paths::DEVICE_FRIENDLY_NAME, descriptor.friendly_name.trim())?;
    write_ack(store, paths::DEVICE_VERSION, descriptor.version.trim())?;
    write_ack(store, paths::DEVICE_WEBFSAPI, descriptor.base_url())?;
    tracing::info!(
        name = %descriptor.friendly_name,
        url = %descriptor.base_url(),
        "Device descriptor read"
    );
    Ok(descriptor)
}

/// Reads the radio id, the volume range and the available modes.
///
/// # Errors
///
/// Returns an error if a value has an unexpected type or the store rejects
/// a write. Failed calls only leave the corresponding values unset.
pub async fn discover_features<P: Transport>(
    invoker: &CommandInvoker<P>,
    store: &dyn StateStore,
) -> Result<DeviceProfile, Error> {
    let mut profile = DeviceProfile::default();

    refresh_text(invoker, store, nodes::SYS_INFO_RADIO_ID, paths::DEVICE_RADIO_ID).await?;

    let steps = invoker.get(nodes::SYS_CAPS_VOLUME_STEPS).await;
    if let Some(value) = steps.value() {
        let max = u8::try_from(value.as_i64()?.saturating_sub(1).max(0)).unwrap_or(u8::MAX);
        write_ack(store, paths::AUDIO_MAX_VOLUME, max)?;
        profile.max_volume = Some(max);
    }

    let modes = invoker.list(nodes::SYS_CAPS_VALID_MODES, -1, MAX_MODES).await;
    for item in modes.items() {
        let key = item.key;
        let id = item.text("id").unwrap_or_default();
        write_ack(store, &paths::mode(key, "key"), key)?;
        write_ack(store, &paths::mode(key, "id"), id)?;
        write_ack(store, &paths::mode(key, "label"), item.text("label").unwrap_or_default())?;
        for flag in ["streamable", "selectable"] {
            if let Some(value) = item.field(flag) {
                write_ack(store, &paths::mode(key, flag), value.as_bool()?)?;
            }
        }
        if id == MEDIAPLAYER_ID {
            write_ack(store, paths::MODES_MEDIAPLAYER, key)?;
            profile.mediaplayer_key = Some(key);
        }
        profile.max_mode_index = profile.max_mode_index.max(Some(key));
    }

    tracing::info!(
        modes = modes.items().len(),
        max_volume = ?profile.max_volume,
        "Device features discovered"
    );
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::error::ProtocolError;
    use crate::poller::PollTimer;
    use crate::protocol::scripted::{
        ScriptedTransport, ok, session, text_value, u8_value, unreachable,
    };
    use crate::session::{SessionManager, SessionPolicy};
    use crate::sleep::SleepRegistry;
    use crate::store::{MemoryStore, StateValue};
    use crate::types::Pin;

    const DESCRIPTOR: &str = "<netRemote>\
        <friendlyName>Kitchen </friendlyName>\
        <version>ir-mmi-FS2026-0500-0549</version>\
        <webfsapi>http://192.168.1.40:80/fsapi/</webfsapi>\
        </netRemote>";

    const MODES: &str = "<fsapiResponse><status>FS_OK</status>\
        <item key=\"0\">\
          <field name=\"id\"><c8_array>IR</c8_array></field>\
          <field name=\"selectable\"><u8>1</u8></field>\
          <field name=\"label\"><c8_array>Internet radio</c8_array></field>\
          <field name=\"streamable\"><u8>0</u8></field>\
        </item>\
        <item key=\"3\">\
          <field name=\"id\"><c8_array>MP</c8_array></field>\
          <field name=\"selectable\"><u8>1</u8></field>\
          <field name=\"label\"><c8_array>Music player</c8_array></field>\
          <field name=\"streamable\"><u8>1</u8></field>\
        </item>\
        </fsapiResponse>";

    fn config() -> DeviceConfig {
        DeviceConfig::new("192.168.1.40").unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn descriptor_written_to_store() {
        let transport = ScriptedTransport::new();
        let store = MemoryStore::new();
        transport.push("/device", unreachable()).push("/device", ok(DESCRIPTOR));

        let descriptor = fetch_descriptor(&transport, &config(), &store).await.unwrap();

        assert_eq!(descriptor.base_url(), "http://192.168.1.40:80/fsapi");
        assert_eq!(transport.requests()[0], "http://192.168.1.40/device");
        assert_eq!(store.read(paths::DEVICE_FRIENDLY_NAME), Some("Kitchen".into()));
        assert_eq!(
            store.read(paths::DEVICE_WEBFSAPI),
            Some("http://192.168.1.40:80/fsapi".into())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn descriptor_gives_up_after_retries() {
        let transport = ScriptedTransport::new();
        let store = MemoryStore::new();
        transport.always("/device", unreachable);

        let err = fetch_descriptor(&transport, &config(), &store).await.unwrap_err();

        assert!(matches!(err, Error::Protocol(ProtocolError::Unreachable(_))));
        assert_eq!(transport.count("/device"), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn features_discovered() {
        let transport = ScriptedTransport::new();
        let store = MemoryStore::new();
        transport
            .push("CREATE_SESSION", session("9"))
            .push("GET/netRemote.sys.info.radioId", text_value("002261B3A8F1"))
            .push("GET/netRemote.sys.caps.volumeSteps", u8_value(33))
            .push("LIST_GET_NEXT/netRemote.sys.caps.validModes/-1", ok(MODES));
        let manager = SessionManager::new(
            Arc::new(transport.clone()),
            Pin::default(),
            SessionPolicy::default(),
            Arc::new(store.clone()),
            Arc::new(SleepRegistry::new()),
            Arc::new(PollTimer::new(Duration::from_secs(5))),
        );
        manager.set_base_url("http://radio/fsapi");
        manager.create_session(false).await.unwrap();
        let invoker = CommandInvoker::new(Arc::new(manager));

        let profile = discover_features(&invoker, &store).await.unwrap();

        assert_eq!(
            profile,
            DeviceProfile {
                max_volume: Some(32),
                max_mode_index: Some(3),
                mediaplayer_key: Some(3),
            }
        );
        assert_eq!(store.read(paths::DEVICE_RADIO_ID), Some("002261B3A8F1".into()));
        assert_eq!(store.read(paths::AUDIO_MAX_VOLUME), Some(StateValue::Number(32)));
        assert_eq!(store.read(&paths::mode(0, "label")), Some("Internet radio".into()));
        assert_eq!(store.read(&paths::mode(0, "streamable")), Some(StateValue::Bool(false)));
        assert_eq!(store.read(&paths::mode(3, "selectable")), Some(StateValue::Bool(true)));
        assert_eq!(store.read(paths::MODES_MEDIAPLAYER), Some(StateValue::Number(3)));
        assert!(transport.requests()[3].ends_with("maxItems=100"));
    }
}
