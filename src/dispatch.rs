// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mapping of state writes to device commands.
//!
//! A write to a state path (for example `audio.volume = 12`) is parsed into
//! a [`WriteRequest`] and carried out as one or more FSAPI calls. When the
//! device confirms, the new value is written back acknowledged.
//!
//! Many commands are only accepted in navigation mode, so those requests
//! first set `netRemote.nav.state` to 1.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::command::nodes;
use crate::discovery::{
    DeviceProfile, read_all_presets, refresh_graphic, write_ack, write_selected_mode,
};
use crate::error::{Error, ValueError};
use crate::invoker::CommandInvoker;
use crate::poller::NotificationPoller;
use crate::protocol::Transport;
use crate::sleep::{SleepRegistry, WaitOutcome};
use crate::store::{StateStore, StateValue, paths};
use crate::types::PlayControl;

/// Pause between the mode switches of the DAB wake-up workaround.
const DAB_WAKEUP_PAUSE: Duration = Duration::from_secs(2);

/// Mode id of DAB radio.
const DAB_ID: &str = "DAB";

/// Whether the device carried out a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The device confirmed and the value was acknowledged.
    Applied,
    /// The device refused or the write had no effect.
    NotApplied,
}

/// Direction of a volume step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeStep {
    Up,
    Down,
}

/// A parsed state write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteRequest {
    Power(bool),
    FriendlyName(String),
    DaylightSaving(bool),
    /// `modes.{k}.switchTo`
    SwitchMode(u32),
    /// `modes.{k}.presets.{p}.recall`
    RecallPreset { mode: u32, preset: i64 },
    /// `modes.selected`
    SelectMode(u32),
    /// `modes.selectPreset`
    SelectPreset(i64),
    ReadPresets,
    Volume(i64),
    Mute(bool),
    VolumeStep(VolumeStep),
    Media(PlayControl),
    ResetSession,
}

impl WriteRequest {
    /// Parses a write of `value` to `path`.
    ///
    /// Button paths ignore the value.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownPath` if no command is bound to `path` and
    /// `ValueError::UnexpectedType` if the value has the wrong type.
    pub fn parse(path: &str, value: &StateValue) -> Result<Self, Error> {
        let unknown = || Error::UnknownPath(path.to_string());
        let segments: Vec<&str> = path.split('.').collect();

        let request = match segments.as_slice() {
            ["device", "power"] => Self::Power(expect_bool(value)?),
            ["device", "friendlyName"] => Self::FriendlyName(expect_text(value)?),
            ["device", "dayLightSavingTime"] => Self::DaylightSaving(expect_bool(value)?),
            ["modes", key, "switchTo"] => Self::SwitchMode(key.parse().map_err(|_| unknown())?),
            ["modes", key, "presets", preset, "recall"] => Self::RecallPreset {
                mode: key.parse().map_err(|_| unknown())?,
                preset: preset.parse().map_err(|_| unknown())?,
            },
            ["modes", "selected"] => {
                let key = expect_number(value)?;
                Self::SelectMode(u32::try_from(key).map_err(|_| ValueError::UnexpectedType {
                    expected: "mode key",
                    actual: key.to_string(),
                })?)
            }
            ["modes", "selectPreset"] => Self::SelectPreset(expect_number(value)?),
            ["modes", "readPresets"] => Self::ReadPresets,
            ["audio", "volume"] => Self::Volume(expect_number(value)?),
            ["audio", "mute"] => Self::Mute(expect_bool(value)?),
            ["audio", "control", "volumeUp"] => Self::VolumeStep(VolumeStep::Up),
            ["audio", "control", "volumeDown"] => Self::VolumeStep(VolumeStep::Down),
            ["media", "control", button] => Self::Media(button.parse().map_err(|()| unknown())?),
            ["debug", "resetSession"] => Self::ResetSession,
            _ => return Err(unknown()),
        };
        Ok(request)
    }
}

fn type_name(value: &StateValue) -> String {
    match value {
        StateValue::Null => "null",
        StateValue::Bool(_) => "bool",
        StateValue::Number(_) => "number",
        StateValue::Text(_) => "text",
    }
    .to_string()
}

fn expect_bool(value: &StateValue) -> Result<bool, ValueError> {
    value.as_bool().ok_or_else(|| ValueError::UnexpectedType {
        expected: "bool",
        actual: type_name(value),
    })
}

fn expect_number(value: &StateValue) -> Result<i64, ValueError> {
    value.as_i64().ok_or_else(|| ValueError::UnexpectedType {
        expected: "number",
        actual: type_name(value),
    })
}

fn expect_text(value: &StateValue) -> Result<String, ValueError> {
    match value {
        StateValue::Text(text) => Ok(text.clone()),
        StateValue::Number(n) => Ok(n.to_string()),
        _ => Err(ValueError::UnexpectedType {
            expected: "text",
            actual: type_name(value),
        }),
    }
}

fn outcome(applied: bool) -> WriteOutcome {
    if applied {
        WriteOutcome::Applied
    } else {
        WriteOutcome::NotApplied
    }
}

/// Carries out state writes on the device.
pub struct Dispatcher<P> {
    invoker: Arc<CommandInvoker<P>>,
    poller: Arc<NotificationPoller<P>>,
    store: Arc<dyn StateStore>,
    sleeps: Arc<SleepRegistry>,
    profile: RwLock<DeviceProfile>,
    diagnostics: bool,
    dab_wakeup: bool,
}

impl<P: Transport> Dispatcher<P> {
    #[must_use]
    pub fn new(
        invoker: Arc<CommandInvoker<P>>,
        poller: Arc<NotificationPoller<P>>,
        store: Arc<dyn StateStore>,
        sleeps: Arc<SleepRegistry>,
    ) -> Self {
        Self {
            invoker,
            poller,
            store,
            sleeps,
            profile: RwLock::new(DeviceProfile::default()),
            diagnostics: false,
            dab_wakeup: false,
        }
    }

    /// Allows `debug.resetSession`.
    #[must_use]
    pub fn with_diagnostics(mut self, enabled: bool) -> Self {
        self.diagnostics = enabled;
        self
    }

    /// Enables the DAB wake-up workaround on power on.
    #[must_use]
    pub fn with_dab_wakeup_workaround(mut self, enabled: bool) -> Self {
        self.dab_wakeup = enabled;
        self
    }

    /// Returns the discovered device capabilities.
    #[must_use]
    pub fn profile(&self) -> DeviceProfile {
        *self.profile.read()
    }

    /// Replaces the device capabilities, usually after discovery.
    pub fn set_profile(&self, profile: DeviceProfile) {
        *self.profile.write() = profile;
    }

    /// Handles a write of `value` to `path`.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownPath` for paths without a command,
    /// `Error::Value` for values of the wrong type or out of range, and
    /// `Error::Session` if a manual session reset fails. A command the
    /// device refuses is not an error but [`WriteOutcome::NotApplied`].
    pub async fn write(&self, path: &str, value: StateValue) -> Result<WriteOutcome, Error> {
        self.poller.note_external_write();
        let request = WriteRequest::parse(path, &value)?;
        tracing::debug!(path, request = ?request, "Dispatching write");
        let result = self.apply(request).await?;
        if result == WriteOutcome::NotApplied {
            tracing::debug!(path, "Write not applied");
        }
        Ok(result)
    }

    /// Carries out a parsed write.
    ///
    /// # Errors
    ///
    /// See [`write`](Self::write).
    pub async fn apply(&self, request: WriteRequest) -> Result<WriteOutcome, Error> {
        let store = self.store.as_ref();
        match request {
            WriteRequest::Power(on) => {
                let applied = self.set(nodes::SYS_POWER, u8::from(on)).await;
                if applied {
                    write_ack(store, paths::DEVICE_POWER, on)?;
                }
                if on && self.dab_wakeup {
                    tokio::spawn(dab_wakeup(
                        Arc::clone(&self.invoker),
                        Arc::clone(&self.store),
                        Arc::clone(&self.sleeps),
                    ));
                }
                Ok(outcome(applied))
            }
            WriteRequest::FriendlyName(name) => {
                let applied = self.set(nodes::SYS_INFO_FRIENDLY_NAME, &name).await;
                if applied {
                    write_ack(store, paths::DEVICE_FRIENDLY_NAME, name)?;
                }
                Ok(outcome(applied))
            }
            WriteRequest::DaylightSaving(on) => {
                let applied = self.set(nodes::SYS_CLOCK_DST, u8::from(on)).await;
                if applied {
                    write_ack(store, paths::DEVICE_DST, on)?;
                }
                Ok(outcome(applied))
            }
            WriteRequest::SwitchMode(key) => Ok(outcome(self.switch_mode(key).await?)),
            WriteRequest::RecallPreset { mode, preset } => {
                self.switch_mode(mode).await?;
                self.nav_state().await;
                let applied = self.set(nodes::NAV_SELECT_PRESET, preset).await;
                if applied {
                    write_ack(store, paths::MODES_SELECT_PRESET, preset)?;
                    write_ack(store, &paths::preset(i64::from(mode), preset, "recall"), true)?;
                }
                Ok(outcome(applied))
            }
            WriteRequest::SelectMode(key) => {
                let applied = self.set(nodes::SYS_MODE, key).await;
                if applied {
                    write_selected_mode(store, key)?;
                    refresh_graphic(&*self.invoker, store).await?;
                }
                Ok(outcome(applied))
            }
            WriteRequest::SelectPreset(preset) => {
                self.nav_state().await;
                let applied = self.set(nodes::NAV_SELECT_PRESET, preset).await;
                if applied {
                    write_ack(store, paths::MODES_SELECT_PRESET, preset)?;
                    refresh_graphic(&*self.invoker, store).await?;
                }
                Ok(outcome(applied))
            }
            WriteRequest::ReadPresets => {
                let max_mode_index = self.profile().max_mode_index.unwrap_or(-1);
                read_all_presets(&*self.invoker, store, &self.sleeps, max_mode_index, true)
                    .await?;
                write_ack(store, paths::MODES_READ_PRESETS, true)?;
                Ok(WriteOutcome::Applied)
            }
            WriteRequest::Volume(volume) => {
                let max = self.max_volume();
                if !(0..=i64::from(max)).contains(&volume) {
                    return Err(ValueError::VolumeOutOfRange {
                        max,
                        actual: volume,
                    }
                    .into());
                }
                self.nav_state().await;
                let applied = self.set(nodes::SYS_AUDIO_VOLUME, volume).await;
                if applied {
                    write_ack(store, paths::AUDIO_VOLUME, volume)?;
                }
                Ok(outcome(applied))
            }
            WriteRequest::Mute(mute) => {
                self.nav_state().await;
                let applied = self.set(nodes::SYS_AUDIO_MUTE, u8::from(mute)).await;
                if applied {
                    write_ack(store, paths::AUDIO_MUTE, mute)?;
                }
                Ok(outcome(applied))
            }
            WriteRequest::VolumeStep(step) => self.step_volume(step).await,
            WriteRequest::Media(control) => {
                self.nav_state().await;
                let applied = self.set(nodes::PLAY_CONTROL, control.code()).await;
                if applied {
                    write_ack(store, &paths::media_control(control.as_str()), true)?;
                }
                Ok(outcome(applied))
            }
            WriteRequest::ResetSession => {
                if !self.diagnostics {
                    tracing::debug!("Session reset requires diagnostics");
                    return Ok(WriteOutcome::NotApplied);
                }
                tracing::info!("Manual session reset");
                self.invoker.session().create_session(false).await?;
                write_ack(store, paths::DEBUG_RESET_SESSION, true)?;
                Ok(WriteOutcome::Applied)
            }
        }
    }

    async fn set(&self, node: &str, value: impl ToString) -> bool {
        self.invoker.set(node, value).await.is_success()
    }

    async fn nav_state(&self) -> bool {
        self.set(nodes::NAV_STATE, 1).await
    }

    fn max_volume(&self) -> u8 {
        self.profile().max_volume.unwrap_or(u8::MAX)
    }

    /// Switches to mode `key` and acknowledges its `switchTo` button.
    async fn switch_mode(&self, key: u32) -> Result<bool, Error> {
        let store = self.store.as_ref();
        if !self.set(nodes::SYS_MODE, key).await {
            return Ok(false);
        }
        write_selected_mode(store, key)?;
        write_ack(store, &paths::mode(i64::from(key), "switchTo"), true)?;
        Ok(true)
    }

    async fn step_volume(&self, step: VolumeStep) -> Result<WriteOutcome, Error> {
        let store = self.store.as_ref();
        self.nav_state().await;

        let Some(current) = store.read(paths::AUDIO_VOLUME).and_then(|v| v.as_i64()) else {
            tracing::debug!("Volume unknown, step ignored");
            return Ok(WriteOutcome::NotApplied);
        };
        let (volume, button) = match step {
            VolumeStep::Up if current < i64::from(self.max_volume()) => {
                (current + 1, paths::AUDIO_VOLUME_UP)
            }
            VolumeStep::Down if current > 0 => (current - 1, paths::AUDIO_VOLUME_DOWN),
            _ => return Ok(WriteOutcome::NotApplied),
        };

        let applied = self.set(nodes::SYS_AUDIO_VOLUME, volume).await;
        if applied {
            write_ack(store, paths::AUDIO_VOLUME, volume)?;
            write_ack(store, button, true)?;
        }
        Ok(outcome(applied))
    }
}

/// Briefly switches a DAB device to the media player and back.
///
/// Some DAB devices stay silent after power on until the mode is changed.
async fn dab_wakeup<P: Transport>(
    invoker: Arc<CommandInvoker<P>>,
    store: Arc<dyn StateStore>,
    sleeps: Arc<SleepRegistry>,
) {
    let mode = match invoker.get(nodes::SYS_MODE).await.value().map(|v| v.as_u32()) {
        Some(Ok(mode)) => mode,
        Some(Err(e)) => {
            tracing::warn!(error = %e, "DAB wake-up: unexpected mode value");
            return;
        }
        None => return,
    };
    let is_dab = store
        .read(&paths::mode(i64::from(mode), "id"))
        .is_some_and(|id| id.as_text() == Some(DAB_ID));
    if !is_dab {
        return;
    }

    if sleeps.wait(DAB_WAKEUP_PAUSE).await == WaitOutcome::Cancelled {
        return;
    }
    let Some(mediaplayer) = store.read(paths::MODES_MEDIAPLAYER).and_then(|v| v.as_i64()) else {
        tracing::debug!("DAB wake-up: no media player mode");
        return;
    };
    tracing::debug!(mode, mediaplayer, "DAB wake-up: switching modes");
    invoker.set(nodes::SYS_MODE, mediaplayer).await;

    if sleeps.wait(DAB_WAKEUP_PAUSE).await == WaitOutcome::Cancelled {
        return;
    }
    invoker.set(nodes::SYS_MODE, mode).await;
}
