// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! State paths written and read by the engine.

pub const CONNECTION: &str = "info.connection";

pub const DEVICE_POWER: &str = "device.power";
pub const DEVICE_FRIENDLY_NAME: &str = "device.friendlyName";
pub const DEVICE_DST: &str = "device.dayLightSavingTime";
pub const DEVICE_RADIO_ID: &str = "device.radioId";
pub const DEVICE_VERSION: &str = "device.version";
pub const DEVICE_WEBFSAPI: &str = "device.webfsapi";

pub const AUDIO_VOLUME: &str = "audio.volume";
pub const AUDIO_MUTE: &str = "audio.mute";
pub const AUDIO_MAX_VOLUME: &str = "audio.maxVolume";
pub const AUDIO_VOLUME_UP: &str = "audio.control.volumeUp";
pub const AUDIO_VOLUME_DOWN: &str = "audio.control.volumeDown";

pub const MEDIA_STATE: &str = "media.state";
pub const MEDIA_NAME: &str = "media.name";
pub const MEDIA_TITLE: &str = "media.title";
pub const MEDIA_ARTIST: &str = "media.artist";
pub const MEDIA_ALBUM: &str = "media.album";
pub const MEDIA_TEXT: &str = "media.text";
pub const MEDIA_GRAPHIC: &str = "media.graphic";

pub const MODES_SELECTED: &str = "modes.selected";
pub const MODES_SELECTED_LABEL: &str = "modes.selectedLabel";
pub const MODES_SELECT_PRESET: &str = "modes.selectPreset";
pub const MODES_READ_PRESETS: &str = "modes.readPresets";
pub const MODES_MEDIAPLAYER: &str = "modes.mediaplayer";

pub const DEBUG_SESSION: &str = "debug.session";
pub const DEBUG_SESSION_CREATION_TIME: &str = "debug.sessionCreationTime";
pub const DEBUG_LAST_NOTIFY_CALL: &str = "debug.lastNotifyCall";
pub const DEBUG_LAST_NOTIFY_ERROR: &str = "debug.lastNotifyError";
pub const DEBUG_RESET_SESSION: &str = "debug.resetSession";

/// Path of a media control button, e.g. `media.control.play`.
#[must_use]
pub fn media_control(button: &str) -> String {
    format!("media.control.{button}")
}

/// Path of an attribute of mode `key`, e.g. `modes.3.label`.
#[must_use]
pub fn mode(key: i64, attribute: &str) -> String {
    format!("modes.{key}.{attribute}")
}

/// Path of the preset count of mode `key`.
#[must_use]
pub fn presets_available(key: i64) -> String {
    format!("modes.{key}.presets.available")
}

/// Path of an attribute of preset `index` of mode `key`.
#[must_use]
pub fn preset(key: i64, index: i64, attribute: &str) -> String {
    format!("modes.{key}.presets.{index}.{attribute}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dynamic_paths() {
        assert_eq!(media_control("next"), "media.control.next");
        assert_eq!(mode(2, "switchTo"), "modes.2.switchTo");
        assert_eq!(presets_available(0), "modes.0.presets.available");
        assert_eq!(preset(1, 4, "recall"), "modes.1.presets.4.recall");
    }
}
