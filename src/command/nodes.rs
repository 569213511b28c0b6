// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! FSAPI node names used by this library.

pub const SYS_POWER: &str = "netRemote.sys.power";
pub const SYS_MODE: &str = "netRemote.sys.mode";
pub const SYS_CLOCK_DST: &str = "netRemote.sys.clock.dst";
pub const SYS_INFO_FRIENDLY_NAME: &str = "netRemote.sys.info.friendlyName";
pub const SYS_INFO_RADIO_ID: &str = "netRemote.sys.info.radioId";
pub const SYS_CAPS_VOLUME_STEPS: &str = "netRemote.sys.caps.volumeSteps";
pub const SYS_CAPS_VALID_MODES: &str = "netRemote.sys.caps.validModes";
pub const SYS_AUDIO_VOLUME: &str = "netRemote.sys.audio.volume";
pub const SYS_AUDIO_MUTE: &str = "netRemote.sys.audio.mute";

pub const NAV_STATE: &str = "netRemote.nav.state";
pub const NAV_PRESETS: &str = "netRemote.nav.presets";
pub const NAV_SELECT_PRESET: &str = "netRemote.nav.action.selectPreset";

pub const PLAY_CONTROL: &str = "netRemote.play.control";
pub const PLAY_STATUS: &str = "netRemote.play.status";
pub const PLAY_INFO_NAME: &str = "netRemote.play.info.name";
pub const PLAY_INFO_TEXT: &str = "netRemote.play.info.text";
pub const PLAY_INFO_TITLE: &str = "netRemote.play.info.title";
pub const PLAY_INFO_ARTIST: &str = "netRemote.play.info.artist";
pub const PLAY_INFO_ALBUM: &str = "netRemote.play.info.album";
pub const PLAY_INFO_GRAPHIC_URI: &str = "netRemote.play.info.graphicUri";
