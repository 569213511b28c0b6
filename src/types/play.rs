// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Playback related types.

use std::fmt;
use std::str::FromStr;

/// Playback status reported by `netRemote.play.status`.
///
/// # Examples
///
/// ```
/// use fsapi_lib::types::PlayStatus;
///
/// assert_eq!(PlayStatus::from_code(2), Some(PlayStatus::Playing));
/// assert_eq!(PlayStatus::Playing.as_str(), "PLAYING");
/// assert_eq!(PlayStatus::from_code(42), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayStatus {
    /// Nothing is playing.
    Idle,
    /// Stream is buffering.
    Buffering,
    /// Playback running.
    Playing,
    /// Playback paused.
    Paused,
    /// Stream is buffering again after an underrun.
    Rebuffering,
    /// Playback failed.
    Error,
    /// Playback stopped.
    Stopped,
    /// Playback failed and the device shows an error popup.
    ErrorPopup,
}

impl PlayStatus {
    /// Maps the numeric device code to a status.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Idle),
            1 => Some(Self::Buffering),
            2 => Some(Self::Playing),
            3 => Some(Self::Paused),
            4 => Some(Self::Rebuffering),
            5 => Some(Self::Error),
            6 => Some(Self::Stopped),
            7 => Some(Self::ErrorPopup),
            _ => None,
        }
    }

    /// Returns the label written to `media.state`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Buffering => "BUFFERING",
            Self::Playing => "PLAYING",
            Self::Paused => "PAUSED",
            Self::Rebuffering => "REBUFFERING",
            Self::Error => "ERROR",
            Self::Stopped => "STOPPED",
            Self::ErrorPopup => "ERROR_POPUP",
        }
    }
}

impl fmt::Display for PlayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Media control buttons accepted by `netRemote.play.control`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayControl {
    /// Stop playback.
    Stop,
    /// Start playback.
    Play,
    /// Pause playback.
    Pause,
    /// Skip to the next item.
    Next,
    /// Go back to the previous item.
    Previous,
}

impl PlayControl {
    /// Returns the value sent with `netRemote.play.control`.
    #[must_use]
    pub const fn code(&self) -> u8 {
        match self {
            Self::Stop => 0,
            Self::Play => 1,
            Self::Pause => 2,
            Self::Next => 3,
            Self::Previous => 4,
        }
    }

    /// Returns the button name used in the `media.control` state path.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Play => "play",
            Self::Pause => "pause",
            Self::Next => "next",
            Self::Previous => "previous",
        }
    }
}

impl FromStr for PlayControl {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stop" => Ok(Self::Stop),
            "play" => Ok(Self::Play),
            "pause" => Ok(Self::Pause),
            "next" => Ok(Self::Next),
            "previous" => Ok(Self::Previous),
            _ => Err(()),
        }
    }
}
