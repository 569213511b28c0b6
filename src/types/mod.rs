// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for FSAPI device control.
//!
//! # Types
//!
//! - [`Pin`] - Four digit device PIN (default `1234`)
//! - [`FsValue`] - Typed scalar carried in responses (`u8`, `u32`, `c8_array`, ...)
//! - [`PlayStatus`] - Playback status codes 0-7
//! - [`PlayControl`] - Media buttons (stop, play, pause, next, previous)

mod pin;
mod play;
mod value;

pub use pin::Pin;
pub use play::{PlayControl, PlayStatus};
pub use value::FsValue;
