// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reading device nodes into the state store.
//!
//! Each `refresh_*` helper issues one `GET` and writes the acknowledged
//! result. A failed call writes nothing and reports `Ok(false)`; only a
//! value of the wrong type or a store failure is an error.

use crate::command::nodes;
use crate::error::Error;
use crate::invoker::CommandInvoker;
use crate::protocol::Transport;
use crate::store::{StateStore, StateValue, paths};
use crate::types::PlayStatus;

/// Writes an acknowledged value.
pub(crate) fn write_ack(
    store: &dyn StateStore,
    path: &str,
    value: impl Into<StateValue>,
) -> Result<(), Error> {
    store.write(path, value.into(), true).map_err(Error::from)
}

/// Fetches a `c8_array` node into `path`.
pub(crate) async fn refresh_text<P: Transport>(
    invoker: &CommandInvoker<P>,
    store: &dyn StateStore,
    node: &str,
    path: &str,
) -> Result<bool, Error> {
    let result = invoker.get(node).await;
    let Some(value) = result.value() else {
        return Ok(false);
    };
    write_ack(store, path, value.as_text()?)?;
    Ok(true)
}

/// Fetches a `u8` node into `path`.
pub(crate) async fn refresh_u8<P: Transport>(
    invoker: &CommandInvoker<P>,
    store: &dyn StateStore,
    node: &str,
    path: &str,
) -> Result<bool, Error> {
    let result = invoker.get(node).await;
    let Some(value) = result.value() else {
        return Ok(false);
    };
    write_ack(store, path, value.as_u8()?)?;
    Ok(true)
}

/// Fetches a `u8` flag node into `path`.
pub(crate) async fn refresh_flag<P: Transport>(
    invoker: &CommandInvoker<P>,
    store: &dyn StateStore,
    node: &str,
    path: &str,
) -> Result<bool, Error> {
    let result = invoker.get(node).await;
    let Some(value) = result.value() else {
        return Ok(false);
    };
    write_ack(store, path, value.as_bool()?)?;
    Ok(true)
}

/// Writes `modes.selected` and copies the label of that mode.
pub(crate) fn write_selected_mode(store: &dyn StateStore, key: u32) -> Result<(), Error> {
    write_ack(store, paths::MODES_SELECTED, key)?;
    if let Some(label) = store
        .read(&paths::mode(i64::from(key), "label"))
        .filter(|v| !v.is_null())
    {
        write_ack(store, paths::MODES_SELECTED_LABEL, label)?;
    }
    Ok(())
}

/// Fetches the current mode.
pub(crate) async fn refresh_mode<P: Transport>(
    invoker: &CommandInvoker<P>,
    store: &dyn StateStore,
) -> Result<Option<u32>, Error> {
    let result = invoker.get(nodes::SYS_MODE).await;
    let Some(value) = result.value() else {
        return Ok(None);
    };
    let key = value.as_u32()?;
    write_selected_mode(store, key)?;
    Ok(Some(key))
}

/// Writes `media.state` for a play status code; unknown codes write nothing.
pub(crate) fn write_play_status(store: &dyn StateStore, code: u8) -> Result<(), Error> {
    match PlayStatus::from_code(code) {
        Some(status) => write_ack(store, paths::MEDIA_STATE, status.as_str()),
        None => {
            tracing::debug!(code, "Unknown play status");
            Ok(())
        }
    }
}

/// Fetches the cover art URL.
pub(crate) async fn refresh_graphic<P: Transport>(
    invoker: &CommandInvoker<P>,
    store: &dyn StateStore,
) -> Result<bool, Error> {
    refresh_text(invoker, store, nodes::PLAY_INFO_GRAPHIC_URI, paths::MEDIA_GRAPHIC).await
}

/// Reads the full playback and audio state once.
pub(crate) async fn refresh_state<P: Transport>(
    invoker: &CommandInvoker<P>,
    store: &dyn StateStore,
) -> Result<(), Error> {
    refresh_flag(invoker, store, nodes::SYS_POWER, paths::DEVICE_POWER).await?;
    refresh_flag(invoker, store, nodes::SYS_CLOCK_DST, paths::DEVICE_DST).await?;
    refresh_mode(invoker, store).await?;

    for (node, path) in [
        (nodes::PLAY_INFO_NAME, paths::MEDIA_NAME),
        (nodes::PLAY_INFO_ALBUM, paths::MEDIA_ALBUM),
        (nodes::PLAY_INFO_TITLE, paths::MEDIA_TITLE),
        (nodes::PLAY_INFO_ARTIST, paths::MEDIA_ARTIST),
        (nodes::PLAY_INFO_TEXT, paths::MEDIA_TEXT),
        (nodes::PLAY_INFO_GRAPHIC_URI, paths::MEDIA_GRAPHIC),
    ] {
        refresh_text(invoker, store, node, path).await?;
    }

    refresh_u8(invoker, store, nodes::SYS_AUDIO_VOLUME, paths::AUDIO_VOLUME).await?;
    refresh_flag(invoker, store, nodes::SYS_AUDIO_MUTE, paths::AUDIO_MUTE).await?;

    let status = invoker.get(nodes::PLAY_STATUS).await;
    if let Some(value) = status.value() {
        write_play_status(store, value.as_u8()?)?;
    }

    tracing::debug!("Device state refreshed");
    Ok(())
}
