// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Preset lists of the device modes.
//!
//! The device only reports the presets of the mode it is currently in, so
//! scanning switches through every mode and restores the original one
//! afterwards. The device is muted while scanning.

use std::time::Duration;

use super::refresh::write_ack;
use crate::command::nodes;
use crate::error::Error;
use crate::invoker::CommandInvoker;
use crate::protocol::Transport;
use crate::sleep::{SleepRegistry, WaitOutcome};
use crate::store::{StateStore, StateValue, paths};

/// Pause after a mode switch before the preset list is valid.
const MODE_SETTLE: Duration = Duration::from_secs(1);

/// Items requested from `netRemote.nav.presets`.
const MAX_PRESETS: u32 = 65535;

/// Reads the presets of every known mode.
///
/// Modes whose presets were read before are skipped unless `force` is set.
/// Returns the number of modes scanned.
pub(crate) async fn read_all_presets<P: Transport>(
    invoker: &CommandInvoker<P>,
    store: &dyn StateStore,
    sleeps: &SleepRegistry,
    max_mode_index: i64,
    force: bool,
) -> Result<usize, Error> {
    if !invoker.set(nodes::NAV_STATE, 1).await.is_success() {
        tracing::debug!("Navigation unavailable, presets not read");
        return Ok(0);
    }

    let original_mode = invoker
        .get(nodes::SYS_MODE)
        .await
        .value()
        .map(|v| v.as_u32())
        .transpose()?;
    let unmute = invoker
        .get(nodes::SYS_AUDIO_MUTE)
        .await
        .value()
        .map(|v| v.as_u8())
        .transpose()?
        == Some(0);

    let mut scanned = 0;
    for key in 0..=max_mode_index {
        if store.read(&paths::mode(key, "key")).is_none() {
            continue;
        }
        if !force && store.read(&paths::presets_available(key)).is_some() {
            continue;
        }
        if read_mode_presets(invoker, store, sleeps, key, unmute).await? == WaitOutcome::Cancelled {
            tracing::debug!("Preset scan cancelled");
            break;
        }
        scanned += 1;
    }

    if let Some(mode) = original_mode {
        invoker.set(nodes::SYS_MODE, mode).await;
    }
    if unmute {
        invoker.set(nodes::SYS_AUDIO_MUTE, 0).await;
    }

    tracing::info!(modes = scanned, "Presets read");
    Ok(scanned)
}

/// Switches to mode `key` and stores its preset list.
async fn read_mode_presets<P: Transport>(
    invoker: &CommandInvoker<P>,
    store: &dyn StateStore,
    sleeps: &SleepRegistry,
    key: i64,
    mute: bool,
) -> Result<WaitOutcome, Error> {
    invoker.set(nodes::SYS_MODE, key).await;
    if sleeps.wait(MODE_SETTLE).await == WaitOutcome::Cancelled {
        return Ok(WaitOutcome::Cancelled);
    }
    invoker.set(nodes::NAV_STATE, 1).await;

    let result = invoker.list(nodes::NAV_PRESETS, -1, MAX_PRESETS).await;
    write_ack(store, &paths::presets_available(key), result.is_success())?;
    if !result.is_success() {
        tracing::debug!(mode = key, "Mode has no presets");
        return Ok(WaitOutcome::Elapsed);
    }

    if mute {
        invoker.set(nodes::SYS_AUDIO_MUTE, 1).await;
    }

    for item in result.items() {
        let name = item.text("name").unwrap_or_default();
        write_ack(store, &paths::preset(key, item.key, "name"), name)?;
        write_ack(store, &paths::preset(key, item.key, "key"), item.key)?;
    }
    tracing::debug!(mode = key, presets = result.items().len(), "Mode presets read");
    Ok(WaitOutcome::Elapsed)
}

/// Points `modes.selectPreset` at the preset of the selected mode named
/// `name`, or clears it.
pub(crate) fn update_selected_preset(store: &dyn StateStore, name: &str) -> Result<(), Error> {
    let name = name.trim();
    if name.is_empty() {
        tracing::debug!("Empty station name, preset unchanged");
        return Ok(());
    }
    let Some(mode) = store.read(paths::MODES_SELECTED).and_then(|v| v.as_i64()) else {
        tracing::debug!("No mode selected, preset unchanged");
        return Ok(());
    };

    let available = store
        .read(&paths::presets_available(mode))
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    if available {
        for index in 0.. {
            let Some(preset) = store.read(&paths::preset(mode, index, "name")) else {
                break;
            };
            if preset.as_text().map(str::trim).is_some_and(|p| !p.is_empty() && p == name) {
                return write_ack(store, paths::MODES_SELECT_PRESET, index);
            }
        }
    }
    write_ack(store, paths::MODES_SELECT_PRESET, StateValue::Null)
}
