// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-node handlers for change notifications.

use crate::command::nodes;
use crate::discovery::{
    refresh_flag, refresh_mode, refresh_text, refresh_u8, update_selected_preset, write_ack,
    write_play_status, write_selected_mode,
};
use crate::error::Error;
use crate::invoker::CommandInvoker;
use crate::protocol::Transport;
use crate::store::{StateStore, paths};
use crate::types::FsValue;

/// Notification nodes with a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotifyKind {
    Power,
    SysState,
    Mode,
    Volume,
    Mute,
    PlayStatus,
    Text,
    Artist,
    Album,
    Title,
    Name,
    Graphic,
    /// Reported by DAB stations on every service change; carries nothing
    /// worth storing.
    ServiceEcc,
}

impl NotifyKind {
    /// Looks up the handler for a notification node name.
    ///
    /// Matching is case-insensitive; unknown nodes return `None`.
    #[must_use]
    pub fn from_node(node: &str) -> Option<Self> {
        let kind = match node.to_ascii_lowercase().as_str() {
            "netremote.sys.power" => Self::Power,
            "netremote.sys.state" => Self::SysState,
            "netremote.sys.mode" => Self::Mode,
            "netremote.sys.audio.volume" => Self::Volume,
            "netremote.sys.audio.mute" => Self::Mute,
            "netremote.play.status" => Self::PlayStatus,
            "netremote.play.info.text" => Self::Text,
            "netremote.play.info.artist" => Self::Artist,
            "netremote.play.info.album" => Self::Album,
            "netremote.play.info.title" => Self::Title,
            "netremote.play.info.name" => Self::Name,
            "netremote.play.info.graphicuri" => Self::Graphic,
            "netremote.play.serviceids.ecc" => Self::ServiceEcc,
            _ => return None,
        };
        Some(kind)
    }
}

/// Applies one notification to the store, issuing follow-up calls as
/// needed.
pub(crate) async fn handle<P: Transport>(
    kind: NotifyKind,
    value: &FsValue,
    invoker: &CommandInvoker<P>,
    store: &dyn StateStore,
) -> Result<(), Error> {
    match kind {
        NotifyKind::Power => write_ack(store, paths::DEVICE_POWER, value.as_bool()?)?,
        NotifyKind::SysState => {
            refresh_flag(invoker, store, nodes::SYS_POWER, paths::DEVICE_POWER).await?;
        }
        NotifyKind::Mode => write_selected_mode(store, value.as_u32()?)?,
        NotifyKind::Volume => write_ack(store, paths::AUDIO_VOLUME, value.as_u8()?)?,
        NotifyKind::Mute => write_ack(store, paths::AUDIO_MUTE, value.as_bool()?)?,
        NotifyKind::PlayStatus => write_play_status(store, value.as_u8()?)?,
        NotifyKind::Text => {
            write_ack(store, paths::MEDIA_TEXT, value.as_text()?)?;
            refresh_text(invoker, store, nodes::PLAY_INFO_ARTIST, paths::MEDIA_ARTIST).await?;
            refresh_mode(invoker, store).await?;
        }
        NotifyKind::Artist => write_ack(store, paths::MEDIA_ARTIST, value.as_text()?)?,
        NotifyKind::Album => write_ack(store, paths::MEDIA_ALBUM, value.as_text()?)?,
        NotifyKind::Title => {
            write_ack(store, paths::MEDIA_TITLE, value.as_text()?)?;
            refresh_text(invoker, store, nodes::PLAY_INFO_ARTIST, paths::MEDIA_ARTIST).await?;
            refresh_text(invoker, store, nodes::PLAY_INFO_ALBUM, paths::MEDIA_ALBUM).await?;
        }
        NotifyKind::Name => {
            let name = value.as_text()?;
            write_ack(store, paths::MEDIA_NAME, name)?;
            refresh_text(invoker, store, nodes::PLAY_INFO_ARTIST, paths::MEDIA_ARTIST).await?;
            refresh_text(invoker, store, nodes::PLAY_INFO_ALBUM, paths::MEDIA_ALBUM).await?;
            refresh_u8(invoker, store, nodes::SYS_AUDIO_VOLUME, paths::AUDIO_VOLUME).await?;
            refresh_flag(invoker, store, nodes::SYS_AUDIO_MUTE, paths::AUDIO_MUTE).await?;
            refresh_mode(invoker, store).await?;
            update_selected_preset(store, name)?;
        }
        NotifyKind::Graphic => write_ack(store, paths::MEDIA_GRAPHIC, value.as_text()?)?,
        NotifyKind::ServiceEcc => {}
    }
    Ok(())
}
