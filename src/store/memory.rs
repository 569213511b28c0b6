// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory state store.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;

use super::{EventBus, StateEvent, StateStore, StateValue};
use crate::error::StoreError;

/// A [`StateStore`] keeping the latest value per path in memory.
///
/// Clones share the same data and event bus.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<RwLock<HashMap<String, (StateValue, bool)>>>,
    events: EventBus,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to every write made after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.events.subscribe()
    }

    /// Returns whether the value at `path` was acknowledged.
    #[must_use]
    pub fn is_acked(&self, path: &str) -> Option<bool> {
        self.values.read().get(path).map(|(_, ack)| *ack)
    }

    /// Returns a sorted list of every path holding a value.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<_> = self.values.read().keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl StateStore for MemoryStore {
    fn read(&self, path: &str) -> Option<StateValue> {
        self.values.read().get(path).map(|(value, _)| value.clone())
    }

    fn write(&self, path: &str, value: StateValue, ack: bool) -> Result<(), StoreError> {
        self.values
            .write()
            .insert(path.to_string(), (value.clone(), ack));
        self.events.publish(StateEvent {
            path: path.to_string(),
            value,
            ack,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read() {
        let store = MemoryStore::new();
        assert!(store.read("media.name").is_none());

        store.write("media.name", "SWR3".into(), true).unwrap();
        assert_eq!(store.read("media.name"), Some(StateValue::Text("SWR3".into())));
        assert_eq!(store.is_acked("media.name"), Some(true));

        store.write("media.name", "SWR1".into(), false).unwrap();
        assert_eq!(store.is_acked("media.name"), Some(false));
    }

    #[test]
    fn clones_share_values() {
        let store = MemoryStore::new();
        let other = store.clone();
        other.write("audio.mute", true.into(), true).unwrap();
        assert_eq!(store.read("audio.mute"), Some(StateValue::Bool(true)));
        assert_eq!(store.paths(), vec!["audio.mute".to_string()]);
    }

    #[test]
    fn writes_are_broadcast() {
        let store = MemoryStore::new();
        let mut rx = store.subscribe();
        store.write("audio.volume", 9u8.into(), true).unwrap();

        let event = rx.try_recv().unwrap();
        assert_eq!(
            event,
            StateEvent {
                path: "audio.volume".into(),
                value: StateValue::Number(9),
                ack: true,
            }
        );
    }
}
