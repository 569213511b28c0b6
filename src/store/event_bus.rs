// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event bus for broadcasting state writes.

use tokio::sync::broadcast;

use super::StateEvent;

/// Default channel capacity for the event bus.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Event bus for broadcasting state writes to multiple subscribers.
///
/// If a subscriber falls behind by more than the capacity, it loses the
/// oldest events and receives `RecvError::Lagged`.
///
/// # Examples
///
/// ```
/// use fsapi_lib::store::{EventBus, StateEvent, StateValue};
///
/// let bus = EventBus::new();
/// let mut rx = bus.subscribe();
///
/// bus.publish(StateEvent {
///     path: "audio.mute".to_string(),
///     value: StateValue::Bool(true),
///     ack: true,
/// });
///
/// assert_eq!(rx.try_recv().unwrap().path, "audio.mute");
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StateEvent>,
}

impl EventBus {
    /// Creates a new event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a new event bus with the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to events published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publishes an event to all subscribers.
    ///
    /// Without subscribers the event is discarded.
    pub fn publish(&self, event: StateEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
