// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `fsapi_lib` - A Rust library to control Frontier Silicon internet radios.
//!
//! Devices built on Frontier Silicon chipsets (Hama, Medion, Roberts,
//! Sangean, Silvercrest and many more) expose the FSAPI: a small HTTP
//! interface where every call is a `GET` answered with an XML document.
//! This library keeps a session with such a device, follows its state
//! through the notification long-poll and mirrors everything into a
//! key/value [`StateStore`](store::StateStore).
//!
//! # Supported Features
//!
//! - **Session handling**: PIN authentication, periodic renewal, fast
//!   retries and backoff when the device is unreachable
//! - **State tracking**: power, modes, volume, mute, play status and
//!   station information, updated from device notifications
//! - **Control**: power, mode and preset selection, volume, media buttons
//! - **Discovery**: device descriptor, valid modes and preset lists
//!
//! # Quick Start
//!
//! ```no_run
//! use fsapi_lib::FsapiDevice;
//! use fsapi_lib::config::DeviceConfig;
//! use fsapi_lib::store::{MemoryStore, StateStore};
//! use fsapi_lib::types::Pin;
//!
//! #[tokio::main]
//! async fn main() -> fsapi_lib::Result<()> {
//!     let config = DeviceConfig::new("192.168.1.40")?.with_pin(Pin::new("1234")?);
//!     let store = MemoryStore::new();
//!     let device = FsapiDevice::builder(config)
//!         .with_store(store.clone())
//!         .build()?;
//!
//!     device.connect().await?;
//!     device.write("media.control.play", true).await?;
//!
//!     let mut events = store.subscribe();
//!     while let Ok(event) = events.recv().await {
//!         println!("{} = {}", event.path, event.value);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Raw Requests
//!
//! ```no_run
//! use fsapi_lib::command::Request;
//! # async fn example(device: fsapi_lib::FsapiDevice) {
//! let result = device.invoke(&Request::get("/FSAPI/GET/netRemote.sys.power")).await;
//! if let Some(value) = result.value() {
//!     println!("power: {value}");
//! }
//! # }
//! ```

pub mod command;
pub mod config;
mod device;
pub mod discovery;
pub mod dispatch;
pub mod error;
pub mod invoker;
pub mod poller;
pub mod protocol;
pub mod response;
pub mod session;
pub mod sleep;
pub mod store;
pub mod types;

pub use command::Request;
pub use config::DeviceConfig;
pub use device::{DeviceBuilder, FsapiDevice, TransportSource};
pub use dispatch::{WriteOutcome, WriteRequest};
pub use error::{Error, ParseError, ProtocolError, Result, SessionError, ValueError};
pub use protocol::{HttpClient, HttpConfig, Transport};
pub use response::{CommandResult, Failure};
pub use store::{MemoryStore, StateStore, StateValue};
pub use types::{FsValue, Pin, PlayControl, PlayStatus};
