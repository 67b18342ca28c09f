//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//


#![doc = include_str!("../../README.md")]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

//! ## Architecture
//!
//! - **[`connector`]**: the per-connection state machine deciding when to
//!   bind, unbind, retry and release
//! - **[`reconnect`]**: backoff policies answering "retry now, later, or never"
//! - **[`connection`]**: the logical connection contract and [`Endpoint`]
//! - **[`transport`]**: the transport contract with TCP and in-memory
//!   implementations
//! - **[`scheduler`]**: cancellable retry timers
//! - **[`reactor`]**: the single-task host that delivers events to connectors
//! - **[`options`]**: two-phase connection configuration
//! - **[`event`]**: lifecycle events and the queue that carries them

pub mod connection;
pub mod connector;
pub mod error;
pub mod event;
pub mod options;
pub mod reactor;
pub mod reconnect;
pub mod scheduler;
pub mod transport;

pub use connection::{Connection, ConnectionSettings, Endpoint, EndpointState};
pub use connector::{ConnectionHandler, Connector, ConnectorState, dispatch};
pub use error::RedialError;
pub use event::{ConnectorEvent, ConnectorId};
pub use options::{ConnectionOptions, ReconnectOptions};
pub use reactor::{ConnectionHandle, Reactor, ReactorHandle};
pub use reconnect::{Backoff, ReconnectPolicy, ReconnectTimer};
pub use scheduler::{Scheduler, TimerHandle};
pub use transport::{Address, Transport, TransportError, TransportFactory};
