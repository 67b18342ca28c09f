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

//! Transport abstractions.
//!
//! A transport is the byte-level I/O object a connection is bound to. This
//! crate does not speak any wire protocol; it only cares about when a
//! transport is created, bound, started and torn down, and about the
//! lifecycle events it reports.
//!
//! - [`Transport`]: the transport contract
//! - [`TransportFactory`]: creates a fresh transport per connect attempt
//! - [`MemoryTransport`]: hand-driven transport for tests
//! - [`TcpTransport`]: tokio TCP socket establishment and liveness
//! - [`Address`]: the endpoint a connector dials
//!
//! # Lifecycle
//!
//! ```text
//!   factory.create ──► connection.bind ──► configure ──► start ──┬─► close (reports closed)
//!                                                                └─► stop  (on unbind, silent)
//! ```
//!
//! Every failure, whether the address is unreachable, the peer resets or the
//! link goes idle, surfaces as a transport-closed event. Nothing is returned
//! to the caller.

mod address;
mod error;
mod memory;
mod tcp;
mod traits;
mod types;

pub use self::address::{AMQPS_PORT, AMQP_PORT, Address};
pub use self::error::TransportError;
pub use self::memory::{MemoryTransport, MemoryTransportFactory, MemoryTransportHandle};
pub use self::tcp::{TcpTransport, TcpTransportFactory};
pub use self::traits::{Transport, TransportFactory};
pub use self::types::{TransportId, TransportMetadata, TransportSettings};
