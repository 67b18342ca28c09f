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

//! Lifecycle events and the plumbing that carries them to a connector.
//!
//! Transports and timers never call into a connector directly. They emit a
//! [`ConnectorEvent`] through an [`EventSink`], which queues a [`Dispatch`] on
//! the reactor's single event queue. The reactor then delivers it, in order,
//! on its own task.

use crate::transport::TransportId;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

static NEXT_CONNECTOR_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connector (and the logical connection it owns).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectorId(u64);

impl ConnectorId {
    /// Creates a connector ID from a raw value.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates the next process-wide unique connector ID.
    pub fn next() -> Self {
        Self(NEXT_CONNECTOR_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Connector({})", self.0)
    }
}

/// A connection or transport lifecycle notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectorEvent {
    /// The connection object was created.
    ConnectionInit,
    /// The local side opened the connection.
    ConnectionLocalOpen,
    /// The remote peer opened the connection.
    ConnectionRemoteOpen,
    /// The transport's read side closed (peer hung up).
    TransportTailClosed,
    /// The transport closed, cleanly or because of a failure.
    TransportClosed,
    /// A retry timer scheduled by the connector elapsed.
    TimerFired,
}

impl ConnectorEvent {
    /// Returns the event name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConnectionInit => "connection_init",
            Self::ConnectionLocalOpen => "connection_local_open",
            Self::ConnectionRemoteOpen => "connection_remote_open",
            Self::TransportTailClosed => "transport_tail_closed",
            Self::TransportClosed => "transport_closed",
            Self::TimerFired => "timer_fired",
        }
    }

    /// Returns `true` for events that only a bound transport produces.
    pub fn is_transport_event(&self) -> bool {
        matches!(
            self,
            Self::ConnectionRemoteOpen | Self::TransportTailClosed | Self::TransportClosed
        )
    }
}

impl fmt::Display for ConnectorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event addressed to one connector, as queued on the reactor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    /// The connector the event is for
    pub connector: ConnectorId,
    /// The transport that produced the event, if any
    pub source: Option<TransportId>,
    /// The event itself
    pub event: ConnectorEvent,
}

/// Sending half of a connector's event stream.
///
/// A sink created for a transport stamps every event with that transport's
/// ID so the reactor can discard events from transports that are no longer
/// bound.
#[derive(Debug, Clone)]
pub struct EventSink {
    connector: ConnectorId,
    source: Option<TransportId>,
    tx: mpsc::UnboundedSender<Dispatch>,
}

impl EventSink {
    /// Creates a sink delivering to `connector` through `tx`.
    pub fn new(connector: ConnectorId, tx: mpsc::UnboundedSender<Dispatch>) -> Self {
        Self {
            connector,
            source: None,
            tx,
        }
    }

    /// Creates a sink and the receiver it feeds, for driving a transport
    /// outside of a reactor.
    pub fn channel(connector: ConnectorId) -> (Self, mpsc::UnboundedReceiver<Dispatch>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(connector, tx), rx)
    }

    /// Returns a copy of this sink that stamps events with `transport`.
    pub fn for_transport(&self, transport: TransportId) -> Self {
        Self {
            connector: self.connector,
            source: Some(transport),
            tx: self.tx.clone(),
        }
    }

    /// Returns the connector this sink delivers to.
    pub fn connector(&self) -> ConnectorId {
        self.connector
    }

    /// Returns the transport this sink stamps events with, if any.
    pub fn source(&self) -> Option<TransportId> {
        self.source
    }

    /// Queues `event`. Returns `false` if the reactor has gone away.
    pub fn emit(&self, event: ConnectorEvent) -> bool {
        self.tx
            .send(Dispatch {
                connector: self.connector,
                source: self.source,
                event,
            })
            .is_ok()
    }
}
