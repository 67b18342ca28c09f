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

use crate::event::EventSink;
use crate::transport::{Address, TransportId, TransportMetadata, TransportSettings};
use std::fmt;

/// Byte-level I/O object bound to exactly one connection at a time.
///
/// A transport is created fresh for every connect attempt. It never reports
/// results through return values: once started, everything it has to say
/// (peer accepted, peer hung up, I/O failed) is emitted as a
/// [`ConnectorEvent`](crate::event::ConnectorEvent) on the sink it was
/// started with.
///
/// The lifecycle is:
///
/// 1. created by a [`TransportFactory`]
/// 2. bound to a connection, then [`configure`](Transport::configure)d with
///    the post-bind settings
/// 3. [`start`](Transport::start)ed by the reactor once the handler that
///    bound it has returned
/// 4. either [`close`](Transport::close)d (reports transport-closed) or
///    [`stop`](Transport::stop)ped on unbind (reports nothing)
///
/// # Implementing a custom transport
///
/// ```rust
/// use redial::event::{ConnectorEvent, EventSink};
/// use redial::transport::{Transport, TransportId, TransportMetadata, TransportSettings};
///
/// #[derive(Debug)]
/// struct LoopbackTransport {
///     metadata: TransportMetadata,
///     events: Option<EventSink>,
///     started: bool,
/// }
///
/// impl Transport for LoopbackTransport {
///     fn metadata(&self) -> &TransportMetadata {
///         &self.metadata
///     }
///
///     fn configure(&mut self, _settings: &TransportSettings) {}
///
///     fn start(&mut self, events: EventSink) {
///         // Nothing to dial: the "peer" is always there.
///         events.emit(ConnectorEvent::ConnectionRemoteOpen);
///         self.events = Some(events);
///         self.started = true;
///     }
///
///     fn is_started(&self) -> bool {
///         self.started
///     }
///
///     fn close(&mut self) {
///         if let Some(events) = self.events.take() {
///             events.emit(ConnectorEvent::TransportClosed);
///         }
///     }
///
///     fn stop(&mut self) {
///         self.events = None;
///     }
/// }
/// ```
pub trait Transport: Send + fmt::Debug {
    /// Returns metadata about this transport.
    fn metadata(&self) -> &TransportMetadata;

    /// Returns this transport's unique ID.
    fn id(&self) -> TransportId {
        self.metadata().id
    }

    /// Applies post-bind settings. Called before [`start`](Transport::start).
    fn configure(&mut self, settings: &TransportSettings);

    /// Begins I/O. Must not block; results are reported through `events`.
    fn start(&mut self, events: EventSink);

    /// Returns `true` once [`start`](Transport::start) has been called.
    ///
    /// Stays `true` after [`close`](Transport::close) and
    /// [`stop`](Transport::stop); a transport is started at most once.
    fn is_started(&self) -> bool;

    /// Shuts the transport down and reports transport-closed.
    fn close(&mut self);

    /// Halts I/O without reporting anything. Used when unbinding.
    fn stop(&mut self);
}

/// Creates a fresh, unbound transport for an address.
///
/// Creation is infallible: a transport that cannot reach its address says
/// so later with a transport-closed event, exactly like one that connected
/// and then failed.
pub trait TransportFactory: Send + Sync + fmt::Debug {
    /// Creates a new transport dialing `address`.
    fn create(&self, address: &Address) -> Box<dyn Transport>;
}
