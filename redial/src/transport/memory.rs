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

//! In-memory transport implementation for testing.
//!
//! A [`MemoryTransport`] performs no I/O at all. Everything that would come
//! from the network (the peer accepting, hanging up, or the link failing) is
//! triggered by hand through a [`MemoryTransportHandle`], which makes
//! connector and reactor behavior fully deterministic under test.

use crate::event::{ConnectorEvent, EventSink};
use crate::transport::{
    Address, Transport, TransportFactory, TransportId, TransportMetadata, TransportSettings,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::trace;

#[derive(Debug, Default)]
struct MemoryState {
    settings: Option<TransportSettings>,
    events: Option<EventSink>,
    started: bool,
    closed: bool,
    stopped: bool,
}

/// In-memory transport driven by its [`MemoryTransportHandle`].
///
/// # Examples
///
/// ```rust
/// use redial::event::{ConnectorEvent, ConnectorId, EventSink};
/// use redial::transport::{MemoryTransportFactory, Transport, TransportFactory};
///
/// let factory = MemoryTransportFactory::new();
/// let mut transport = factory.create(&"localhost".parse().unwrap());
///
/// let (sink, mut rx) = EventSink::channel(ConnectorId::new(1));
/// transport.start(sink.for_transport(transport.id()));
///
/// let handle = factory.last().unwrap();
/// handle.fail();
/// assert_eq!(rx.try_recv().unwrap().event, ConnectorEvent::TransportClosed);
/// ```
#[derive(Debug)]
pub struct MemoryTransport {
    metadata: TransportMetadata,
    state: Arc<Mutex<MemoryState>>,
    auto_open: bool,
}

impl MemoryTransport {
    /// Creates a transport and the handle that drives it.
    pub fn new(address: &Address) -> (Self, MemoryTransportHandle) {
        let metadata = TransportMetadata::new(TransportId::next(), "memory", address.to_string());
        let state = Arc::new(Mutex::new(MemoryState::default()));
        let handle = MemoryTransportHandle {
            metadata: metadata.clone(),
            state: Arc::clone(&state),
        };
        (
            Self {
                metadata,
                state,
                auto_open: false,
            },
            handle,
        )
    }
}

impl Transport for MemoryTransport {
    fn metadata(&self) -> &TransportMetadata {
        &self.metadata
    }

    fn configure(&mut self, settings: &TransportSettings) {
        self.state.lock().settings = Some(settings.clone());
    }

    fn start(&mut self, events: EventSink) {
        trace!(transport = %self.metadata.id, "memory transport started");
        if self.auto_open {
            events.emit(ConnectorEvent::ConnectionRemoteOpen);
        }
        let mut state = self.state.lock();
        state.started = true;
        state.events = Some(events);
    }

    fn is_started(&self) -> bool {
        self.state.lock().started
    }

    fn close(&mut self) {
        let events = {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            state.events.take()
        };
        if let Some(events) = events {
            events.emit(ConnectorEvent::TransportClosed);
        }
    }

    fn stop(&mut self) {
        let mut state = self.state.lock();
        state.stopped = true;
        state.events = None;
    }
}

/// Test-side control of a [`MemoryTransport`].
#[derive(Debug, Clone)]
pub struct MemoryTransportHandle {
    metadata: TransportMetadata,
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryTransportHandle {
    /// Returns the transport's ID.
    pub fn id(&self) -> TransportId {
        self.metadata.id
    }

    /// Returns the address the transport was created for.
    pub fn address(&self) -> &str {
        &self.metadata.address
    }

    /// Returns the post-bind settings, if the transport was configured.
    pub fn settings(&self) -> Option<TransportSettings> {
        self.state.lock().settings.clone()
    }

    /// Returns `true` once the transport was started.
    pub fn is_started(&self) -> bool {
        self.state.lock().started
    }

    /// Returns `true` once the transport closed or failed.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Returns `true` once the transport was stopped by an unbind.
    pub fn is_stopped(&self) -> bool {
        self.state.lock().stopped
    }

    /// Returns `true` while the transport is neither closed nor stopped.
    pub fn is_live(&self) -> bool {
        let state = self.state.lock();
        !state.closed && !state.stopped
    }

    /// Simulates the peer accepting the connection.
    ///
    /// Returns `false` if the transport is not started or already done.
    pub fn remote_open(&self) -> bool {
        self.emit(ConnectorEvent::ConnectionRemoteOpen, false)
    }

    /// Simulates the link failing.
    pub fn fail(&self) -> bool {
        self.emit(ConnectorEvent::TransportClosed, true)
    }

    /// Simulates the peer hanging up its write side.
    pub fn tail_close(&self) -> bool {
        self.emit(ConnectorEvent::TransportTailClosed, true)
    }

    fn emit(&self, event: ConnectorEvent, terminal: bool) -> bool {
        let events = {
            let mut state = self.state.lock();
            if state.closed || state.stopped {
                return false;
            }
            if terminal {
                state.closed = true;
                state.events.take()
            } else {
                state.events.clone()
            }
        };
        match events {
            Some(events) => events.emit(event),
            None => false,
        }
    }
}

/// Factory producing [`MemoryTransport`]s and remembering every one of them.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransportFactory {
    created: Arc<Mutex<Vec<MemoryTransportHandle>>>,
    auto_open: bool,
}

impl MemoryTransportFactory {
    /// Creates a factory whose transports wait to be driven by hand.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every transport report remote-open as soon as it starts.
    pub fn with_auto_open(mut self, auto_open: bool) -> Self {
        self.auto_open = auto_open;
        self
    }

    /// Returns handles to every transport created so far, oldest first.
    pub fn created(&self) -> Vec<MemoryTransportHandle> {
        self.created.lock().clone()
    }

    /// Returns how many transports have been created.
    pub fn created_count(&self) -> usize {
        self.created.lock().len()
    }

    /// Returns the most recently created transport.
    pub fn last(&self) -> Option<MemoryTransportHandle> {
        self.created.lock().last().cloned()
    }

    /// Returns how many transports are neither closed nor stopped.
    pub fn live_count(&self) -> usize {
        self.created.lock().iter().filter(|h| h.is_live()).count()
    }
}

impl TransportFactory for MemoryTransportFactory {
    fn create(&self, address: &Address) -> Box<dyn Transport> {
        let (mut transport, handle) = MemoryTransport::new(address);
        transport.auto_open = self.auto_open;
        self.created.lock().push(handle);
        Box::new(transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ConnectorId;

    fn address() -> Address {
        "localhost:5672".parse().unwrap()
    }

    #[test]
    fn test_factory_records_transports() {
        let factory = MemoryTransportFactory::new();
        let first = factory.create(&address());
        let second = factory.create(&address());

        assert_eq!(factory.created_count(), 2);
        assert_ne!(first.id(), second.id());
        assert_eq!(factory.last().unwrap().id(), second.id());
        assert_eq!(factory.live_count(), 2);
    }

    #[test]
    fn test_configure_records_settings() {
        let factory = MemoryTransportFactory::new();
        let mut transport = factory.create(&address());
        let settings = TransportSettings {
            tcp_nodelay: false,
            ..Default::default()
        };
        transport.configure(&settings);
        assert_eq!(factory.last().unwrap().settings(), Some(settings));
    }

    #[test]
    fn test_not_started_cannot_emit() {
        let factory = MemoryTransportFactory::new();
        let _transport = factory.create(&address());
        let handle = factory.last().unwrap();
        assert!(!handle.remote_open());
    }

    #[test]
    fn test_handle_drives_events() {
        let factory = MemoryTransportFactory::new();
        let mut transport = factory.create(&address());
        let (sink, mut rx) = EventSink::channel(ConnectorId::new(3));
        transport.start(sink.for_transport(transport.id()));

        let handle = factory.last().unwrap();
        assert!(handle.is_started());
        assert!(handle.remote_open());
        assert!(handle.tail_close());
        // Terminal events fire once.
        assert!(!handle.fail());

        let open = rx.try_recv().unwrap();
        assert_eq!(open.event, ConnectorEvent::ConnectionRemoteOpen);
        assert_eq!(open.source, Some(handle.id()));
        assert_eq!(
            rx.try_recv().unwrap().event,
            ConnectorEvent::TransportTailClosed
        );
        assert!(rx.try_recv().is_err());
        assert!(handle.is_closed());
        assert_eq!(factory.live_count(), 0);
    }

    #[test]
    fn test_auto_open() {
        let factory = MemoryTransportFactory::new().with_auto_open(true);
        let mut transport = factory.create(&address());
        let (sink, mut rx) = EventSink::channel(ConnectorId::new(4));
        transport.start(sink);
        assert_eq!(
            rx.try_recv().unwrap().event,
            ConnectorEvent::ConnectionRemoteOpen
        );
    }

    #[test]
    fn test_close_reports_once_and_stop_is_silent() {
        let factory = MemoryTransportFactory::new();
        let mut closing = factory.create(&address());
        let mut stopping = factory.create(&address());
        let (sink, mut rx) = EventSink::channel(ConnectorId::new(5));
        closing.start(sink.clone());
        stopping.start(sink);

        closing.close();
        closing.close();
        stopping.stop();

        assert_eq!(rx.try_recv().unwrap().event, ConnectorEvent::TransportClosed);
        assert!(rx.try_recv().is_err());
        assert_eq!(factory.live_count(), 0);
    }
}
