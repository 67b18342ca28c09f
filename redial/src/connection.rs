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


//! The logical connection a connector manages.
//!
//! A [`Connection`] outlives any number of transports: it is opened once,
//! then bound, unbound and re-bound to fresh transports as they fail, until
//! it is finally released. [`Endpoint`] is the in-process implementation the
//! reactor uses.

use crate::event::EventSink;
use crate::transport::{Transport, TransportError, TransportId};
use tracing::debug;

/// Local state of a connection endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointState {
    /// Created but not yet opened.
    Uninit,
    /// Opened locally.
    Active,
    /// Closed locally.
    Closed,
}

/// Settings applied to a connection before its first transport is bound.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionSettings {
    /// Identity this side presents to the peer
    pub container_id: String,
    /// Virtual host to request, if different from the address host
    pub virtual_host: Option<String>,
    /// User to authenticate as
    pub user: Option<String>,
    /// Largest frame the connection will accept
    pub max_frame_size: Option<u32>,
    /// Largest number of concurrent sessions
    pub max_sessions: Option<u16>,
}

/// A logical connection that transports can be bound to.
///
/// Implementations hold at most one transport at a time. Binding never
/// starts I/O by itself; whoever drives the connection starts the transport
/// once the bind has completed.
pub trait Connection: Send {
    /// Returns `true` while the connection is open locally and not released.
    fn is_active(&self) -> bool;

    /// Returns the bound transport, if any.
    fn transport(&self) -> Option<&dyn Transport>;

    /// Returns the bound transport mutably, if any.
    fn transport_mut(&mut self) -> Option<&mut dyn Transport>;

    /// Attaches `transport`.
    ///
    /// # Errors
    ///
    /// [`TransportError::AlreadyBound`] if a transport is attached, or
    /// [`TransportError::Closed`] once the connection has been released.
    fn bind(&mut self, transport: Box<dyn Transport>) -> Result<(), TransportError>;

    /// Detaches and silently stops the bound transport, returning it.
    fn unbind(&mut self) -> Option<Box<dyn Transport>>;

    /// Drops the connection's final reference, making it inert.
    fn release(&mut self);

    /// Returns the pre-bind settings for modification.
    fn settings_mut(&mut self) -> &mut ConnectionSettings;
}

/// In-process [`Connection`] implementation.
///
/// # Examples
///
/// ```rust
/// use redial::connection::{Connection, Endpoint, EndpointState};
/// use redial::transport::{MemoryTransportFactory, TransportFactory};
///
/// let factory = MemoryTransportFactory::new();
/// let mut endpoint = Endpoint::new();
/// endpoint.open();
/// assert!(endpoint.is_active());
///
/// endpoint.bind(factory.create(&"localhost".parse().unwrap())).unwrap();
/// assert!(endpoint.transport().is_some());
///
/// endpoint.release();
/// assert!(!endpoint.is_active());
/// assert_eq!(endpoint.local_state(), EndpointState::Active);
/// ```
#[derive(Debug)]
pub struct Endpoint {
    local: EndpointState,
    released: bool,
    transport: Option<Box<dyn Transport>>,
    settings: ConnectionSettings,
    bind_count: u64,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::new()
    }
}

impl Endpoint {
    /// Creates an unopened endpoint.
    pub fn new() -> Self {
        Self {
            local: EndpointState::Uninit,
            released: false,
            transport: None,
            settings: ConnectionSettings::default(),
            bind_count: 0,
        }
    }

    /// Opens the endpoint locally. Has no effect unless it is uninitialized.
    pub fn open(&mut self) {
        if self.local == EndpointState::Uninit && !self.released {
            self.local = EndpointState::Active;
        }
    }

    /// Closes the endpoint locally and asks the bound transport to close.
    ///
    /// Returns `true` if a started transport was asked to close, in which
    /// case it reports transport-closed on its own.
    pub fn close(&mut self) -> bool {
        self.local = EndpointState::Closed;
        match self.transport.as_mut() {
            Some(transport) if transport.is_started() => {
                transport.close();
                true
            }
            _ => false,
        }
    }

    /// Returns the local state.
    pub fn local_state(&self) -> EndpointState {
        self.local
    }

    /// Returns `true` once the endpoint has been released.
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Returns how many transports have been bound over the endpoint's life.
    pub fn bind_count(&self) -> u64 {
        self.bind_count
    }

    /// Returns the pre-bind settings.
    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    /// Starts I/O on a freshly bound transport.
    ///
    /// Events from the transport are stamped with its ID. Returns the ID of
    /// the transport that was started, or `None` if nothing needed starting.
    pub fn start_transport(&mut self, events: &EventSink) -> Option<TransportId> {
        let transport = self.transport.as_mut()?;
        if transport.is_started() {
            return None;
        }
        let id = transport.id();
        debug!(connector = %events.connector(), transport = %id, "starting transport");
        transport.start(events.for_transport(id));
        Some(id)
    }
}

impl Connection for Endpoint {
    fn is_active(&self) -> bool {
        self.local == EndpointState::Active && !self.released
    }

    fn transport(&self) -> Option<&dyn Transport> {
        self.transport.as_deref()
    }

    fn transport_mut(&mut self) -> Option<&mut dyn Transport> {
        match self.transport.as_mut() {
            Some(transport) => Some(transport.as_mut()),
            None => None,
        }
    }

    fn bind(&mut self, transport: Box<dyn Transport>) -> Result<(), TransportError> {
        if self.released {
            return Err(TransportError::Closed);
        }
        if self.transport.is_some() {
            return Err(TransportError::AlreadyBound);
        }
        self.transport = Some(transport);
        self.bind_count += 1;
        Ok(())
    }

    fn unbind(&mut self) -> Option<Box<dyn Transport>> {
        let mut transport = self.transport.take()?;
        transport.stop();
        Some(transport)
    }

    fn release(&mut self) {
        self.unbind();
        self.released = true;
    }

    fn settings_mut(&mut self) -> &mut ConnectionSettings {
        &mut self.settings
    }
}
