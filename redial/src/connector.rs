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


//! The connector: binding, failure detection and reconnect decisions for one
//! logical connection.
//!
//! A [`Connector`] reacts to lifecycle events, one at a time, on the task
//! that owns it. It never reports errors to its caller: every failure
//! arrives as a transport-closed event, and the only question the connector
//! answers is whether, and when, to bind a new transport.
//!
//! ```text
//!  Unbound ──local-open──► Connecting ──remote-open──► Open
//!                             ▲   │                     │
//!                  timer-fired│   └─────transport-closed┘
//!                             │              │
//!                      RetryScheduled ◄──────┤ delay > 0
//!                                            │ delay = 0: Connecting
//!                                            │ give up / no policy / inactive
//!                                            ▼
//!                                         Released
//! ```

use crate::connection::Connection;
use crate::event::{ConnectorEvent, ConnectorId};
use crate::options::ConnectionOptions;
use crate::reconnect::{Backoff, ReconnectMetrics, ReconnectPolicy};
use crate::scheduler::{Scheduler, TimerHandle};
use crate::transport::{Address, TransportFactory};
use std::fmt;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

/// Observable state of a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectorState {
    /// The connection has never been bound.
    Unbound,
    /// A transport is bound and the peer has not opened yet.
    Connecting,
    /// The peer opened the connection.
    Open,
    /// The transport failed and a retry timer is pending.
    RetryScheduled,
    /// The connection was released. Terminal.
    Released,
}

impl ConnectorState {
    /// Returns `true` for [`Released`](ConnectorState::Released).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Released)
    }
}

impl fmt::Display for ConnectorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unbound => "unbound",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::RetryScheduled => "retry-scheduled",
            Self::Released => "released",
        };
        f.write_str(name)
    }
}

/// Named handlers for every lifecycle event.
///
/// Handlers are called synchronously and return nothing. All of them default
/// to doing nothing, so an implementation only overrides what it cares
/// about.
pub trait ConnectionHandler {
    /// The connection object was created.
    fn on_connection_init(&mut self) {}

    /// The local side opened the connection.
    fn on_connection_local_open(&mut self) {}

    /// The remote peer opened the connection.
    fn on_connection_remote_open(&mut self) {}

    /// The transport's read side closed.
    fn on_transport_tail_closed(&mut self) {}

    /// The transport closed.
    fn on_transport_closed(&mut self) {}

    /// A retry timer elapsed.
    fn on_timer_fired(&mut self) {}
}

/// Routes `event` to the matching handler method.
pub fn dispatch<H: ConnectionHandler + ?Sized>(handler: &mut H, event: ConnectorEvent) {
    match event {
        ConnectorEvent::ConnectionInit => handler.on_connection_init(),
        ConnectorEvent::ConnectionLocalOpen => handler.on_connection_local_open(),
        ConnectorEvent::ConnectionRemoteOpen => handler.on_connection_remote_open(),
        ConnectorEvent::TransportTailClosed => handler.on_transport_tail_closed(),
        ConnectorEvent::TransportClosed => handler.on_transport_closed(),
        ConnectorEvent::TimerFired => handler.on_timer_fired(),
    }
}

/// Lifecycle controller for one logical connection.
///
/// The connector owns its connection exclusively until it releases it. It
/// binds a fresh transport from its factory on local-open and on every
/// retry, and consults its [`ReconnectPolicy`] whenever a transport closes
/// on a connection that is still active:
///
/// - [`Backoff::GiveUp`]: release the connection
/// - [`Backoff::Immediate`]: bind a new transport right away
/// - [`Backoff::After`]: schedule a timer and bind when it fires
///
/// Without a policy the first transport failure releases the connection.
///
/// # Examples
///
/// ```rust
/// use redial::connection::Endpoint;
/// use redial::connector::{Connector, ConnectorState};
/// use redial::event::{ConnectorEvent, ConnectorId};
/// use redial::options::{ConnectionOptions, ReconnectOptions};
/// use redial::scheduler::ManualScheduler;
/// use redial::transport::MemoryTransportFactory;
/// use std::sync::Arc;
///
/// let factory = MemoryTransportFactory::new();
/// let scheduler = ManualScheduler::new();
/// let options = ConnectionOptions::new().with_reconnect(ReconnectOptions::default());
///
/// let mut endpoint = Endpoint::new();
/// endpoint.open();
///
/// let mut connector = Connector::new(
///     ConnectorId::new(1),
///     endpoint,
///     "localhost".parse().unwrap(),
///     options,
///     Arc::new(factory.clone()),
///     Arc::new(scheduler.clone()),
/// );
///
/// connector.handle(ConnectorEvent::ConnectionLocalOpen);
/// assert_eq!(connector.state(), ConnectorState::Connecting);
///
/// // The default reconnect timer retries the first failure immediately...
/// connector.handle(ConnectorEvent::TransportClosed);
/// assert_eq!(factory.created_count(), 2);
///
/// // ...and the second one after 100ms.
/// connector.handle(ConnectorEvent::TransportClosed);
/// assert_eq!(connector.state(), ConnectorState::RetryScheduled);
/// assert_eq!(scheduler.pending_count(), 1);
/// ```
pub struct Connector<C: Connection> {
    id: ConnectorId,
    connection: Option<C>,
    address: Address,
    options: ConnectionOptions,
    factory: Arc<dyn TransportFactory>,
    scheduler: Arc<dyn Scheduler>,
    reconnect_policy: Option<Box<dyn ReconnectPolicy>>,
    pending_timer: Option<TimerHandle>,
    remote_open: bool,
    metrics: ReconnectMetrics,
}

impl<C: Connection> Connector<C> {
    /// Creates a connector managing `connection`.
    ///
    /// The reconnect policy is built from `options`. Pre-bind options are
    /// expected to have been applied to `connection` already.
    pub fn new(
        id: ConnectorId,
        connection: C,
        address: Address,
        options: ConnectionOptions,
        factory: Arc<dyn TransportFactory>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        let reconnect_policy = options.reconnect_policy();
        Self {
            id,
            connection: Some(connection),
            address,
            options,
            factory,
            scheduler,
            reconnect_policy,
            pending_timer: None,
            remote_open: false,
            metrics: ReconnectMetrics::new(),
        }
    }

    /// Returns the connector's ID.
    pub fn id(&self) -> ConnectorId {
        self.id
    }

    /// Returns the address transports are created for.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Returns the options snapshot.
    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }

    /// Returns the connection, or `None` once released.
    pub fn connection(&self) -> Option<&C> {
        self.connection.as_ref()
    }

    /// Returns the connection mutably, or `None` once released.
    pub fn connection_mut(&mut self) -> Option<&mut C> {
        self.connection.as_mut()
    }

    /// Returns the current reconnect policy.
    pub fn reconnect_policy(&self) -> Option<&dyn ReconnectPolicy> {
        self.reconnect_policy.as_deref()
    }

    /// Replaces the reconnect policy. The previous one is dropped.
    ///
    /// The new policy is consulted from the next transport failure on.
    /// `None` turns reconnecting off.
    pub fn set_reconnect_policy(&mut self, policy: Option<Box<dyn ReconnectPolicy>>) {
        debug!(
            connector = %self.id,
            policy = policy.as_ref().map_or("none", |p| p.name()),
            "reconnect policy replaced"
        );
        self.reconnect_policy = policy;
    }

    /// Returns the connector's reconnect counters.
    pub fn metrics(&self) -> &ReconnectMetrics {
        &self.metrics
    }

    /// Returns `true` while a retry timer is outstanding.
    pub fn has_pending_timer(&self) -> bool {
        self.pending_timer.is_some()
    }

    /// Returns `true` once the connection has been released.
    pub fn is_released(&self) -> bool {
        self.connection.is_none()
    }

    /// Returns the connector's observable state.
    pub fn state(&self) -> ConnectorState {
        let Some(connection) = self.connection.as_ref() else {
            return ConnectorState::Released;
        };
        if self.pending_timer.is_some() {
            ConnectorState::RetryScheduled
        } else if connection.transport().is_none() {
            ConnectorState::Unbound
        } else if self.remote_open {
            ConnectorState::Open
        } else {
            ConnectorState::Connecting
        }
    }

    /// Delivers one lifecycle event.
    pub fn handle(&mut self, event: ConnectorEvent) {
        trace!(connector = %self.id, %event, state = %self.state(), "handling event");
        dispatch(self, event);
    }

    /// Creates a transport, binds it and applies post-bind options.
    fn connect(&mut self) {
        let Some(connection) = self.connection.as_mut() else {
            return;
        };
        let transport = self.factory.create(&self.address);
        let transport_id = transport.id();
        if let Err(error) = connection.bind(transport) {
            // A failed bind leaves the connection as it was; the connector
            // waits for the next event like it would after any failure.
            warn!(connector = %self.id, transport = %transport_id, "bind failed: {}", error);
            return;
        }
        self.options.apply_bound(connection);
        self.remote_open = false;
        self.metrics.record_attempt();
        debug!(
            connector = %self.id,
            transport = %transport_id,
            address = %self.address,
            attempt = self.metrics.total_attempts,
            "transport bound"
        );
    }

    /// Cancels any retry and gives up the connection for good.
    fn release(&mut self) {
        if let Some(timer) = self.pending_timer.take() {
            timer.cancel();
        }
        self.remote_open = false;
        if let Some(mut connection) = self.connection.take() {
            connection.release();
            info!(connector = %self.id, address = %self.address, "connection released");
        }
    }
}

impl<C: Connection> ConnectionHandler for Connector<C> {
    fn on_connection_init(&mut self) {
        trace!(connector = %self.id, "connection initialized");
    }

    fn on_connection_local_open(&mut self) {
        let unbound = self
            .connection
            .as_ref()
            .is_some_and(|connection| connection.transport().is_none());
        if unbound && self.pending_timer.is_none() {
            self.connect();
        }
    }

    fn on_connection_remote_open(&mut self) {
        if self.connection.is_none() {
            return;
        }
        self.remote_open = true;
        self.metrics.record_success();
        if let Some(policy) = self.reconnect_policy.as_mut() {
            policy.reset();
        }
        info!(connector = %self.id, address = %self.address, "connection open");
    }

    fn on_transport_tail_closed(&mut self) {
        self.on_transport_closed();
    }

    fn on_transport_closed(&mut self) {
        self.remote_open = false;
        let Some(connection) = self.connection.as_mut() else {
            trace!(connector = %self.id, "transport closed after release");
            return;
        };
        if !connection.is_active() {
            debug!(connector = %self.id, "transport closed on inactive connection");
            self.release();
            return;
        }
        let Some(policy) = self.reconnect_policy.as_mut() else {
            debug!(connector = %self.id, "transport closed, reconnect disabled");
            self.release();
            return;
        };

        connection.unbind();
        let backoff = policy.next_delay(Instant::now());
        self.metrics.record_failure(backoff);
        // The new backoff supersedes any retry still outstanding.
        if let Some(previous) = self.pending_timer.take() {
            previous.cancel();
        }

        match backoff {
            Backoff::GiveUp => {
                warn!(
                    connector = %self.id,
                    address = %self.address,
                    failures = self.metrics.consecutive_failures,
                    policy = policy.name(),
                    "reconnect attempts exhausted"
                );
                self.release();
            }
            Backoff::Immediate => {
                debug!(connector = %self.id, "reconnecting immediately");
                self.connect();
            }
            Backoff::After(delay) => {
                debug!(
                    connector = %self.id,
                    delay_ms = backoff.as_millis(),
                    "reconnect scheduled"
                );
                self.pending_timer = Some(self.scheduler.schedule(delay, self.id));
            }
        }
    }

    fn on_timer_fired(&mut self) {
        self.pending_timer = None;
        let status = self
            .connection
            .as_ref()
            .map(|connection| (connection.is_active(), connection.transport().is_some()));
        match status {
            None => trace!(connector = %self.id, "timer fired after release"),
            Some((false, _)) => {
                debug!(connector = %self.id, "timer fired on inactive connection");
                self.release();
            }
            Some((true, true)) => {
                debug!(connector = %self.id, "timer fired while already bound");
            }
            Some((true, false)) => {
                debug!(connector = %self.id, "retry timer elapsed, reconnecting");
                self.connect();
            }
        }
    }
}

impl<C: Connection> fmt::Debug for Connector<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connector")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("address", &self.address)
            .field("reconnect_policy", &self.reconnect_policy)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}
