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


//! The reactor: hosts connectors and delivers their events.
//!
//! All connectors of a reactor live on the single task running
//! [`Reactor::run`]. Transports, timers and handle requests only ever queue
//! work for that task, so no two events for the same connector are ever
//! handled at once, and events are handled in the order they were queued.
//!
//! After each event the reactor:
//!
//! 1. starts any transport the connector has just bound
//! 2. publishes the connector's new [`ConnectorState`]
//! 3. forgets the connector once it is released
//!
//! Events stamped with a transport that is no longer bound, and events for
//! connectors that no longer exist, are dropped before delivery.
//!
//! # Examples
//!
//! ```rust,no_run
//! use redial::connector::ConnectorState;
//! use redial::options::{ConnectionOptions, ReconnectOptions};
//! use redial::reactor::Reactor;
//! use redial::transport::TcpTransportFactory;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), redial::RedialError> {
//! let (reactor, handle) = Reactor::new(Arc::new(TcpTransportFactory::new()));
//! tokio::spawn(reactor.run());
//!
//! let options = ConnectionOptions::new().with_reconnect(ReconnectOptions::default());
//! let connection = handle.connect("amqp://broker.local", options).await?;
//! connection.wait_for(ConnectorState::Open).await?;
//!
//! connection.close().await?;
//! handle.shutdown();
//! # Ok(())
//! # }
//! ```

use crate::connection::{Connection, Endpoint};
use crate::connector::{Connector, ConnectorState};
use crate::error::RedialError;
use crate::event::{ConnectorEvent, ConnectorId, Dispatch, EventSink};
use crate::options::ConnectionOptions;
use crate::reconnect::{ReconnectMetrics, ReconnectPolicy};
use crate::scheduler::{Scheduler, TokioScheduler};
use crate::transport::{Address, TransportFactory};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, trace};

type Reply<T> = oneshot::Sender<Result<T, RedialError>>;

enum Command {
    Connect {
        address: Address,
        options: ConnectionOptions,
        policy: Option<Box<dyn ReconnectPolicy>>,
        reply: Reply<ConnectionHandle>,
    },
    Close {
        id: ConnectorId,
        reply: Reply<()>,
    },
    Metrics {
        id: ConnectorId,
        reply: Reply<ReconnectMetrics>,
    },
    Shutdown,
}

struct Slot {
    connector: Connector<Endpoint>,
    sink: EventSink,
    state: watch::Sender<ConnectorState>,
}

/// Single-task host for connectors.
pub struct Reactor {
    factory: Arc<dyn TransportFactory>,
    scheduler: Arc<dyn Scheduler>,
    commands: mpsc::UnboundedReceiver<Command>,
    events_tx: mpsc::UnboundedSender<Dispatch>,
    events: mpsc::UnboundedReceiver<Dispatch>,
    connectors: HashMap<ConnectorId, Slot>,
    // Weak, so that only handles keep the command channel open.
    commands_tx: mpsc::WeakUnboundedSender<Command>,
}

impl Reactor {
    /// Creates a reactor whose connectors dial through `factory`.
    ///
    /// The reactor does nothing until [`run`](Reactor::run) is awaited.
    pub fn new(factory: Arc<dyn TransportFactory>) -> (Self, ReactorHandle) {
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (events_tx, events) = mpsc::unbounded_channel();
        let reactor = Self {
            factory,
            scheduler: Arc::new(TokioScheduler::new(events_tx.clone())),
            commands,
            events_tx,
            events,
            connectors: HashMap::new(),
            commands_tx: commands_tx.downgrade(),
        };
        let handle = ReactorHandle {
            commands: commands_tx,
        };
        (reactor, handle)
    }

    /// Processes events and requests until shut down.
    ///
    /// Returns after [`ReactorHandle::shutdown`], or once every
    /// [`ReactorHandle`] and [`ConnectionHandle`] has been dropped. Any
    /// connection still alive at that point is closed and released.
    pub async fn run(mut self) {
        info!("reactor started");
        loop {
            tokio::select! {
                biased;
                Some(dispatch) = self.events.recv() => self.deliver(dispatch),
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.execute(command),
                },
            }
        }

        self.shutdown();
        info!("reactor stopped");
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::Connect {
                address,
                options,
                policy,
                reply,
            } => {
                let _ = reply.send(self.connect(address, options, policy));
            }
            Command::Close { id, reply } => {
                let _ = reply.send(self.close(id));
            }
            Command::Metrics { id, reply } => {
                let metrics = self
                    .connectors
                    .get(&id)
                    .map(|slot| slot.connector.metrics().clone())
                    .ok_or(RedialError::UnknownConnector(id));
                let _ = reply.send(metrics);
            }
            Command::Shutdown => {}
        }
    }

    fn connect(
        &mut self,
        address: Address,
        options: ConnectionOptions,
        policy: Option<Box<dyn ReconnectPolicy>>,
    ) -> Result<ConnectionHandle, RedialError> {
        let commands = self
            .commands_tx
            .upgrade()
            .ok_or(RedialError::ReactorClosed)?;
        let id = ConnectorId::next();
        debug!(connector = %id, %address, "registering connection");

        let mut endpoint = Endpoint::new();
        endpoint.settings_mut().container_id = format!("redial-{}", id.as_u64());
        options.apply_unbound(&mut endpoint);
        endpoint.open();

        let mut connector = Connector::new(
            id,
            endpoint,
            address,
            options,
            Arc::clone(&self.factory),
            Arc::clone(&self.scheduler),
        );
        if let Some(policy) = policy {
            connector.set_reconnect_policy(Some(policy));
        }

        let (state, state_rx) = watch::channel(connector.state());
        self.connectors.insert(
            id,
            Slot {
                connector,
                sink: EventSink::new(id, self.events_tx.clone()),
                state,
            },
        );

        self.handle_event(id, ConnectorEvent::ConnectionInit);
        self.handle_event(id, ConnectorEvent::ConnectionLocalOpen);

        Ok(ConnectionHandle {
            id,
            state: state_rx,
            reactor: ReactorHandle { commands },
        })
    }

    fn close(&mut self, id: ConnectorId) -> Result<(), RedialError> {
        let slot = self
            .connectors
            .get_mut(&id)
            .ok_or(RedialError::UnknownConnector(id))?;
        let reported = slot
            .connector
            .connection_mut()
            .map(|endpoint| endpoint.close())
            .unwrap_or(false);
        debug!(connector = %id, transport_closing = reported, "closing connection");
        if !reported {
            // Nothing will report the close; deliver it ourselves.
            self.handle_event(id, ConnectorEvent::TransportClosed);
        }
        Ok(())
    }

    fn deliver(&mut self, dispatch: Dispatch) {
        let Some(slot) = self.connectors.get(&dispatch.connector) else {
            trace!(connector = %dispatch.connector, event = %dispatch.event, "dropping event for unknown connector");
            return;
        };
        if let Some(source) = dispatch.source {
            let bound = slot
                .connector
                .connection()
                .and_then(|endpoint| endpoint.transport())
                .map(|transport| transport.id());
            if bound != Some(source) {
                trace!(
                    connector = %dispatch.connector,
                    transport = %source,
                    event = %dispatch.event,
                    "dropping event from stale transport"
                );
                return;
            }
        }
        self.handle_event(dispatch.connector, dispatch.event);
    }

    fn handle_event(&mut self, id: ConnectorId, event: ConnectorEvent) {
        let Some(slot) = self.connectors.get_mut(&id) else {
            return;
        };
        slot.connector.handle(event);
        if let Some(endpoint) = slot.connector.connection_mut() {
            endpoint.start_transport(&slot.sink);
        }

        let state = slot.connector.state();
        slot.state.send_if_modified(|current| {
            let changed = *current != state;
            *current = state;
            changed
        });

        if state.is_terminal() {
            debug!(connector = %id, "connector removed");
            self.connectors.remove(&id);
        }
    }

    fn shutdown(&mut self) {
        let ids: Vec<ConnectorId> = self.connectors.keys().copied().collect();
        for id in ids {
            if let Some(slot) = self.connectors.get_mut(&id) {
                if let Some(endpoint) = slot.connector.connection_mut() {
                    endpoint.close();
                }
            }
            self.handle_event(id, ConnectorEvent::TransportClosed);
        }
    }
}

impl fmt::Debug for Reactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reactor")
            .field("factory", &self.factory)
            .field("connectors", &self.connectors.len())
            .finish_non_exhaustive()
    }
}

/// Cloneable handle for submitting requests to a [`Reactor`].
#[derive(Clone)]
pub struct ReactorHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl ReactorHandle {
    /// Registers a connection to `address` and starts connecting.
    ///
    /// The reconnect policy, if any, is built from `options`.
    ///
    /// # Errors
    ///
    /// [`RedialError::InvalidAddress`] or [`RedialError::InvalidOptions`] for
    /// unusable input, [`RedialError::ReactorClosed`] if the reactor is gone.
    pub async fn connect(
        &self,
        address: &str,
        options: ConnectionOptions,
    ) -> Result<ConnectionHandle, RedialError> {
        self.submit_connect(address, options, None).await
    }

    /// Like [`connect`](ReactorHandle::connect), but reconnects with
    /// `policy` instead of the one described by `options`.
    pub async fn connect_with_policy(
        &self,
        address: &str,
        options: ConnectionOptions,
        policy: Box<dyn ReconnectPolicy>,
    ) -> Result<ConnectionHandle, RedialError> {
        self.submit_connect(address, options, Some(policy)).await
    }

    /// Closes the connection managed by connector `id`.
    ///
    /// The connector releases the connection once the transport has closed.
    pub async fn close(&self, id: ConnectorId) -> Result<(), RedialError> {
        self.request(|reply| Command::Close { id, reply }).await
    }

    /// Returns a snapshot of connector `id`'s reconnect counters.
    pub async fn metrics(&self, id: ConnectorId) -> Result<ReconnectMetrics, RedialError> {
        self.request(|reply| Command::Metrics { id, reply }).await
    }

    /// Asks the reactor to close every connection and stop.
    pub fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown);
    }

    /// Returns `true` while the reactor accepts requests.
    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    async fn submit_connect(
        &self,
        address: &str,
        options: ConnectionOptions,
        policy: Option<Box<dyn ReconnectPolicy>>,
    ) -> Result<ConnectionHandle, RedialError> {
        let address: Address = address.parse()?;
        options.validate()?;
        self.request(|reply| Command::Connect {
            address,
            options,
            policy,
            reply,
        })
        .await
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, RedialError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .map_err(|_| RedialError::ReactorClosed)?;
        response.await.map_err(|_| RedialError::ReactorClosed)?
    }
}

impl fmt::Debug for ReactorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactorHandle")
            .field("running", &self.is_running())
            .finish()
    }
}

/// Handle to one managed connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectorId,
    state: watch::Receiver<ConnectorState>,
    reactor: ReactorHandle,
}

impl ConnectionHandle {
    /// Returns the ID of the connector managing this connection.
    pub fn id(&self) -> ConnectorId {
        self.id
    }

    /// Returns the most recently published state.
    pub fn state(&self) -> ConnectorState {
        *self.state.borrow()
    }

    /// Returns a receiver observing every published state change.
    pub fn subscribe(&self) -> watch::Receiver<ConnectorState> {
        self.state.clone()
    }

    /// Waits until the connector reaches `target` or is released.
    ///
    /// Returns the state that ended the wait.
    pub async fn wait_for(&self, target: ConnectorState) -> Result<ConnectorState, RedialError> {
        let mut state = self.state.clone();
        let reached = state
            .wait_for(|current| *current == target || current.is_terminal())
            .await
            .map_err(|_| RedialError::ReactorClosed)?;
        Ok(*reached)
    }

    /// Closes the connection.
    pub async fn close(&self) -> Result<(), RedialError> {
        self.reactor.close(self.id).await
    }

    /// Returns a snapshot of the connector's reconnect counters.
    pub async fn metrics(&self) -> Result<ReconnectMetrics, RedialError> {
        self.reactor.metrics(self.id).await
    }
}
