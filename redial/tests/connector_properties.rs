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


//! Behavioral properties of the connector state machine.
//!
//! These tests drive a [`Connector`] directly, event by event, with an
//! in-memory transport factory and a manual scheduler, so every bind, unbind,
//! release and timer is observable.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use redial::connection::{Connection, ConnectionSettings, Endpoint};
use redial::connector::{Connector, ConnectorState};
use redial::event::{ConnectorEvent, ConnectorId};
use redial::options::ConnectionOptions;
use redial::reconnect::{Backoff, FixedDelay, ReconnectPolicy};
use redial::scheduler::ManualScheduler;
use redial::transport::{MemoryTransportFactory, Transport, TransportError};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Policy replaying a fixed list of signed millisecond delays, then giving up.
#[derive(Debug, Clone)]
struct ScriptedPolicy {
    script: Vec<i64>,
    next: usize,
    calls: Arc<Mutex<usize>>,
    resets: Arc<Mutex<usize>>,
}

impl ScriptedPolicy {
    fn new(script: &[i64]) -> Self {
        Self {
            script: script.to_vec(),
            next: 0,
            calls: Arc::new(Mutex::new(0)),
            resets: Arc::new(Mutex::new(0)),
        }
    }
}

impl ReconnectPolicy for ScriptedPolicy {
    fn next_delay(&mut self, _now: Instant) -> Backoff {
        *self.calls.lock() += 1;
        let millis = self.script.get(self.next).copied().unwrap_or(-1);
        self.next += 1;
        Backoff::from_millis(millis)
    }

    fn reset(&mut self) {
        *self.resets.lock() += 1;
        self.next = 0;
    }

    fn name(&self) -> &str {
        "Scripted"
    }

    fn box_clone(&self) -> Box<dyn ReconnectPolicy> {
        Box::new(self.clone())
    }
}

#[derive(Debug, Default)]
struct ConnectionLog {
    binds: usize,
    unbinds: usize,
    releases: usize,
    max_bound: usize,
}

/// Connection that accepts any number of binds and records what happened,
/// so a connector that double-binds is caught instead of refused.
struct RecordingConnection {
    active: bool,
    released: bool,
    transports: Vec<Box<dyn Transport>>,
    settings: ConnectionSettings,
    log: Arc<Mutex<ConnectionLog>>,
}

impl RecordingConnection {
    fn new() -> (Self, Arc<Mutex<ConnectionLog>>) {
        let log = Arc::new(Mutex::new(ConnectionLog::default()));
        let connection = Self {
            active: true,
            released: false,
            transports: Vec::new(),
            settings: ConnectionSettings::default(),
            log: Arc::clone(&log),
        };
        (connection, log)
    }
}

impl Connection for RecordingConnection {
    fn is_active(&self) -> bool {
        self.active && !self.released
    }

    fn transport(&self) -> Option<&dyn Transport> {
        self.transports.last().map(|transport| transport.as_ref())
    }

    fn transport_mut(&mut self) -> Option<&mut dyn Transport> {
        match self.transports.last_mut() {
            Some(transport) => Some(transport.as_mut()),
            None => None,
        }
    }

    fn bind(&mut self, transport: Box<dyn Transport>) -> Result<(), TransportError> {
        self.transports.push(transport);
        let mut log = self.log.lock();
        log.binds += 1;
        log.max_bound = log.max_bound.max(self.transports.len());
        Ok(())
    }

    fn unbind(&mut self) -> Option<Box<dyn Transport>> {
        let mut transport = self.transports.pop()?;
        transport.stop();
        self.log.lock().unbinds += 1;
        Some(transport)
    }

    fn release(&mut self) {
        self.released = true;
        self.transports.clear();
        self.log.lock().releases += 1;
    }

    fn settings_mut(&mut self) -> &mut ConnectionSettings {
        &mut self.settings
    }
}

fn connector<C: Connection>(
    connection: C,
    policy: Option<Box<dyn ReconnectPolicy>>,
) -> (Connector<C>, MemoryTransportFactory, ManualScheduler) {
    let factory = MemoryTransportFactory::new();
    let scheduler = ManualScheduler::new();
    let mut connector = Connector::new(
        ConnectorId::next(),
        connection,
        "localhost".parse().unwrap(),
        ConnectionOptions::new(),
        Arc::new(factory.clone()),
        Arc::new(scheduler.clone()),
    );
    connector.set_reconnect_policy(policy);
    (connector, factory, scheduler)
}

fn open_endpoint() -> Endpoint {
    let mut endpoint = Endpoint::new();
    endpoint.open();
    endpoint
}

/// Fires the oldest pending timer and delivers it, as a reactor would.
fn fire(connector: &mut Connector<impl Connection>, scheduler: &ManualScheduler) {
    assert_eq!(scheduler.fire_next(), Some(connector.id()));
    connector.handle(ConnectorEvent::TimerFired);
}

/// Test that random event sequences never double-bind and never leave a
/// timer pending next to a bound transport.
#[test]
fn test_random_sequences_keep_single_transport_and_single_timer() {
    const EVENTS: [ConnectorEvent; 6] = [
        ConnectorEvent::ConnectionInit,
        ConnectorEvent::ConnectionLocalOpen,
        ConnectorEvent::ConnectionRemoteOpen,
        ConnectorEvent::TransportTailClosed,
        ConnectorEvent::TransportClosed,
        ConnectorEvent::TimerFired,
    ];

    for seed in 0..64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let (connection, log) = RecordingConnection::new();
        let policy = ScriptedPolicy::new(&[0, 50, 0, 100, 200, 0, 400]);
        let (mut connector, _factory, scheduler) = connector(connection, Some(Box::new(policy)));

        for _ in 0..200 {
            let event = EVENTS[rng.gen_range(0..EVENTS.len())];
            connector.handle(event);

            let bound = connector
                .connection()
                .is_some_and(|connection| connection.transport().is_some());
            assert!(log.lock().max_bound <= 1, "seed {}: double bind", seed);
            assert!(scheduler.pending_count() <= 1, "seed {}: two timers", seed);
            assert!(
                !(bound && scheduler.pending_count() > 0),
                "seed {}: timer pending while transport bound",
                seed
            );
            assert_eq!(connector.has_pending_timer(), scheduler.pending_count() == 1);
        }
        assert!(log.lock().releases <= 1, "seed {}: released twice", seed);
    }
}

/// Test that transport-closed on a released connector is a no-op, twice.
#[test]
fn test_transport_closed_after_release_is_idempotent() {
    let (connection, log) = RecordingConnection::new();
    let (mut connector, factory, scheduler) = connector(connection, None);
    connector.handle(ConnectorEvent::ConnectionLocalOpen);

    connector.handle(ConnectorEvent::TransportClosed);
    assert_eq!(connector.state(), ConnectorState::Released);
    assert_eq!(log.lock().releases, 1);

    connector.handle(ConnectorEvent::TransportClosed);
    connector.handle(ConnectorEvent::TransportClosed);

    assert_eq!(log.lock().releases, 1);
    assert_eq!(factory.created_count(), 1);
    assert_eq!(scheduler.scheduled_count(), 0);
}

/// Test that a fixed 200ms policy schedules one 200ms timer per failure and
/// every firing binds exactly one new transport.
#[test]
fn test_fixed_delay_schedules_one_timer_per_failure() {
    const N: usize = 5;
    let policy = FixedDelay::new(Duration::from_millis(200));
    let (mut connector, factory, scheduler) = connector(open_endpoint(), Some(Box::new(policy)));
    connector.handle(ConnectorEvent::ConnectionLocalOpen);

    for i in 1..=N {
        connector.handle(ConnectorEvent::TransportClosed);
        assert_eq!(connector.state(), ConnectorState::RetryScheduled);
        assert_eq!(scheduler.scheduled_count(), i);
        assert_eq!(factory.created_count(), i);

        fire(&mut connector, &scheduler);
        assert_eq!(connector.state(), ConnectorState::Connecting);
        assert_eq!(factory.created_count(), i + 1);
    }

    assert_eq!(scheduler.delays(), vec![Duration::from_millis(200); N]);
    assert_eq!(connector.connection().unwrap().bind_count(), N as u64 + 1);
}

/// Test that a policy giving up on its third call releases after two
/// retries and schedules nothing afterwards.
#[test]
fn test_give_up_on_third_call_releases() {
    let policy = ScriptedPolicy::new(&[100, 100, -1]);
    let calls = Arc::clone(&policy.calls);
    let (mut connector, factory, scheduler) = connector(open_endpoint(), Some(Box::new(policy)));
    connector.handle(ConnectorEvent::ConnectionLocalOpen);

    for _ in 0..2 {
        connector.handle(ConnectorEvent::TransportClosed);
        fire(&mut connector, &scheduler);
    }
    connector.handle(ConnectorEvent::TransportClosed);

    assert_eq!(connector.state(), ConnectorState::Released);
    assert_eq!(factory.created_count(), 3);
    assert_eq!(factory.live_count(), 0);

    connector.handle(ConnectorEvent::TransportClosed);
    assert_eq!(scheduler.scheduled_count(), 2);
    assert_eq!(scheduler.pending_count(), 0);
    assert_eq!(*calls.lock(), 3);
}

/// Test that remote-open between failures resets the policy.
#[test]
fn test_remote_open_resets_backoff() {
    let policy = ScriptedPolicy::new(&[10, 20, 40]);
    let resets = Arc::clone(&policy.resets);
    let (mut connector, _factory, scheduler) = connector(open_endpoint(), Some(Box::new(policy)));
    connector.handle(ConnectorEvent::ConnectionLocalOpen);

    connector.handle(ConnectorEvent::TransportClosed);
    fire(&mut connector, &scheduler);
    connector.handle(ConnectorEvent::TransportClosed);
    fire(&mut connector, &scheduler);

    connector.handle(ConnectorEvent::ConnectionRemoteOpen);
    assert_eq!(connector.state(), ConnectorState::Open);
    assert_eq!(*resets.lock(), 1);

    connector.handle(ConnectorEvent::TransportClosed);
    assert_eq!(
        scheduler.delays(),
        vec![
            Duration::from_millis(10),
            Duration::from_millis(20),
            Duration::from_millis(10)
        ]
    );
}

/// Test the [0, 50, -1] scenario: immediate reconnect, delayed reconnect,
/// then release, with no extra binds.
#[test]
fn test_immediate_then_delayed_then_release() {
    let policy = ScriptedPolicy::new(&[0, 50, -1]);
    let (connection, log) = RecordingConnection::new();
    let (mut connector, factory, scheduler) = connector(connection, Some(Box::new(policy)));
    connector.handle(ConnectorEvent::ConnectionLocalOpen);
    assert_eq!(log.lock().binds, 1);

    // 0: reconnect on the spot.
    connector.handle(ConnectorEvent::TransportClosed);
    assert_eq!(log.lock().binds, 2);
    assert_eq!(scheduler.scheduled_count(), 0);
    assert_eq!(connector.state(), ConnectorState::Connecting);

    // 50: reconnect once the timer fires.
    connector.handle(ConnectorEvent::TransportClosed);
    assert_eq!(log.lock().binds, 2);
    assert_eq!(scheduler.delays(), vec![Duration::from_millis(50)]);
    fire(&mut connector, &scheduler);
    assert_eq!(log.lock().binds, 3);

    // -1: give up.
    connector.handle(ConnectorEvent::TransportClosed);
    assert_eq!(connector.state(), ConnectorState::Released);

    let log = log.lock();
    assert_eq!(log.binds, 3);
    assert_eq!(log.unbinds, 3);
    assert_eq!(log.releases, 1);
    assert_eq!(log.max_bound, 1);
    assert_eq!(factory.created_count(), 3);
    assert_eq!(scheduler.scheduled_count(), 1);
}

/// Test that a timer firing after the connection was closed locally does
/// not reconnect.
#[test]
fn test_timer_after_local_close_does_not_reconnect() {
    let policy = FixedDelay::new(Duration::from_millis(200));
    let (mut connector, factory, scheduler) = connector(open_endpoint(), Some(Box::new(policy)));
    connector.handle(ConnectorEvent::ConnectionLocalOpen);
    connector.handle(ConnectorEvent::TransportClosed);

    connector.connection_mut().unwrap().close();
    fire(&mut connector, &scheduler);

    assert_eq!(connector.state(), ConnectorState::Released);
    assert_eq!(factory.created_count(), 1);
}

/// Test that dropping a connector with a pending retry cancels the timer.
#[test]
fn test_dropping_connector_cancels_timer() {
    let policy = FixedDelay::new(Duration::from_millis(200));
    let (mut connector, _factory, scheduler) = connector(open_endpoint(), Some(Box::new(policy)));
    connector.handle(ConnectorEvent::ConnectionLocalOpen);
    connector.handle(ConnectorEvent::TransportClosed);
    assert_eq!(scheduler.pending_count(), 1);

    drop(connector);

    assert_eq!(scheduler.pending_count(), 0);
    assert_eq!(scheduler.fire_next(), None);
}
