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

//! TCP transport implementation.
//!
//! This transport only establishes and watches the socket. A socket that
//! connects is reported as remote-open; the protocol engine that would speak
//! over it is layered above this crate. Inbound bytes are read and dropped so
//! that a peer hang-up is noticed promptly.

use crate::event::{ConnectorEvent, EventSink};
use crate::transport::{
    Address, Transport, TransportError, TransportFactory, TransportId, TransportMetadata,
    TransportSettings,
};
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

const READ_BUFFER_SIZE: usize = 8 * 1024;

/// TCP transport dialing an [`Address`] on a tokio task.
///
/// Starting the transport spawns the I/O task, so it must happen inside a
/// tokio runtime (the reactor guarantees this).
///
/// Reported events:
///
/// - remote-open once the socket is connected
/// - transport-tail-closed when the peer closes its side (EOF)
/// - transport-closed on connect failure, connect timeout, read error,
///   idle timeout, or [`close`](Transport::close)
#[derive(Debug)]
pub struct TcpTransport {
    metadata: TransportMetadata,
    address: Address,
    settings: TransportSettings,
    events: Option<EventSink>,
    task: Option<JoinHandle<()>>,
    started: bool,
}

impl TcpTransport {
    /// Creates an unstarted transport for `address`.
    pub fn new(address: &Address) -> Self {
        Self {
            metadata: TransportMetadata::new(TransportId::next(), "tcp", address.to_string()),
            address: address.clone(),
            settings: TransportSettings::default(),
            events: None,
            task: None,
            started: false,
        }
    }

    /// Returns the settings the transport will use.
    pub fn settings(&self) -> &TransportSettings {
        &self.settings
    }

    fn abort_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Transport for TcpTransport {
    fn metadata(&self) -> &TransportMetadata {
        &self.metadata
    }

    fn configure(&mut self, settings: &TransportSettings) {
        self.settings = settings.clone();
    }

    fn start(&mut self, events: EventSink) {
        if self.started {
            return;
        }
        self.started = true;
        debug!(transport = %self.metadata.id, address = %self.address, "starting TCP transport");
        let task = tokio::spawn(run(
            self.metadata.id,
            self.address.host_port(),
            self.settings.clone(),
            events.clone(),
        ));
        self.task = Some(task);
        self.events = Some(events);
    }

    fn is_started(&self) -> bool {
        self.started
    }

    fn close(&mut self) {
        self.abort_task();
        if let Some(events) = self.events.take() {
            debug!(transport = %self.metadata.id, "closing TCP transport");
            events.emit(ConnectorEvent::TransportClosed);
        }
    }

    fn stop(&mut self) {
        self.abort_task();
        self.events = None;
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.abort_task();
    }
}

async fn run(id: TransportId, address: String, settings: TransportSettings, events: EventSink) {
    match drive(&address, &settings, &events).await {
        Ok(()) => {
            debug!(transport = %id, %address, "peer closed the connection");
            events.emit(ConnectorEvent::TransportTailClosed);
        }
        Err(error) => {
            warn!(
                transport = %id,
                %address,
                recoverable = error.is_recoverable(),
                "transport failed: {}",
                error
            );
            events.emit(ConnectorEvent::TransportClosed);
        }
    }
}

async fn drive(
    address: &str,
    settings: &TransportSettings,
    events: &EventSink,
) -> Result<(), TransportError> {
    let mut stream = match timeout(settings.connect_timeout, TcpStream::connect(address)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(source)) => {
            return Err(TransportError::ConnectionFailed {
                address: address.to_string(),
                source,
            });
        }
        Err(_) => {
            return Err(TransportError::Timeout {
                duration: settings.connect_timeout,
            });
        }
    };
    stream.set_nodelay(settings.tcp_nodelay)?;
    events.emit(ConnectorEvent::ConnectionRemoteOpen);

    let mut buffer = vec![0u8; READ_BUFFER_SIZE];
    loop {
        let read = match settings.idle_timeout {
            Some(idle) => timeout(idle, stream.read(&mut buffer))
                .await
                .map_err(|_| TransportError::Timeout { duration: idle })?,
            None => stream.read(&mut buffer).await,
        };
        match read {
            Ok(0) => return Ok(()),
            Ok(n) => trace!(bytes = n, "discarding inbound bytes"),
            Err(source) => {
                return Err(TransportError::ConnectionLost {
                    reason: "read failed".to_string(),
                    source: Some(source),
                });
            }
        }
    }
}

/// Factory producing [`TcpTransport`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpTransportFactory;

impl TcpTransportFactory {
    /// Creates a TCP transport factory.
    pub fn new() -> Self {
        Self
    }
}

impl TransportFactory for TcpTransportFactory {
    fn create(&self, address: &Address) -> Box<dyn Transport> {
        Box::new(TcpTransport::new(address))
    }
}
