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


//! Integration tests reconnecting over real TCP sockets.

use redial::connector::ConnectorState;
use redial::options::{ConnectionOptions, ReconnectOptions};
use redial::reactor::{ConnectionHandle, Reactor, ReactorHandle};
use redial::transport::TcpTransportFactory;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

fn start() -> ReactorHandle {
    let (reactor, handle) = Reactor::new(Arc::new(TcpTransportFactory::new()));
    tokio::spawn(reactor.run());
    handle
}

async fn accept(listener: &TcpListener) -> TcpStream {
    let (socket, _) = timeout(WAIT, listener.accept())
        .await
        .expect("timed out waiting for connection")
        .unwrap();
    socket
}

async fn reach(connection: &ConnectionHandle, target: ConnectorState) -> ConnectorState {
    timeout(WAIT, connection.wait_for(target))
        .await
        .expect("timed out waiting for state")
        .unwrap()
}

/// Test that a dropped socket is redialed and reopened.
#[tokio::test]
async fn test_reconnects_after_peer_drop() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = start();

    let options = ConnectionOptions::new().with_reconnect(ReconnectOptions::default());
    let connection = handle
        .connect(&format!("127.0.0.1:{}", port), options)
        .await
        .unwrap();

    let first = accept(&listener).await;
    assert_eq!(reach(&connection, ConnectorState::Open).await, ConnectorState::Open);

    drop(first);
    let _second = accept(&listener).await;
    assert_eq!(reach(&connection, ConnectorState::Open).await, ConnectorState::Open);

    let metrics = connection.metrics().await.unwrap();
    assert_eq!(metrics.successful_connections, 2);
    assert_eq!(metrics.total_attempts, 2);
    assert_eq!(metrics.immediate_retries, 1);

    handle.shutdown();
}

/// Test that a peer that never answers exhausts the retry budget.
#[tokio::test]
async fn test_refused_connection_gives_up() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let handle = start();

    let options = ConnectionOptions::new().with_reconnect(ReconnectOptions {
        first_delay_ms: 10,
        max_retries: Some(2),
        ..Default::default()
    });
    let connection = handle
        .connect(&format!("127.0.0.1:{}", port), options)
        .await
        .unwrap();

    assert_eq!(
        reach(&connection, ConnectorState::Open).await,
        ConnectorState::Released
    );
}

/// Test that closing an open connection hangs up the socket.
#[tokio::test]
async fn test_close_hangs_up() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = start();

    let options = ConnectionOptions::new()
        .with_reconnect(ReconnectOptions::default())
        .with_connect_timeout(Duration::from_secs(1));
    let connection = handle
        .connect(&format!("127.0.0.1:{}", port), options)
        .await
        .unwrap();
    let mut peer = accept(&listener).await;
    reach(&connection, ConnectorState::Open).await;

    connection.close().await.unwrap();
    assert_eq!(
        reach(&connection, ConnectorState::Released).await,
        ConnectorState::Released
    );

    let mut buffer = [0u8; 16];
    let read = timeout(WAIT, peer.read(&mut buffer))
        .await
        .expect("peer was not hung up on")
        .unwrap_or(0);
    assert_eq!(read, 0);
}
