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


//! Reconnecting TCP client example.
//!
//! Dials an address and keeps the connection up, printing every state change.
//! Reconnect behavior comes from a JSON options document.
//!
//! # Running the Example
//! Start something listening, for example:
//! ```bash
//! nc -lk 5672
//! ```
//!
//! Then run this client:
//! ```bash
//! RUST_LOG=redial=debug cargo run --example tcp_reconnect -- 127.0.0.1:5672
//! ```
//!
//! Stop and restart the listener to watch the connector back off and redial.
//! With no listener at all the client gives up after its retry budget.

use redial::connector::ConnectorState;
use redial::options::ConnectionOptions;
use redial::reactor::Reactor;
use redial::transport::TcpTransportFactory;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const OPTIONS: &str = r#"{
    "container_id": "tcp-reconnect-example",
    "connect_timeout_ms": 2000,
    "idle_timeout_ms": 60000,
    "reconnect": {
        "first_delay_ms": 0,
        "increment_ms": 250,
        "max_delay_ms": 5000,
        "max_retries": 12
    }
}"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("redial=info")),
        )
        .init();

    let address = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:5672".to_string());
    let options = ConnectionOptions::from_json(OPTIONS)?;

    println!("=== Reconnecting TCP Client Example ===\n");

    let (reactor, handle) = Reactor::new(Arc::new(TcpTransportFactory::new()));
    let reactor = tokio::spawn(reactor.run());

    let connection = handle.connect(&address, options).await?;
    println!("✓ Registered {} for {}", connection.id(), address);

    let mut states = connection.subscribe();
    loop {
        let state = *states.borrow_and_update();
        println!("  state: {}", state);
        if state.is_terminal() {
            break;
        }
        if states.changed().await.is_err() {
            break;
        }
    }

    println!("\nConnection released, stopping reactor");
    handle.shutdown();
    reactor.await?;
    Ok(())
}
