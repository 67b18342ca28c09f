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

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Global counter for generating unique transport IDs.
static NEXT_TRANSPORT_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a transport instance.
///
/// Every connect attempt creates a fresh transport, so the ID also tells
/// attempts apart in logs and lets the reactor drop events from transports
/// that have already been unbound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransportId(u64);

impl TransportId {
    /// Creates a transport ID from a raw value.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates the next process-wide unique transport ID.
    pub fn next() -> Self {
        Self(NEXT_TRANSPORT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transport({})", self.0)
    }
}

/// Metadata associated with a transport.
#[derive(Debug, Clone)]
pub struct TransportMetadata {
    /// Unique identifier for this transport
    pub id: TransportId,

    /// Transport type (e.g., "tcp", "memory")
    pub transport_type: String,

    /// Address the transport was created for
    pub address: String,

    /// When the transport was created
    pub created_at: Instant,
}

impl TransportMetadata {
    /// Creates new transport metadata.
    pub fn new(id: TransportId, transport_type: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id,
            transport_type: transport_type.into(),
            address: address.into(),
            created_at: Instant::now(),
        }
    }

    /// Returns the age of this transport.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}

/// Settings applied to a transport once it is bound to a connection.
///
/// These are the "post-bind" half of
/// [`ConnectionOptions`](crate::options::ConnectionOptions).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportSettings {
    /// Time allowed for establishing the underlying connection.
    ///
    /// Default: 10 seconds
    pub connect_timeout: Duration,

    /// Close the transport if nothing is read for this long.
    ///
    /// Default: None (no idle timeout)
    pub idle_timeout: Option<Duration>,

    /// Largest frame the transport will accept, if limited.
    ///
    /// Default: None
    pub max_frame_size: Option<u32>,

    /// Disable Nagle's algorithm on stream transports.
    ///
    /// Default: true
    pub tcp_nodelay: bool,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            idle_timeout: None,
            max_frame_size: None,
            tcp_nodelay: true,
        }
    }
}
