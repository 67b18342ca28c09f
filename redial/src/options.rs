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


//! Connection options.
//!
//! Options are applied in two phases. The pre-bind phase
//! ([`apply_unbound`](ConnectionOptions::apply_unbound)) configures the
//! logical connection once, before its connector is installed. The post-bind
//! phase ([`apply_bound`](ConnectionOptions::apply_bound)) configures each
//! freshly bound transport and is run by the connector after every bind.
//!
//! # Examples
//!
//! ```rust
//! use redial::options::ConnectionOptions;
//!
//! let options = ConnectionOptions::from_json(r#"{
//!     "container_id": "sensor-17",
//!     "idle_timeout_ms": 30000,
//!     "reconnect": { "first_delay_ms": 10, "max_delay_ms": 5000, "max_retries": 20 }
//! }"#).unwrap();
//!
//! assert_eq!(options.container_id.as_deref(), Some("sensor-17"));
//! assert!(options.reconnect_policy().is_some());
//! ```

use crate::connection::Connection;
use crate::error::RedialError;
use crate::reconnect::{ReconnectPolicy, ReconnectTimer};
use crate::transport::TransportSettings;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Smallest frame size a peer is required to accept.
pub const MIN_MAX_FRAME_SIZE: u32 = 512;

/// Immutable configuration snapshot for one logical connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConnectionOptions {
    /// Identity presented to the peer
    pub container_id: Option<String>,
    /// Virtual host to request
    pub virtual_host: Option<String>,
    /// User to authenticate as
    pub user: Option<String>,
    /// Largest frame the connection accepts
    pub max_frame_size: Option<u32>,
    /// Largest number of concurrent sessions
    pub max_sessions: Option<u16>,
    /// Close a transport that has been silent this long
    pub idle_timeout_ms: Option<u64>,
    /// Give up on a single connect attempt after this long
    pub connect_timeout_ms: u64,
    /// Disable Nagle's algorithm on TCP transports
    pub tcp_nodelay: bool,
    /// Reconnect settings; absent means never reconnect
    pub reconnect: Option<ReconnectOptions>,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            container_id: None,
            virtual_host: None,
            user: None,
            max_frame_size: None,
            max_sessions: None,
            idle_timeout_ms: None,
            connect_timeout_ms: 10_000,
            tcp_nodelay: true,
            reconnect: None,
        }
    }
}

impl ConnectionOptions {
    /// Creates options with every setting at its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates options from JSON.
    ///
    /// # Errors
    ///
    /// [`RedialError::Config`] if the JSON is malformed or has unknown
    /// fields, [`RedialError::InvalidOptions`] if a value is out of range.
    pub fn from_json(json: &str) -> Result<Self, RedialError> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Serializes the options to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, RedialError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Sets the container ID.
    pub fn with_container_id(mut self, id: impl Into<String>) -> Self {
        self.container_id = Some(id.into());
        self
    }

    /// Sets the virtual host.
    pub fn with_virtual_host(mut self, host: impl Into<String>) -> Self {
        self.virtual_host = Some(host.into());
        self
    }

    /// Sets the user.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Sets the maximum frame size.
    pub fn with_max_frame_size(mut self, size: u32) -> Self {
        self.max_frame_size = Some(size);
        self
    }

    /// Sets the maximum number of sessions.
    pub fn with_max_sessions(mut self, sessions: u16) -> Self {
        self.max_sessions = Some(sessions);
        self
    }

    /// Sets the idle timeout.
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout_ms = Some(duration_to_millis(timeout));
        self
    }

    /// Sets the per-attempt connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = duration_to_millis(timeout);
        self
    }

    /// Enables or disables `TCP_NODELAY`.
    pub fn with_tcp_nodelay(mut self, nodelay: bool) -> Self {
        self.tcp_nodelay = nodelay;
        self
    }

    /// Enables reconnecting with the given settings.
    pub fn with_reconnect(mut self, reconnect: ReconnectOptions) -> Self {
        self.reconnect = Some(reconnect);
        self
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// [`RedialError::InvalidOptions`] naming the first offending setting.
    pub fn validate(&self) -> Result<(), RedialError> {
        if self.connect_timeout_ms == 0 {
            return Err(RedialError::invalid_options(
                "connect_timeout_ms must be positive",
            ));
        }
        if self.idle_timeout_ms == Some(0) {
            return Err(RedialError::invalid_options(
                "idle_timeout_ms must be positive when set",
            ));
        }
        if let Some(size) = self.max_frame_size {
            if size < MIN_MAX_FRAME_SIZE {
                return Err(RedialError::invalid_options(format!(
                    "max_frame_size must be at least {}, got {}",
                    MIN_MAX_FRAME_SIZE, size
                )));
            }
        }
        if self.max_sessions == Some(0) {
            return Err(RedialError::invalid_options(
                "max_sessions must be positive when set",
            ));
        }
        if let Some(reconnect) = &self.reconnect {
            reconnect.validate()?;
        }
        Ok(())
    }

    /// Pre-bind phase: configures the logical connection.
    pub fn apply_unbound<C: Connection + ?Sized>(&self, connection: &mut C) {
        let settings = connection.settings_mut();
        if let Some(id) = &self.container_id {
            settings.container_id = id.clone();
        }
        settings.virtual_host = self.virtual_host.clone();
        settings.user = self.user.clone();
        settings.max_frame_size = self.max_frame_size;
        settings.max_sessions = self.max_sessions;
    }

    /// Post-bind phase: configures the transport just bound to `connection`.
    pub fn apply_bound<C: Connection + ?Sized>(&self, connection: &mut C) {
        if let Some(transport) = connection.transport_mut() {
            transport.configure(&self.transport_settings());
        }
    }

    /// Returns the settings handed to each bound transport.
    pub fn transport_settings(&self) -> TransportSettings {
        TransportSettings {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            idle_timeout: self.idle_timeout_ms.map(Duration::from_millis),
            max_frame_size: self.max_frame_size,
            tcp_nodelay: self.tcp_nodelay,
        }
    }

    /// Builds a fresh reconnect policy, or `None` if reconnecting is off.
    pub fn reconnect_policy(&self) -> Option<Box<dyn ReconnectPolicy>> {
        self.reconnect
            .as_ref()
            .map(|reconnect| Box::new(reconnect.build()) as Box<dyn ReconnectPolicy>)
    }
}

/// Settings for the [`ReconnectTimer`] a connector reconnects with.
///
/// Defaults match [`ReconnectTimer::default`]: retry at once, then after
/// 100ms, then keep doubling, forever.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconnectOptions {
    /// Delay before the first retry
    pub first_delay_ms: u64,
    /// Cap on any single delay
    pub max_delay_ms: Option<u64>,
    /// Additive step
    pub increment_ms: u64,
    /// Double delays from the third retry on
    pub doubling: bool,
    /// Retry budget
    pub max_retries: Option<u32>,
    /// Overall time allowed for reconnecting
    pub timeout_ms: Option<u64>,
}

impl Default for ReconnectOptions {
    fn default() -> Self {
        Self {
            first_delay_ms: 0,
            max_delay_ms: None,
            increment_ms: 100,
            doubling: true,
            max_retries: None,
            timeout_ms: None,
        }
    }
}

impl ReconnectOptions {
    /// Creates reconnect options with every setting at its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks that the settings describe a usable timer.
    pub fn validate(&self) -> Result<(), RedialError> {
        if let Some(max) = self.max_delay_ms {
            if max < self.first_delay_ms {
                return Err(RedialError::invalid_options(format!(
                    "reconnect.max_delay_ms ({}) is below reconnect.first_delay_ms ({})",
                    max, self.first_delay_ms
                )));
            }
        }
        Ok(())
    }

    /// Builds the reconnect timer these options describe.
    pub fn build(&self) -> ReconnectTimer {
        ReconnectTimer::builder()
            .first_delay(Duration::from_millis(self.first_delay_ms))
            .max_delay(self.max_delay_ms.map(Duration::from_millis))
            .increment(Duration::from_millis(self.increment_ms))
            .doubling(self.doubling)
            .max_retries(self.max_retries)
            .timeout(self.timeout_ms.map(Duration::from_millis))
            .build()
    }
}

fn duration_to_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
