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

//! Target endpoint descriptors.

use crate::error::RedialError;
use std::fmt;
use std::str::FromStr;

/// Default port for the plain `amqp` scheme.
pub const AMQP_PORT: u16 = 5672;

/// Default port for the `amqps` scheme.
pub const AMQPS_PORT: u16 = 5671;

/// The endpoint a connector dials for every new transport.
///
/// Accepts `host:port`, `scheme://host:port` and `scheme://user@host:port/path`.
/// The scheme defaults to `amqp`; the port defaults from the scheme when it
/// is one of `amqp` or `amqps`. IPv6 hosts are written in brackets.
///
/// # Examples
///
/// ```rust
/// use redial::transport::Address;
///
/// let address: Address = "amqps://broker.example.com".parse().unwrap();
/// assert_eq!(address.host(), "broker.example.com");
/// assert_eq!(address.port(), 5671);
/// assert_eq!(address.host_port(), "broker.example.com:5671");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    scheme: String,
    user: Option<String>,
    host: String,
    port: u16,
}

impl Address {
    /// Creates an address from its parts.
    pub fn new(scheme: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme: scheme.into(),
            user: None,
            host: host.into(),
            port,
        }
    }

    /// Returns the scheme.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Returns the user part, if one was given.
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Returns the host without brackets.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns `host:port` in a form accepted by socket connect calls.
    pub fn host_port(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    fn default_port(scheme: &str) -> Option<u16> {
        match scheme {
            "amqp" => Some(AMQP_PORT),
            "amqps" => Some(AMQPS_PORT),
            _ => None,
        }
    }
}

impl FromStr for Address {
    type Err = RedialError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| RedialError::InvalidAddress {
            address: input.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(invalid("address is empty"));
        }

        let (scheme, rest) = match trimmed.split_once("://") {
            Some((scheme, rest)) if !scheme.is_empty() => (scheme.to_ascii_lowercase(), rest),
            Some(_) => return Err(invalid("scheme is empty")),
            None => ("amqp".to_string(), trimmed),
        };

        // Everything after the authority is a node/path and is not our concern.
        let authority = rest.split('/').next().unwrap_or_default();

        let (user, host_port) = match authority.rsplit_once('@') {
            Some((user, host_port)) => (Some(user.to_string()), host_port),
            None => (None, authority),
        };

        let (host, port) = if let Some(bracketed) = host_port.strip_prefix('[') {
            let (host, tail) = bracketed
                .split_once(']')
                .ok_or_else(|| invalid("unterminated IPv6 host"))?;
            match tail.strip_prefix(':') {
                Some(port) => (host.to_string(), Some(port)),
                None if tail.is_empty() => (host.to_string(), None),
                None => return Err(invalid("unexpected characters after IPv6 host")),
            }
        } else {
            match host_port.rsplit_once(':') {
                Some((host, port)) => (host.to_string(), Some(port)),
                None => (host_port.to_string(), None),
            }
        };

        if host.is_empty() {
            return Err(invalid("host is empty"));
        }

        let port = match port {
            Some(port) => port
                .parse::<u16>()
                .map_err(|_| invalid("port is not a number between 0 and 65535"))?,
            None => Address::default_port(&scheme)
                .ok_or_else(|| invalid("port is required for this scheme"))?,
        };

        Ok(Self {
            scheme,
            user,
            host,
            port,
        })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://", self.scheme)?;
        if let Some(user) = &self.user {
            write!(f, "{}@", user)?;
        }
        write!(f, "{}", self.host_port())
    }
}
