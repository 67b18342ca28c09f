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


//! Top-level error types for redial.
//!
//! Almost nothing in this crate reports errors through return values: a
//! transport that fails says so with a transport-closed event, and the
//! connector turns that into a reconnect decision. [`RedialError`] covers
//! what is left, which is configuration that cannot be used and requests
//! the reactor cannot serve.
//!
//! # Examples
//!
//! ```rust
//! use redial::RedialError;
//! use redial::transport::TransportError;
//!
//! let err: RedialError = TransportError::AlreadyBound.into();
//! assert!(err.is_transport_error());
//!
//! let err = "amqp://".parse::<redial::transport::Address>().unwrap_err();
//! assert!(err.is_configuration_error());
//! ```

use crate::event::ConnectorId;
use crate::transport::TransportError;
use thiserror::Error;

/// Top-level error type for redial operations.
#[derive(Debug, Error)]
pub enum RedialError {
    /// A transport-layer error occurred.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// An address string could not be parsed.
    #[error("invalid address '{address}': {reason}")]
    InvalidAddress {
        /// The address as given
        address: String,
        /// What is wrong with it
        reason: String,
    },

    /// Connection options failed validation.
    #[error("invalid connection options: {reason}")]
    InvalidOptions {
        /// What is wrong with them
        reason: String,
    },

    /// Connection options could not be deserialized.
    #[error("failed to parse connection options: {0}")]
    Config(#[from] serde_json::Error),

    /// The reactor has shut down and no longer accepts requests.
    #[error("reactor is not running")]
    ReactorClosed,

    /// The connector addressed by a request no longer exists.
    #[error("unknown connector: {0}")]
    UnknownConnector(ConnectorId),
}

impl RedialError {
    /// Returns `true` if this is a transport-layer error.
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns `true` if the error comes from bad addresses or options.
    ///
    /// Retrying the same request will fail the same way.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidAddress { .. } | Self::InvalidOptions { .. } | Self::Config(_)
        )
    }

    pub(crate) fn invalid_options(reason: impl Into<String>) -> Self {
        Self::InvalidOptions {
            reason: reason.into(),
        }
    }
}
