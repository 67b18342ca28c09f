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


//! No-reconnect policy.

use crate::reconnect::{Backoff, ReconnectPolicy};
use tokio::time::Instant;

/// Policy that never reconnects.
///
/// Installing it is equivalent to a connector without any policy, except
/// that the give-up is recorded in the connector's metrics. Useful for:
///
/// - One-shot connections that should fail immediately
/// - Situations where manual intervention is required
///
/// # Examples
///
/// ```
/// use redial::reconnect::{Backoff, NoReconnect, ReconnectPolicy};
/// use tokio::time::Instant;
///
/// let mut policy = NoReconnect::new();
/// assert_eq!(policy.next_delay(Instant::now()), Backoff::GiveUp);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReconnect;

impl NoReconnect {
    /// Create a new no-reconnect policy.
    pub fn new() -> Self {
        Self
    }
}

impl ReconnectPolicy for NoReconnect {
    fn next_delay(&mut self, _now: Instant) -> Backoff {
        Backoff::GiveUp
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "NoReconnect"
    }

    fn box_clone(&self) -> Box<dyn ReconnectPolicy> {
        Box::new(*self)
    }
}
