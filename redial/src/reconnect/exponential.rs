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

//! Exponential backoff reconnect policy.

use crate::reconnect::{Backoff, ReconnectPolicy};
use std::time::Duration;
use tokio::time::Instant;

/// Exponential backoff reconnect policy.
///
/// The n-th attempt (counting from zero) waits
/// `initial_delay * multiplier^n`, capped at `max_delay`. With jitter
/// enabled the delay is drawn uniformly from `[0, capped]` ("full jitter"),
/// which spreads out many clients reconnecting to the same peer.
///
/// # Examples
///
/// ```
/// use redial::reconnect::ExponentialBackoff;
/// use std::time::Duration;
///
/// // Default configuration
/// let policy = ExponentialBackoff::default();
///
/// // Custom configuration
/// let policy = ExponentialBackoff::builder()
///     .initial_delay(Duration::from_millis(100))
///     .max_delay(Duration::from_secs(30))
///     .multiplier(2.0)
///     .jitter(true)
///     .max_attempts(Some(10))
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    /// Initial delay before first retry
    initial_delay: Duration,
    /// Maximum delay between retries
    max_delay: Duration,
    /// Multiplier for exponential growth
    multiplier: f64,
    /// Whether to add jitter to delays
    jitter: bool,
    /// Maximum number of attempts (None = unlimited)
    max_attempts: Option<u32>,
    /// Attempts made since the last reset
    attempt: u32,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        ExponentialBackoffBuilder::default().build()
    }
}

impl ExponentialBackoff {
    /// Create a new builder for configuring exponential backoff.
    pub fn builder() -> ExponentialBackoffBuilder {
        ExponentialBackoffBuilder::default()
    }

    /// Returns how many attempts were made since the last reset.
    pub fn attempts(&self) -> u32 {
        self.attempt
    }

    /// Calculate delay with optional jitter.
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let base_delay_ms = self.initial_delay.as_millis() as f64 * self.multiplier.powi(exponent);
        let max_delay_ms = self.max_delay.as_millis() as f64;
        let capped_ms = if base_delay_ms.is_finite() {
            base_delay_ms.min(max_delay_ms)
        } else {
            max_delay_ms
        };

        if self.jitter {
            let jitter_ms = rand::random::<f64>() * capped_ms;
            Duration::from_millis(jitter_ms as u64)
        } else {
            Duration::from_millis(capped_ms as u64)
        }
    }
}

impl ReconnectPolicy for ExponentialBackoff {
    fn next_delay(&mut self, _now: Instant) -> Backoff {
        if let Some(max) = self.max_attempts {
            if self.attempt >= max {
                return Backoff::GiveUp;
            }
        }
        let delay = self.calculate_delay(self.attempt);
        self.attempt = self.attempt.saturating_add(1);
        Backoff::from_delay(delay)
    }

    fn reset(&mut self) {
        self.attempt = 0;
    }

    fn name(&self) -> &str {
        "ExponentialBackoff"
    }

    fn box_clone(&self) -> Box<dyn ReconnectPolicy> {
        Box::new(self.clone())
    }
}

/// Builder for configuring exponential backoff policy.
#[derive(Debug)]
pub struct ExponentialBackoffBuilder {
    initial_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
    jitter: bool,
    max_attempts: Option<u32>,
}

impl Default for ExponentialBackoffBuilder {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(60),
            multiplier: 2.0,
            jitter: false,
            max_attempts: None,
        }
    }
}

impl ExponentialBackoffBuilder {
    /// Set the initial delay before the first retry.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the maximum delay between retries.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the multiplier for exponential growth.
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Enable or disable jitter.
    pub fn jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Set the maximum number of attempts.
    pub fn max_attempts(mut self, max: Option<u32>) -> Self {
        self.max_attempts = max;
        self
    }

    /// Build the exponential backoff policy.
    pub fn build(self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_delay: self.initial_delay,
            max_delay: self.max_delay,
            multiplier: self.multiplier,
            jitter: self.jitter,
            max_attempts: self.max_attempts,
            attempt: 0,
        }
    }
}
