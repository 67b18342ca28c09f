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

//! Fixed delay reconnect policy.

use crate::reconnect::{Backoff, ReconnectPolicy};
use std::time::Duration;
use tokio::time::Instant;

/// Fixed delay reconnect policy.
///
/// Waits the same amount of time before every attempt, optionally giving up
/// after a number of attempts. A zero delay reconnects immediately.
///
/// # Examples
///
/// ```
/// use redial::reconnect::FixedDelay;
/// use std::time::Duration;
///
/// // Default configuration (1 second delay)
/// let policy = FixedDelay::default();
///
/// // Custom configuration
/// let policy = FixedDelay::builder()
///     .delay(Duration::from_millis(200))
///     .max_attempts(Some(3))
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct FixedDelay {
    /// Delay between attempts
    delay: Duration,
    /// Maximum number of attempts (None = unlimited)
    max_attempts: Option<u32>,
    /// Attempts made since the last reset
    attempts: u32,
}

impl Default for FixedDelay {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl FixedDelay {
    /// Create a new builder for configuring fixed delay.
    pub fn builder() -> FixedDelayBuilder {
        FixedDelayBuilder::default()
    }

    /// Create a new fixed delay policy with the given delay.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: None,
            attempts: 0,
        }
    }

    /// Returns how many attempts were made since the last reset.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

impl ReconnectPolicy for FixedDelay {
    fn next_delay(&mut self, _now: Instant) -> Backoff {
        if let Some(max) = self.max_attempts {
            if self.attempts >= max {
                return Backoff::GiveUp;
            }
        }
        self.attempts += 1;
        Backoff::from_delay(self.delay)
    }

    fn reset(&mut self) {
        self.attempts = 0;
    }

    fn name(&self) -> &str {
        "FixedDelay"
    }

    fn box_clone(&self) -> Box<dyn ReconnectPolicy> {
        Box::new(self.clone())
    }
}

/// Builder for configuring fixed delay policy.
#[derive(Debug)]
pub struct FixedDelayBuilder {
    delay: Duration,
    max_attempts: Option<u32>,
}

impl Default for FixedDelayBuilder {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
            max_attempts: None,
        }
    }
}

impl FixedDelayBuilder {
    /// Set the delay between attempts.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Set the maximum number of attempts.
    pub fn max_attempts(mut self, max: Option<u32>) -> Self {
        self.max_attempts = max;
        self
    }

    /// Build the fixed delay policy.
    pub fn build(self) -> FixedDelay {
        FixedDelay {
            delay: self.delay,
            max_attempts: self.max_attempts,
            attempts: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let policy = FixedDelay::default();
        assert_eq!(policy.delay, Duration::from_secs(1));
        assert!(policy.max_attempts.is_none());
    }

    #[test]
    fn test_builder() {
        let policy = FixedDelay::builder()
            .delay(Duration::from_secs(3))
            .max_attempts(Some(10))
            .build();

        assert_eq!(policy.delay, Duration::from_secs(3));
        assert_eq!(policy.max_attempts, Some(10));
    }

    #[test]
    fn test_same_delay_every_time() {
        let mut policy = FixedDelay::new(Duration::from_millis(200));
        let now = Instant::now();
        for _ in 0..10 {
            assert_eq!(
                policy.next_delay(now),
                Backoff::After(Duration::from_millis(200))
            );
        }
        assert_eq!(policy.attempts(), 10);
    }

    #[test]
    fn test_zero_delay_is_immediate() {
        let mut policy = FixedDelay::new(Duration::ZERO);
        assert_eq!(policy.next_delay(Instant::now()), Backoff::Immediate);
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let mut policy = FixedDelay::builder()
            .delay(Duration::from_millis(5))
            .max_attempts(Some(2))
            .build();
        let now = Instant::now();

        assert!(!policy.next_delay(now).is_give_up());
        assert!(!policy.next_delay(now).is_give_up());
        assert_eq!(policy.next_delay(now), Backoff::GiveUp);
        assert_eq!(policy.next_delay(now), Backoff::GiveUp);
    }

    #[test]
    fn test_reset() {
        let mut policy = FixedDelay::builder().max_attempts(Some(1)).build();
        let now = Instant::now();

        policy.next_delay(now);
        assert_eq!(policy.next_delay(now), Backoff::GiveUp);

        policy.reset();
        assert_eq!(policy.attempts(), 0);
        assert!(!policy.next_delay(now).is_give_up());
    }

    #[test]
    fn test_name() {
        let policy = FixedDelay::default();
        assert_eq!(policy.name(), "FixedDelay");
    }
}
