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

//! Additive/doubling reconnect timer.

use crate::reconnect::{Backoff, ReconnectPolicy};
use std::time::Duration;
use tokio::time::Instant;

/// Reconnect timer with a retry budget and an overall deadline.
///
/// The delay sequence is:
///
/// - attempt 1: `first_delay`
/// - attempt 2: previous + `increment`
/// - attempt 3+: previous doubled (or previous + `increment` when doubling
///   is off)
///
/// Each delay is capped at `max_delay` and trimmed so the retry never fires
/// after the deadline, which is fixed at `now + timeout` on the first
/// attempt after a reset. Once `max_retries` attempts are used up or the
/// deadline has passed the timer returns [`Backoff::GiveUp`].
///
/// # Examples
///
/// ```rust
/// use redial::reconnect::{Backoff, ReconnectPolicy, ReconnectTimer};
/// use std::time::Duration;
/// use tokio::time::Instant;
///
/// let mut timer = ReconnectTimer::default();
/// let now = Instant::now();
///
/// assert_eq!(timer.next_delay(now), Backoff::Immediate);
/// assert_eq!(timer.next_delay(now), Backoff::After(Duration::from_millis(100)));
/// assert_eq!(timer.next_delay(now), Backoff::After(Duration::from_millis(200)));
/// assert_eq!(timer.next_delay(now), Backoff::After(Duration::from_millis(400)));
/// ```
#[derive(Debug, Clone)]
pub struct ReconnectTimer {
    /// Delay before the first retry
    first_delay: Duration,
    /// Upper bound on any single delay (None = unbounded)
    max_delay: Option<Duration>,
    /// Step added on the second retry, and on every retry when not doubling
    increment: Duration,
    /// Whether delays double from the third retry onward
    doubling: bool,
    /// Retry budget (None = unlimited)
    max_retries: Option<u32>,
    /// Overall time allowed for reconnecting (None = no deadline)
    timeout: Option<Duration>,

    retries: u32,
    delay: Duration,
    deadline: Option<Instant>,
}

impl Default for ReconnectTimer {
    fn default() -> Self {
        ReconnectTimerBuilder::default().build()
    }
}

impl ReconnectTimer {
    /// Create a new builder for configuring the timer.
    pub fn builder() -> ReconnectTimerBuilder {
        ReconnectTimerBuilder::default()
    }

    /// Returns how many retries were requested since the last reset.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Returns the deadline fixed by the first retry, if a timeout is set.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

impl ReconnectPolicy for ReconnectTimer {
    fn next_delay(&mut self, now: Instant) -> Backoff {
        self.retries = self.retries.saturating_add(1);
        if let Some(max) = self.max_retries {
            if self.retries > max {
                return Backoff::GiveUp;
            }
        }

        self.delay = match self.retries {
            1 => {
                self.deadline = self.timeout.map(|timeout| now + timeout);
                self.first_delay
            }
            2 => self.delay.saturating_add(self.increment),
            _ if self.doubling => self.delay.saturating_add(self.delay),
            _ => self.delay.saturating_add(self.increment),
        };

        if let Some(deadline) = self.deadline {
            if now >= deadline {
                return Backoff::GiveUp;
            }
        }
        if let Some(max) = self.max_delay {
            self.delay = self.delay.min(max);
        }
        if let Some(deadline) = self.deadline {
            self.delay = self.delay.min(deadline.saturating_duration_since(now));
        }

        Backoff::from_delay(self.delay)
    }

    fn reset(&mut self) {
        self.retries = 0;
        self.delay = Duration::ZERO;
        self.deadline = None;
    }

    fn name(&self) -> &str {
        "ReconnectTimer"
    }

    fn box_clone(&self) -> Box<dyn ReconnectPolicy> {
        Box::new(self.clone())
    }
}

/// Builder for configuring a [`ReconnectTimer`].
#[derive(Debug, Clone)]
pub struct ReconnectTimerBuilder {
    first_delay: Duration,
    max_delay: Option<Duration>,
    increment: Duration,
    doubling: bool,
    max_retries: Option<u32>,
    timeout: Option<Duration>,
}

impl Default for ReconnectTimerBuilder {
    fn default() -> Self {
        Self {
            first_delay: Duration::ZERO,
            max_delay: None,
            increment: Duration::from_millis(100),
            doubling: true,
            max_retries: None,
            timeout: None,
        }
    }
}

impl ReconnectTimerBuilder {
    /// Set the delay before the first retry.
    pub fn first_delay(mut self, delay: Duration) -> Self {
        self.first_delay = delay;
        self
    }

    /// Set the cap on any single delay.
    pub fn max_delay(mut self, delay: Option<Duration>) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the additive step.
    pub fn increment(mut self, increment: Duration) -> Self {
        self.increment = increment;
        self
    }

    /// Enable or disable doubling from the third retry on.
    pub fn doubling(mut self, doubling: bool) -> Self {
        self.doubling = doubling;
        self
    }

    /// Set the retry budget.
    pub fn max_retries(mut self, max: Option<u32>) -> Self {
        self.max_retries = max;
        self
    }

    /// Set the overall reconnect deadline, measured from the first retry.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the reconnect timer.
    pub fn build(self) -> ReconnectTimer {
        ReconnectTimer {
            first_delay: self.first_delay,
            max_delay: self.max_delay,
            increment: self.increment,
            doubling: self.doubling,
            max_retries: self.max_retries,
            timeout: self.timeout,
            retries: 0,
            delay: Duration::ZERO,
            deadline: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Backoff {
        Backoff::After(Duration::from_millis(millis))
    }

    #[test]
    fn test_default() {
        let timer = ReconnectTimer::default();
        assert_eq!(timer.first_delay, Duration::ZERO);
        assert!(timer.max_delay.is_none());
        assert_eq!(timer.increment, Duration::from_millis(100));
        assert!(timer.doubling);
        assert!(timer.max_retries.is_none());
        assert!(timer.timeout.is_none());
        assert_eq!(timer.retries(), 0);
    }

    #[test]
    fn test_doubling_sequence() {
        let mut timer = ReconnectTimer::builder()
            .first_delay(Duration::from_millis(10))
            .build();
        let now = Instant::now();

        assert_eq!(timer.next_delay(now), ms(10));
        assert_eq!(timer.next_delay(now), ms(110));
        assert_eq!(timer.next_delay(now), ms(220));
        assert_eq!(timer.next_delay(now), ms(440));
    }

    #[test]
    fn test_additive_sequence() {
        let mut timer = ReconnectTimer::builder()
            .first_delay(Duration::from_millis(50))
            .increment(Duration::from_millis(25))
            .doubling(false)
            .build();
        let now = Instant::now();

        assert_eq!(timer.next_delay(now), ms(50));
        assert_eq!(timer.next_delay(now), ms(75));
        assert_eq!(timer.next_delay(now), ms(100));
        assert_eq!(timer.next_delay(now), ms(125));
    }

    #[test]
    fn test_max_delay_caps_growth() {
        let mut timer = ReconnectTimer::builder()
            .max_delay(Some(Duration::from_millis(300)))
            .build();
        let now = Instant::now();

        assert_eq!(timer.next_delay(now), Backoff::Immediate);
        assert_eq!(timer.next_delay(now), ms(100));
        assert_eq!(timer.next_delay(now), ms(200));
        assert_eq!(timer.next_delay(now), ms(300));
        assert_eq!(timer.next_delay(now), ms(300));
    }

    #[test]
    fn test_max_retries() {
        let mut timer = ReconnectTimer::builder().max_retries(Some(2)).build();
        let now = Instant::now();

        assert_eq!(timer.next_delay(now), Backoff::Immediate);
        assert_eq!(timer.next_delay(now), ms(100));
        assert_eq!(timer.next_delay(now), Backoff::GiveUp);
        assert_eq!(timer.next_delay(now), Backoff::GiveUp);
    }

    #[test]
    fn test_zero_retries_gives_up_at_once() {
        let mut timer = ReconnectTimer::builder().max_retries(Some(0)).build();
        assert_eq!(timer.next_delay(Instant::now()), Backoff::GiveUp);
    }

    #[test]
    fn test_deadline_trims_and_expires() {
        let mut timer = ReconnectTimer::builder()
            .first_delay(Duration::from_millis(100))
            .timeout(Some(Duration::from_millis(250)))
            .build();
        let start = Instant::now();

        assert_eq!(timer.next_delay(start), ms(100));
        assert_eq!(timer.deadline(), Some(start + Duration::from_millis(250)));

        // 200ms would overshoot the deadline by 50ms.
        let later = start + Duration::from_millis(100);
        assert_eq!(timer.next_delay(later), ms(150));

        let expired = start + Duration::from_millis(250);
        assert_eq!(timer.next_delay(expired), Backoff::GiveUp);
    }

    #[test]
    fn test_reset_restarts_sequence_and_deadline() {
        let mut timer = ReconnectTimer::builder()
            .max_retries(Some(1))
            .timeout(Some(Duration::from_secs(1)))
            .build();
        let start = Instant::now();

        assert_eq!(timer.next_delay(start), Backoff::Immediate);
        assert_eq!(timer.next_delay(start), Backoff::GiveUp);

        timer.reset();
        assert_eq!(timer.retries(), 0);
        assert!(timer.deadline().is_none());

        let later = start + Duration::from_secs(5);
        assert_eq!(timer.next_delay(later), Backoff::Immediate);
        assert_eq!(timer.deadline(), Some(later + Duration::from_secs(1)));
    }

    #[test]
    fn test_box_clone_keeps_state() {
        let mut timer = ReconnectTimer::default();
        let now = Instant::now();
        timer.next_delay(now);

        let mut cloned: Box<dyn ReconnectPolicy> = timer.box_clone();
        assert_eq!(cloned.next_delay(now), ms(100));
        assert_eq!(cloned.name(), "ReconnectTimer");
    }
}
