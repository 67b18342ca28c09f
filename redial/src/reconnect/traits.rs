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

//! Reconnect policy trait and types.

use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// What to do after a transport closed on an active connection.
///
/// The connector only ever looks at which of the three cases it got. In the
/// signed-millisecond encoding used by configuration and logs this is
/// `0` for [`Immediate`](Backoff::Immediate), `> 0` for
/// [`After`](Backoff::After) and `< 0` for [`GiveUp`](Backoff::GiveUp).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backoff {
    /// Reconnect right away.
    Immediate,
    /// Reconnect after the given delay.
    After(Duration),
    /// Stop retrying for good.
    GiveUp,
}

impl Backoff {
    /// Decodes a signed millisecond delay.
    ///
    /// ```rust
    /// use redial::reconnect::Backoff;
    /// use std::time::Duration;
    ///
    /// assert_eq!(Backoff::from_millis(-1), Backoff::GiveUp);
    /// assert_eq!(Backoff::from_millis(0), Backoff::Immediate);
    /// assert_eq!(Backoff::from_millis(50), Backoff::After(Duration::from_millis(50)));
    /// ```
    pub fn from_millis(millis: i64) -> Self {
        match millis {
            m if m < 0 => Self::GiveUp,
            0 => Self::Immediate,
            m => Self::After(Duration::from_millis(m as u64)),
        }
    }

    /// Wraps a non-negative delay, mapping zero to [`Immediate`](Backoff::Immediate).
    pub fn from_delay(delay: Duration) -> Self {
        if delay.is_zero() {
            Self::Immediate
        } else {
            Self::After(delay)
        }
    }

    /// Encodes as signed milliseconds. Non-zero delays never encode as `0`.
    pub fn as_millis(&self) -> i64 {
        match self {
            Self::Immediate => 0,
            Self::After(delay) => i64::try_from(delay.as_millis()).unwrap_or(i64::MAX).max(1),
            Self::GiveUp => -1,
        }
    }

    /// Returns the delay to wait, or `None` when giving up.
    pub fn delay(&self) -> Option<Duration> {
        match self {
            Self::Immediate => Some(Duration::ZERO),
            Self::After(delay) => Some(*delay),
            Self::GiveUp => None,
        }
    }

    /// Returns `true` for [`GiveUp`](Backoff::GiveUp).
    pub fn is_give_up(&self) -> bool {
        matches!(self, Self::GiveUp)
    }
}

impl fmt::Display for Backoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Immediate => write!(f, "immediately"),
            Self::After(delay) => write!(f, "after {:?}", delay),
            Self::GiveUp => write!(f, "never"),
        }
    }
}

/// A backoff algorithm deciding when, and whether, to reconnect.
///
/// A connector owns exactly one policy. It calls
/// [`next_delay`](ReconnectPolicy::next_delay) once per transport failure on
/// an active connection and [`reset`](ReconnectPolicy::reset) whenever the
/// remote peer opens the connection. Nothing else in the connector depends
/// on which algorithm is behind this trait.
///
/// Implementations are expected to produce non-decreasing delays until they
/// hit a cap or run out of attempts, and to return
/// [`Backoff::GiveUp`] from then on until reset.
///
/// # Examples
///
/// ```rust
/// use redial::reconnect::{Backoff, ReconnectPolicy, ReconnectTimer};
/// use std::time::Duration;
/// use tokio::time::Instant;
///
/// let mut policy = ReconnectTimer::builder()
///     .first_delay(Duration::from_millis(10))
///     .max_retries(Some(2))
///     .build();
///
/// let now = Instant::now();
/// assert_eq!(policy.next_delay(now), Backoff::After(Duration::from_millis(10)));
/// assert_eq!(policy.next_delay(now), Backoff::After(Duration::from_millis(110)));
/// assert_eq!(policy.next_delay(now), Backoff::GiveUp);
///
/// policy.reset();
/// assert_eq!(policy.next_delay(now), Backoff::After(Duration::from_millis(10)));
/// ```
pub trait ReconnectPolicy: Send + fmt::Debug {
    /// Returns the delay before the next attempt and advances the policy.
    fn next_delay(&mut self, now: Instant) -> Backoff;

    /// Returns the policy to its initial state.
    fn reset(&mut self);

    /// Human-readable name used in logs.
    fn name(&self) -> &str;

    /// Clones the policy, including its current state, into a box.
    fn box_clone(&self) -> Box<dyn ReconnectPolicy>;
}

impl Clone for Box<dyn ReconnectPolicy> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

/// Counters describing a connector's reconnect history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconnectMetrics {
    /// Total number of transports bound (first connect included)
    pub total_attempts: u64,
    /// Number of times the remote peer opened the connection
    pub successful_connections: u64,
    /// Transport failures since the last remote open
    pub consecutive_failures: u32,
    /// Retries performed without a delay
    pub immediate_retries: u64,
    /// Retries scheduled on a timer
    pub scheduled_retries: u64,
    /// The last backoff returned by the policy
    pub last_backoff: Option<Backoff>,
    /// Whether the policy gave up
    pub gave_up: bool,
}

impl ReconnectMetrics {
    /// Create a new metrics instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a transport being bound.
    pub fn record_attempt(&mut self) {
        self.total_attempts += 1;
    }

    /// Record the remote peer opening the connection.
    pub fn record_success(&mut self) {
        self.successful_connections += 1;
        self.consecutive_failures = 0;
    }

    /// Record a transport failure and what the policy made of it.
    pub fn record_failure(&mut self, backoff: Backoff) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_backoff = Some(backoff);
        match backoff {
            Backoff::Immediate => self.immediate_retries += 1,
            Backoff::After(_) => self.scheduled_retries += 1,
            Backoff::GiveUp => self.gave_up = true,
        }
    }

    /// Reset all metrics.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_from_millis() {
        assert_eq!(Backoff::from_millis(-5), Backoff::GiveUp);
        assert_eq!(Backoff::from_millis(0), Backoff::Immediate);
        assert_eq!(
            Backoff::from_millis(200),
            Backoff::After(Duration::from_millis(200))
        );
    }

    #[test]
    fn test_backoff_as_millis() {
        assert_eq!(Backoff::GiveUp.as_millis(), -1);
        assert_eq!(Backoff::Immediate.as_millis(), 0);
        assert_eq!(Backoff::After(Duration::from_millis(75)).as_millis(), 75);
        assert_eq!(Backoff::After(Duration::from_micros(10)).as_millis(), 1);
    }

    #[test]
    fn test_backoff_from_delay() {
        assert_eq!(Backoff::from_delay(Duration::ZERO), Backoff::Immediate);
        assert_eq!(
            Backoff::from_delay(Duration::from_secs(1)),
            Backoff::After(Duration::from_secs(1))
        );
    }

    #[test]
    fn test_backoff_delay() {
        assert_eq!(Backoff::Immediate.delay(), Some(Duration::ZERO));
        assert_eq!(
            Backoff::After(Duration::from_millis(3)).delay(),
            Some(Duration::from_millis(3))
        );
        assert!(Backoff::GiveUp.delay().is_none());
        assert!(Backoff::GiveUp.is_give_up());
    }

    #[test]
    fn test_metrics_new() {
        let metrics = ReconnectMetrics::new();
        assert_eq!(metrics.total_attempts, 0);
        assert_eq!(metrics.successful_connections, 0);
        assert_eq!(metrics.consecutive_failures, 0);
        assert!(metrics.last_backoff.is_none());
        assert!(!metrics.gave_up);
    }

    #[test]
    fn test_metrics_record_failure() {
        let mut metrics = ReconnectMetrics::new();
        metrics.record_failure(Backoff::Immediate);
        metrics.record_failure(Backoff::After(Duration::from_millis(50)));

        assert_eq!(metrics.consecutive_failures, 2);
        assert_eq!(metrics.immediate_retries, 1);
        assert_eq!(metrics.scheduled_retries, 1);
        assert!(!metrics.gave_up);

        metrics.record_failure(Backoff::GiveUp);
        assert!(metrics.gave_up);
        assert_eq!(metrics.last_backoff, Some(Backoff::GiveUp));
    }

    #[test]
    fn test_metrics_record_success() {
        let mut metrics = ReconnectMetrics::new();
        metrics.consecutive_failures = 5;

        metrics.record_success();

        assert_eq!(metrics.successful_connections, 1);
        assert_eq!(metrics.consecutive_failures, 0);
    }

    #[test]
    fn test_metrics_reset() {
        let mut metrics = ReconnectMetrics::new();
        metrics.record_attempt();
        metrics.record_failure(Backoff::GiveUp);

        metrics.reset();

        assert_eq!(metrics, ReconnectMetrics::default());
    }
}
