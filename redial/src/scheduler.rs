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


//! Retry timers.
//!
//! A [`Scheduler`] accepts a delay and a connector ID and, once the delay has
//! elapsed, delivers a single timer-fired event for that connector through
//! the normal event path. It never holds a reference to the connector
//! itself: the event is addressed by ID, and the reactor drops events for
//! connectors that no longer exist.

use crate::event::{ConnectorEvent, ConnectorId, Dispatch, EventSink};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::trace;

/// Schedules one-shot retry timers.
pub trait Scheduler: Send + Sync + fmt::Debug {
    /// Arranges for `target` to receive a timer-fired event after `delay`.
    ///
    /// The timer is cancelled when the returned handle is cancelled or
    /// dropped.
    fn schedule(&self, delay: Duration, target: ConnectorId) -> TimerHandle;
}

/// Cancellation handle for a scheduled timer.
///
/// Dropping the handle cancels the timer, so a connector that is torn down
/// takes its pending retry with it.
#[derive(Debug)]
pub struct TimerHandle {
    cancelled: Arc<AtomicBool>,
    task: Option<AbortHandle>,
}

impl TimerHandle {
    /// Creates a handle that cancels by raising `cancelled`.
    ///
    /// The scheduler must check the flag before delivering the event.
    pub fn new(cancelled: Arc<AtomicBool>) -> Self {
        Self {
            cancelled,
            task: None,
        }
    }

    /// Creates a handle that additionally aborts `task` when cancelled.
    pub fn with_task(cancelled: Arc<AtomicBool>, task: AbortHandle) -> Self {
        Self {
            cancelled,
            task: Some(task),
        }
    }

    /// Cancels the timer. Cancelling twice has no further effect.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        if let Some(task) = &self.task {
            task.abort();
        }
    }

    /// Returns `true` once the timer has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Scheduler backed by tokio timers, delivering onto a reactor's queue.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    events: mpsc::UnboundedSender<Dispatch>,
}

impl TokioScheduler {
    /// Creates a scheduler that delivers timer-fired events to `events`.
    pub fn new(events: mpsc::UnboundedSender<Dispatch>) -> Self {
        Self { events }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, target: ConnectorId) -> TimerHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let sink = EventSink::new(target, self.events.clone());
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if flag.load(Ordering::Acquire) {
                return;
            }
            trace!(connector = %target, "retry timer fired");
            sink.emit(ConnectorEvent::TimerFired);
        });
        TimerHandle::with_task(cancelled, task.abort_handle())
    }
}

/// A timer recorded by a [`ManualScheduler`].
#[derive(Debug, Clone)]
pub struct ScheduledTimer {
    /// Requested delay
    pub delay: Duration,
    /// Connector the timer is for
    pub target: ConnectorId,
    cancelled: Arc<AtomicBool>,
    fired: bool,
}

impl ScheduledTimer {
    /// Returns `true` if the owner cancelled the timer before it fired.
    pub fn is_cancelled(&self) -> bool {
        !self.fired && self.cancelled.load(Ordering::Acquire)
    }

    /// Returns `true` once the timer has been fired.
    pub fn is_fired(&self) -> bool {
        self.fired
    }

    /// Returns `true` while the timer is neither fired nor cancelled.
    pub fn is_pending(&self) -> bool {
        !self.fired && !self.cancelled.load(Ordering::Acquire)
    }
}

/// Scheduler that only records timers; tests fire them by hand.
///
/// # Examples
///
/// ```rust
/// use redial::event::ConnectorId;
/// use redial::scheduler::{ManualScheduler, Scheduler};
/// use std::time::Duration;
///
/// let scheduler = ManualScheduler::new();
/// let handle = scheduler.schedule(Duration::from_millis(50), ConnectorId::new(1));
///
/// assert_eq!(scheduler.delays(), vec![Duration::from_millis(50)]);
/// assert_eq!(scheduler.pending_count(), 1);
///
/// drop(handle);
/// assert_eq!(scheduler.pending_count(), 0);
/// assert_eq!(scheduler.fire_next(), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    timers: Arc<Mutex<Vec<ScheduledTimer>>>,
}

impl ManualScheduler {
    /// Creates a scheduler with no timers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every timer scheduled so far, oldest first.
    pub fn timers(&self) -> Vec<ScheduledTimer> {
        self.timers.lock().clone()
    }

    /// Returns the delays of every timer scheduled so far, oldest first.
    pub fn delays(&self) -> Vec<Duration> {
        self.timers.lock().iter().map(|t| t.delay).collect()
    }

    /// Returns how many timers have been scheduled.
    pub fn scheduled_count(&self) -> usize {
        self.timers.lock().len()
    }

    /// Returns how many timers are neither fired nor cancelled.
    pub fn pending_count(&self) -> usize {
        self.timers.lock().iter().filter(|t| t.is_pending()).count()
    }

    /// Returns how many timers were cancelled before firing.
    pub fn cancelled_count(&self) -> usize {
        self.timers.lock().iter().filter(|t| t.is_cancelled()).count()
    }

    /// Fires the oldest pending timer, returning the connector it targets.
    ///
    /// The caller is responsible for delivering the timer-fired event.
    pub fn fire_next(&self) -> Option<ConnectorId> {
        let mut timers = self.timers.lock();
        let timer = timers.iter_mut().find(|t| t.is_pending())?;
        timer.fired = true;
        Some(timer.target)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, target: ConnectorId) -> TimerHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        self.timers.lock().push(ScheduledTimer {
            delay,
            target,
            cancelled: Arc::clone(&cancelled),
            fired: false,
        });
        TimerHandle::new(cancelled)
    }
}
