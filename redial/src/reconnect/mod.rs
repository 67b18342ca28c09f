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


//! Reconnect policies.
//!
//! A [`ReconnectPolicy`] decides, each time a transport closes on an
//! active connection, whether to reconnect immediately, after a delay, or
//! never again. Its answer is a [`Backoff`].
//!
//! # Available Policies
//!
//! - [`ReconnectTimer`]: additive then doubling delays with a retry budget
//!   and an overall deadline. This is what
//!   [`ReconnectOptions`](crate::options::ReconnectOptions) builds.
//! - [`ExponentialBackoff`]: multiplicative growth with optional jitter
//! - [`FixedDelay`]: constant delay between attempts
//! - [`NoReconnect`]: always gives up
//!
//! # Examples
//!
//! ## Using the Reconnect Timer
//!
//! ```
//! use redial::reconnect::ReconnectTimer;
//! use std::time::Duration;
//!
//! let policy = ReconnectTimer::builder()
//!     .first_delay(Duration::from_millis(10))
//!     .max_delay(Some(Duration::from_secs(30)))
//!     .max_retries(Some(20))
//!     .timeout(Some(Duration::from_secs(300)))
//!     .build();
//! ```
//!
//! ## Using Exponential Backoff
//!
//! ```
//! use redial::reconnect::ExponentialBackoff;
//! use std::time::Duration;
//!
//! let policy = ExponentialBackoff::builder()
//!     .initial_delay(Duration::from_millis(100))
//!     .max_delay(Duration::from_secs(30))
//!     .jitter(true)
//!     .build();
//! ```
//!
//! ## Using Fixed Delay
//!
//! ```
//! use redial::reconnect::FixedDelay;
//! use std::time::Duration;
//!
//! let policy = FixedDelay::new(Duration::from_secs(5));
//! ```

mod exponential;
mod fixed;
mod no_reconnect;
mod timer;
mod traits;

pub use exponential::{ExponentialBackoff, ExponentialBackoffBuilder};
pub use fixed::{FixedDelay, FixedDelayBuilder};
pub use no_reconnect::NoReconnect;
pub use timer::{ReconnectTimer, ReconnectTimerBuilder};
pub use traits::{Backoff, ReconnectMetrics, ReconnectPolicy};
