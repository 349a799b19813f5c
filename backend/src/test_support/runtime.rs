//! Deterministic clock and sleeper doubles.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;

use crate::domain::Sleeper;

/// Clock frozen at a chosen instant until advanced.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    /// Clock reading `now` until advanced.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Move the clock forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        let delta = match TimeDelta::from_std(delta) {
            Ok(delta) => delta,
            Err(error) => {
                panic!("failed to convert Duration to TimeDelta: {error}; delta={delta:?}")
            }
        };
        *self.lock_clock() += delta;
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Sleeper that returns at once.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateSleeper;

#[async_trait]
impl Sleeper for ImmediateSleeper {
    async fn sleep(&self, _duration: Duration) {}
}

/// Sleeper that records each requested pause and returns at once.
#[derive(Default)]
pub struct RecordingSleeper(Mutex<Vec<Duration>>);

impl RecordingSleeper {
    /// Pauses requested so far, in order.
    pub fn recorded(&self) -> Vec<Duration> {
        self.lock_entries().clone()
    }

    fn lock_entries(&self) -> MutexGuard<'_, Vec<Duration>> {
        match self.0.lock() {
            Ok(entries) => entries,
            Err(_) => panic!("sleeper mutex"),
        }
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.lock_entries().push(duration);
    }
}

/// Sleeper that advances a [`MutableClock`] instead of waiting.
///
/// Pairs with clock-driven adapters such as
/// [`crate::outbound::memory::InMemoryIdentityService`] so propagation delays
/// elapse in simulated time.
pub struct ClockAdvancingSleeper {
    clock: Arc<MutableClock>,
    recorded: RecordingSleeper,
}

impl ClockAdvancingSleeper {
    /// Sleeper advancing `clock` by each requested pause.
    pub fn new(clock: Arc<MutableClock>) -> Self {
        Self {
            clock,
            recorded: RecordingSleeper::default(),
        }
    }

    /// Pauses requested so far, in order.
    pub fn recorded(&self) -> Vec<Duration> {
        self.recorded.recorded()
    }
}

#[async_trait]
impl Sleeper for ClockAdvancingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.clock.advance(duration);
        self.recorded.sleep(duration).await;
    }
}
