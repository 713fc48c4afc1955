//! Injectable wall clock.
//!
//! The sync engine reads "now" at the start of every fetch attempt, and the
//! range resolver anchors its default window on today's UTC date. Both take
//! a [`Clock`] so tests can pin or step time.

use std::sync::Mutex;

use chrono::{DateTime, TimeDelta, Utc};

/// Source of the current UTC instant.
pub trait Clock {
    /// Current instant, UTC.
    fn now_utc(&self) -> DateTime<Utc>;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A manually driven clock for tests.
///
/// Every call to [`Clock::now_utc`] returns the current value and then
/// advances it by `step` (zero by default), which makes "time passes
/// between attempts" observable.
#[derive(Debug)]
pub struct ManualClock {
    state: Mutex<(DateTime<Utc>, TimeDelta)>,
}

impl ManualClock {
    /// A clock frozen at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            state: Mutex::new((now, TimeDelta::zero())),
        }
    }

    /// A clock starting at `now` that advances by `step` after each read.
    pub fn stepping(now: DateTime<Utc>, step: TimeDelta) -> Self {
        Self {
            state: Mutex::new((now, step)),
        }
    }

    /// A clock frozen at the given epoch second.
    ///
    /// Out-of-range values fall back to the Unix epoch.
    pub fn at_timestamp(secs: i64) -> Self {
        Self::new(DateTime::from_timestamp(secs, 0).unwrap_or(DateTime::UNIX_EPOCH))
    }

    /// Move the clock to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.0 = now;
    }

    /// Advance the clock by `delta`.
    pub fn advance(&self, delta: TimeDelta) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.0 += delta;
    }
}

impl Clock for ManualClock {
    fn now_utc(&self) -> DateTime<Utc> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let (now, step) = *state;
        state.0 = now + step;
        now
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_utc(&self) -> DateTime<Utc> {
        (**self).now_utc()
    }
}
