//! Elapsed-time counters advanced once per tick.

use std::fmt;

const SECONDS_PER_MINUTE: u8 = 60;
const MINUTES_PER_HOUR: u8 = 60;

/// Elapsed hours, minutes and seconds since the last activation.
///
/// `minute` and `second` stay in `0..60`; `hour` is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TimerState {
    hour: u64,
    minute: u8,
    second: u8,
}

impl TimerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the state reached after `ticks` elapsed time units.
    pub fn from_elapsed(ticks: u64) -> Self {
        let seconds = u64::from(SECONDS_PER_MINUTE);
        let minutes = u64::from(MINUTES_PER_HOUR);
        Self {
            hour: ticks / (seconds * minutes),
            minute: ((ticks / seconds) % minutes) as u8,
            second: (ticks % seconds) as u8,
        }
    }

    pub fn hour(&self) -> u64 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn second(&self) -> u8 {
        self.second
    }

    /// Advance by one time unit, carrying into minutes and hours.
    pub fn tick(&mut self) {
        self.second += 1;
        if self.second >= SECONDS_PER_MINUTE {
            self.second -= SECONDS_PER_MINUTE;
            self.minute += 1;
            if self.minute >= MINUTES_PER_HOUR {
                self.minute -= MINUTES_PER_HOUR;
                self.hour = self.hour.saturating_add(1);
            }
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Total elapsed time units represented by this state.
    pub fn elapsed(&self) -> u64 {
        self.hour
            .saturating_mul(3600)
            .saturating_add(u64::from(self.minute) * 60)
            .saturating_add(u64::from(self.second))
    }

    pub fn as_tuple(&self) -> (u64, u8, u8) {
        (self.hour, self.minute, self.second)
    }
}

/// Renders as `hour:minute:second` without padding, e.g. `1:0:1`.
impl fmt::Display for TimerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.hour, self.minute, self.second)
    }
}
