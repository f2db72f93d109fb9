//! Bet-window clock.
//!
//! Derives the countdown to a game's next boundary (start, close or
//! result) from its declared status. Boundaries are times of day: one
//! that has already passed today means the same time tomorrow.
//!
//! The seconds field is `59 - now.second()`, a display approximation
//! that restarts at :59 every minute rather than a true sub-minute
//! countdown. It is kept as-is because the countdown display is built
//! around it.

use chrono::{Local, NaiveTime, Timelike};
use std::fmt;

use crate::types::{GameSnapshot, GameStatus};

const MINUTES_PER_DAY: i64 = 24 * 60;

// ---------------------------------------------------------------------------
// Clock source
// ---------------------------------------------------------------------------

/// Wall-clock source, injected so countdowns are testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveTime;
}

/// Local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveTime {
        Local::now().time()
    }
}

/// A clock frozen at a fixed time of day.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveTime {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Countdown
// ---------------------------------------------------------------------------

/// Time left until the next boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

/// The boundary the countdown runs toward for the game's current status.
pub fn boundary_time(game: &GameSnapshot) -> Option<NaiveTime> {
    match game.current_status {
        GameStatus::Open => Some(game.end_time),
        GameStatus::Closed => Some(game.result_time),
        GameStatus::Waiting => Some(game.start_time),
        GameStatus::ResultDeclared | GameStatus::Unknown => None,
    }
}

/// Countdown from `now` to the game's next boundary.
///
/// `None` when the status has no boundary (result declared / unknown).
/// Recompute on every tick; there is no state to decrement.
pub fn remaining(now: NaiveTime, game: &GameSnapshot) -> Option<Countdown> {
    let boundary = boundary_time(game)?;

    let boundary_minutes = i64::from(boundary.hour()) * 60 + i64::from(boundary.minute());
    let now_minutes = i64::from(now.hour()) * 60 + i64::from(now.minute());

    let mut diff = boundary_minutes - now_minutes;
    if diff < 0 {
        diff += MINUTES_PER_DAY;
    }

    Some(Countdown {
        hours: (diff / 60) as u32,
        minutes: (diff % 60) as u32,
        seconds: 59 - now.second().min(59),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
