use crate::error::{AppError, Result};
use chrono::{Datelike, Local, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

/// Time context used by the feature builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockReading {
    /// Hour of day (0-23)
    pub hour: u32,

    /// Day of week (0-6), Monday = 0
    pub weekday: u32,
}

impl ClockReading {
    pub fn new(hour: u32, weekday: u32) -> Result<Self> {
        if hour > 23 {
            return Err(AppError::InvalidFeature(format!(
                "hour_of_day must be in 0..=23, got {}",
                hour
            )));
        }
        if weekday > 6 {
            return Err(AppError::InvalidFeature(format!(
                "day_of_week must be in 0..=6, got {}",
                weekday
            )));
        }
        Ok(Self { hour, weekday })
    }

    pub fn from_datetime<Tz: TimeZone>(dt: &chrono::DateTime<Tz>) -> Self {
        Self {
            hour: dt.hour(),
            weekday: dt.weekday().num_days_from_monday(),
        }
    }
}

/// Source of the current hour and weekday
pub trait Clock: Send + Sync {
    fn now(&self) -> ClockReading;
}

/// Wall clock in the server's local time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> ClockReading {
        ClockReading::from_datetime(&Local::now())
    }
}

/// Clock pinned to one reading, for tests and replay
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub ClockReading);

impl Clock for FixedClock {
    fn now(&self) -> ClockReading {
        self.0
    }
}
