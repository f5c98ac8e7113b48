//! Wall clock for the time text
//!
//! The device has no time zone database; the configured UTC offset is applied
//! as a fixed offset.

use std::time::SystemTime;

use chrono::{DateTime, FixedOffset, Offset, Utc};

const SECONDS_PER_MINUTE: i32 = 60;

pub trait Clock {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// System time shifted by a fixed offset. On the ESP32 the system time is set
/// by SNTP before this is used.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    /// Offsets beyond a day fall back to UTC
    pub fn new(utc_offset_minutes: i32) -> Self {
        let offset = utc_offset_minutes
            .checked_mul(SECONDS_PER_MINUTE)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| {
                log::warn!(
                    "UTC offset of {} minutes is out of range, using UTC",
                    utc_offset_minutes
                );
                Utc.fix()
            });
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        DateTime::<Utc>::from(SystemTime::now()).with_timezone(&self.offset)
    }
}

/// 12 hour clock, e.g. `07:45 PM`
pub fn clock_text(now: &DateTime<FixedOffset>) -> String {
    now.format("%I:%M %p").to_string()
}
