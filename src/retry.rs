//! Fixed-delay retry loop used for the startup barrier, polling and device commands

use core::fmt::Display;

use embedded_hal::delay::DelayNs;

const MS_PER_SECOND: u32 = 1000;

/// Retry forever, sleeping a fixed delay between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    delay_ms: u32,
}

impl RetryPolicy {
    /// Policy sleeping `delay_ms` milliseconds after each failure
    pub const fn from_millis(delay_ms: u32) -> Self {
        Self { delay_ms }
    }

    /// Policy sleeping whole seconds after each failure
    pub const fn from_secs(delay_secs: u32) -> Self {
        Self {
            delay_ms: delay_secs.saturating_mul(MS_PER_SECOND),
        }
    }

    pub const fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    /// Run `op` until it succeeds.
    ///
    /// Every failure is logged and followed by exactly one delay, so `n`
    /// failures cost `n` sleeps. There is no attempt limit.
    pub fn run<T, E, D, F>(&self, delay: &mut D, what: &str, mut op: F) -> T
    where
        E: Display,
        D: DelayNs,
        F: FnMut() -> Result<T, E>,
    {
        let mut attempt: u32 = 1;
        loop {
            match op() {
                Ok(value) => {
                    if attempt > 1 {
                        log::info!("{} succeeded after {} attempts", what, attempt);
                    }
                    return value;
                }
                Err(e) => {
                    log::warn!(
                        "{} failed (attempt {}): {}. Sleeping {} ms",
                        what,
                        attempt,
                        e,
                        self.delay_ms
                    );
                    delay.delay_ms(self.delay_ms);
                    attempt = attempt.saturating_add(1);
                }
            }
        }
    }
}
