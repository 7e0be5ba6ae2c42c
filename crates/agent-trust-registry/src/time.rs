//! Time utilities for the trust registry.
//!
//! All timestamps are Unix epoch microseconds (u64). Registry operations
//! read the current time through a [`Clock`] so that deadlines and claim
//! expiry can be driven deterministically.

use std::sync::atomic::{AtomicU64, Ordering};

/// Return the current time as microseconds since Unix epoch.
///
/// A system clock set before the epoch reads as `0`.
pub fn now_micros() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

/// Render microseconds as `YYYY-MM-DD HH:MM:SS UTC`, dropping the
/// sub-second part.
pub fn format_micros(micros: u64) -> String {
    let secs = (micros / 1_000_000) as i64;
    chrono::DateTime::from_timestamp(secs, 0)
        .unwrap_or(chrono::DateTime::UNIX_EPOCH)
        .format("%Y-%m-%d %H:%M:%S UTC")
        .to_string()
}

/// Source of "now" for registry operations.
pub trait Clock: Send + Sync {
    /// Current time in microseconds since Unix epoch.
    fn now_micros(&self) -> u64;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_micros(&self) -> u64 {
        now_micros()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    micros: AtomicU64,
}

impl ManualClock {
    /// Create a clock frozen at `micros`.
    pub fn new(micros: u64) -> Self {
        Self {
            micros: AtomicU64::new(micros),
        }
    }

    /// Set the current time.
    pub fn set(&self, micros: u64) {
        self.micros.store(micros, Ordering::SeqCst);
    }

    /// Move the clock forward by `delta` microseconds.
    pub fn advance(&self, delta: u64) {
        self.micros.fetch_add(delta, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_micros(&self) -> u64 {
        self.micros.load(Ordering::SeqCst)
    }
}
