//! Time source for expiry checks

use std::fmt::Debug;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current Unix time in seconds
pub trait Clock: Send + Sync + Debug {
    /// Seconds since the Unix epoch
    fn now(&self) -> u64;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        // A clock before 1970 reads as the epoch
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    }
}

/// Clock frozen at a fixed instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.0
    }
}
