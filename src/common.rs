//! Shared types for the blocking queue
//!
//! This module provides the wait-time configuration accepted by the timed
//! operations and the lock-free occupancy snapshot backing `size()`.

use std::sync::atomic::AtomicU32;
use std::time::{Duration, Instant};

use crossbeam_utils::CachePadded;

/// Memory ordering constants for atomic operations
///
/// Short aliases for the standard library's Ordering values.
pub mod ordering {
    pub use std::sync::atomic::Ordering::Relaxed as X;
}

/// Wait sentinel meaning "do not block at all"
pub const WAIT_NONE: i32 = 0;

/// Wait sentinel meaning "block with no deadline"
pub const WAIT_FOREVER: i32 = -1;

/// How long a timed push or pop may block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaitTime {
    /// Fail immediately instead of blocking.
    ///
    /// Timed calls report a full or empty queue as `TimedOut`; use
    /// `try_push`/`try_pop` to get `Full`/`Empty` instead.
    NoWait,
    /// Block until the operation can make progress, is interrupted, or the
    /// queue is terminated.
    Forever,
    /// Block for at most this many milliseconds, measured from the start of
    /// the call.
    Millis(u32),
}

impl WaitTime {
    /// Converts this wait into an absolute deadline relative to `start`.
    ///
    /// `None` means there is no deadline. `NoWait` yields `start` itself, so
    /// the remaining budget is zero from the first check.
    #[inline]
    pub(crate) fn deadline_from(self, start: Instant) -> Option<Instant> {
        match self {
            WaitTime::NoWait => Some(start),
            WaitTime::Forever => None,
            WaitTime::Millis(ms) => start.checked_add(Duration::from_millis(u64::from(ms))),
        }
    }
}

impl From<i32> for WaitTime {
    fn from(wait_ms: i32) -> Self {
        match wait_ms {
            WAIT_NONE => WaitTime::NoWait,
            ms if ms < 0 => WaitTime::Forever,
            // positive i32 always fits in u32
            ms => WaitTime::Millis(ms as u32),
        }
    }
}

impl From<Duration> for WaitTime {
    fn from(wait: Duration) -> Self {
        if wait.is_zero() {
            return WaitTime::NoWait;
        }
        // Round sub-millisecond waits up so they still block briefly.
        let ms = wait.as_nanos().div_ceil(1_000_000);
        WaitTime::Millis(u32::try_from(ms).unwrap_or(u32::MAX))
    }
}

/// Remaining time until `deadline`, or `None` when there is no deadline.
#[inline]
pub(crate) fn remaining(deadline: Option<Instant>) -> Option<Duration> {
    deadline.map(|deadline| deadline.saturating_duration_since(Instant::now()))
}

/// Occupancy mirror read without taking the queue lock
///
/// Stores are only ever issued while the queue lock is held; loads may happen
/// from any thread at any time and can be stale the instant they return.
pub struct SizeSnapshot {
    count: CachePadded<AtomicU32>,
}

impl SizeSnapshot {
    #[inline]
    pub fn new() -> Self {
        Self {
            count: CachePadded::new(AtomicU32::new(0)),
        }
    }

    /// Publishes a new count. Callers must hold the queue lock.
    #[inline]
    pub fn publish(&self, count: u32) {
        self.count.store(count, ordering::X);
    }

    /// Returns the last published count.
    #[inline]
    pub fn load(&self) -> u32 {
        self.count.load(ordering::X)
    }
}

impl Default for SizeSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_map_to_variants() {
        assert_eq!(WaitTime::from(WAIT_NONE), WaitTime::NoWait);
        assert_eq!(WaitTime::from(WAIT_FOREVER), WaitTime::Forever);
        assert_eq!(WaitTime::from(-42), WaitTime::Forever);
        assert_eq!(WaitTime::from(250), WaitTime::Millis(250));
    }

    #[test]
    fn durations_round_up_to_millis() {
        assert_eq!(WaitTime::from(Duration::ZERO), WaitTime::NoWait);
        assert_eq!(WaitTime::from(Duration::from_micros(1)), WaitTime::Millis(1));
        assert_eq!(WaitTime::from(Duration::from_millis(30)), WaitTime::Millis(30));
        assert_eq!(
            WaitTime::from(Duration::from_secs(u64::MAX)),
            WaitTime::Millis(u32::MAX)
        );
    }

    #[test]
    fn deadlines() {
        let start = Instant::now();
        assert_eq!(WaitTime::NoWait.deadline_from(start), Some(start));
        assert_eq!(WaitTime::Forever.deadline_from(start), None);
        assert_eq!(
            WaitTime::Millis(5).deadline_from(start),
            Some(start + Duration::from_millis(5))
        );
        assert_eq!(remaining(None), None);
        assert_eq!(remaining(Some(start)), Some(Duration::ZERO));
    }

    #[test]
    fn snapshot_tracks_published_count() {
        let snapshot = SizeSnapshot::new();
        assert_eq!(snapshot.load(), 0);
        snapshot.publish(7);
        assert_eq!(snapshot.load(), 7);
    }
}
