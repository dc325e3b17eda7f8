//! Buffer pool statistics tracking.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics tracked by the buffer pool.
///
/// All fields are atomic for lock-free, thread-safe updates, so counters are
/// bumped outside the pool lock.
///
/// # Memory Ordering
/// We use `Ordering::Relaxed` for all operations because:
/// - We only need atomicity (no partial updates)
/// - We don't need synchronization between different counters
/// - Statistics are "eventually consistent" - exact ordering doesn't matter
///
/// # Example
/// ```
/// use netbuf::PoolStats;
/// use std::sync::atomic::Ordering;
///
/// let stats = PoolStats::new();
/// stats.reuses.fetch_add(1, Ordering::Relaxed);
/// assert_eq!(stats.reuses.load(Ordering::Relaxed), 1);
/// ```
#[derive(Debug)]
pub struct PoolStats {
    /// Allocations served from a free stack.
    pub reuses: AtomicU64,

    /// Allocations that had to construct a fresh node.
    pub fresh: AtomicU64,

    /// Nodes returned to the pool.
    pub releases: AtomicU64,

    /// Requests larger than the largest size class.
    pub unsupported: AtomicU64,

    /// Requests refused (or aborted on) because of the memory ceiling.
    pub exhausted: AtomicU64,
}

impl PoolStats {
    /// Create a new stats tracker with all counters at zero.
    pub fn new() -> Self {
        Self {
            reuses: AtomicU64::new(0),
            fresh: AtomicU64::new(0),
            releases: AtomicU64::new(0),
            unsupported: AtomicU64::new(0),
            exhausted: AtomicU64::new(0),
        }
    }

    /// Fraction of successful allocations served by reuse (0.0 to 1.0).
    pub fn reuse_rate(&self) -> f64 {
        self.snapshot().reuse_rate()
    }

    /// Get a snapshot of current statistics.
    ///
    /// This returns a non-atomic copy for display/logging.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            reuses: self.reuses.load(Ordering::Relaxed),
            fresh: self.fresh.load(Ordering::Relaxed),
            releases: self.releases.load(Ordering::Relaxed),
            unsupported: self.unsupported.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.reuses.store(0, Ordering::Relaxed);
        self.fresh.store(0, Ordering::Relaxed);
        self.releases.store(0, Ordering::Relaxed);
        self.unsupported.store(0, Ordering::Relaxed);
        self.exhausted.store(0, Ordering::Relaxed);
    }
}

impl Default for PoolStats {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of pool statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub reuses: u64,
    pub fresh: u64,
    pub releases: u64,
    pub unsupported: u64,
    pub exhausted: u64,
}

impl StatsSnapshot {
    /// Total successful allocations.
    pub fn allocations(&self) -> u64 {
        self.reuses + self.fresh
    }

    /// Fraction of successful allocations served by reuse (0.0 to 1.0).
    pub fn reuse_rate(&self) -> f64 {
        let total = self.allocations();
        if total == 0 {
            0.0
        } else {
            self.reuses as f64 / total as f64
        }
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stats {{ reuses: {}, fresh: {}, releases: {}, reuse_rate: {:.2}% }}",
            self.reuses,
            self.fresh,
            self.releases,
            self.reuse_rate() * 100.0
        )
    }
}
