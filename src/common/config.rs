//! Configuration for the buffer pool.

/// Node capacities served by the pool, ascending.
///
/// Every pooled node has a capacity equal to exactly one of these. The
/// values are fixed so externally tuned limits stay interchangeable.
pub const SIZE_CLASSES: [usize; 7] = [
    4 * 1024,
    16 * 1024,
    64 * 1024,
    256 * 1024,
    1024 * 1024,
    4 * 1024 * 1024,
    8 * 1024 * 1024,
];

/// Default ceiling on live pool memory, in kilobytes (5 GiB).
pub const DEFAULT_MEM_LIMIT_KB: u64 = 5 * 1024 * 1024;

/// Default node size requested by an input buffer when it needs to grow.
pub const DEFAULT_READ_HINT: usize = SIZE_CLASSES[0];

/// What the pool does when a fresh node would breach the memory ceiling.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ExhaustionPolicy {
    /// Log and terminate the process. A leak or traffic spike crashes loudly
    /// instead of degrading silently.
    #[default]
    Abort,
    /// Refuse the allocation with [`Error::MemoryExhausted`] and leave the
    /// decision to the caller.
    ///
    /// [`Error::MemoryExhausted`]: crate::Error::MemoryExhausted
    Backpressure,
}

/// Settings for a [`BufferPool`](crate::BufferPool).
///
/// # Example
/// ```
/// use netbuf::{ExhaustionPolicy, PoolConfig};
///
/// let config = PoolConfig::new()
///     .with_mem_limit_kb(64 * 1024)
///     .with_exhaustion_policy(ExhaustionPolicy::Backpressure);
/// assert_eq!(config.mem_limit_kb, 64 * 1024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Ceiling on memory held by nodes the pool has constructed, in KB.
    pub mem_limit_kb: u64,

    /// Behaviour when the ceiling would be exceeded.
    pub exhaustion_policy: ExhaustionPolicy,
}

impl PoolConfig {
    /// Default configuration: 5 GiB ceiling, fail-fast on exhaustion.
    pub fn new() -> Self {
        Self {
            mem_limit_kb: DEFAULT_MEM_LIMIT_KB,
            exhaustion_policy: ExhaustionPolicy::Abort,
        }
    }

    pub fn with_mem_limit_kb(mut self, mem_limit_kb: u64) -> Self {
        self.mem_limit_kb = mem_limit_kb;
        self
    }

    pub fn with_exhaustion_policy(mut self, policy: ExhaustionPolicy) -> Self {
        self.exhaustion_policy = policy;
        self
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_classes_ascending_powers_of_two() {
        for pair in SIZE_CLASSES.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        for cap in SIZE_CLASSES {
            assert!(cap.is_power_of_two());
            assert_eq!(cap % 1024, 0);
        }
    }

    #[test]
    fn test_default_limit() {
        // 5 GiB expressed in KB
        assert_eq!(DEFAULT_MEM_LIMIT_KB * 1024, 5 * 1024 * 1024 * 1024u64);
        assert_eq!(PoolConfig::default().exhaustion_policy, ExhaustionPolicy::Abort);
    }

    #[test]
    fn test_builder() {
        let config = PoolConfig::new()
            .with_mem_limit_kb(100)
            .with_exhaustion_policy(ExhaustionPolicy::Backpressure);
        assert_eq!(config.mem_limit_kb, 100);
        assert_eq!(config.exhaustion_policy, ExhaustionPolicy::Backpressure);
    }
}
