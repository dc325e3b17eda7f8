//! Buffer Pool - size-classed node allocation and reclamation.
//!
//! The [`BufferPool`] provides:
//! - Rounding of requested sizes to fixed size classes
//! - One LIFO free stack per size class
//! - A global memory ceiling with a configurable exhaustion policy
//! - A lazily built process-wide instance

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tracing::{debug, error, trace, warn};

use crate::buffer::{BufferNode, PoolStats};
use crate::common::{ExhaustionPolicy, NodeId, PoolConfig, SizeClass};
use crate::error::{Error, Result};

/// Source of pool identities, so nodes can be traced to their pool.
static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

static INSTANCE: OnceLock<Arc<BufferPool>> = OnceLock::new();

/// Pools byte buffers for connection I/O.
///
/// # Architecture
/// ```text
/// ┌──────────────────────────────────────────────────────────────┐
/// │                         BufferPool                           │
/// │  ┌────────────────────────────────────────────────────────┐  │
/// │  │       state: Arc<Mutex<PoolState>> (Weak in nodes)     │  │
/// │  │  free_lists: [Vec<BufferNode>; 7]                      │  │
/// │  │     4K  16K  64K  256K  1M  4M  8M                     │  │
/// │  │  allocated_kb ─── checked against config.mem_limit_kb  │  │
/// │  └────────────────────────────────────────────────────────┘  │
/// │  ┌──────────────┐  ┌──────────────┐                          │
/// │  │    config    │  │    stats     │                          │
/// │  │  PoolConfig  │  │  PoolStats   │                          │
/// │  └──────────────┘  └──────────────┘                          │
/// └──────────────────────────────────────────────────────────────┘
/// ```
///
/// # Thread Safety
/// - `state`: `Mutex` held only for a stack pop/push, the ceiling check
///   and crediting back a dropped node; never across I/O or across zeroing
///   fresh storage
/// - `stats`: No lock, atomic counters only
///
/// Every node the pool constructs is, from then on, either on one free stack
/// or owned by one caller, until a caller drops it and its budget is
/// credited back. Nodes are moved, never copied, so neither place can alias
/// the other.
///
/// # Usage
/// ```
/// use netbuf::{BufferPool, PoolConfig};
///
/// let pool = BufferPool::new(PoolConfig::default());
///
/// let node = pool.allocate(5000).unwrap();
/// assert_eq!(node.capacity(), 16 * 1024);
///
/// pool.release(node);
/// assert_eq!(pool.free_count(netbuf::SizeClass::fit(5000).unwrap()), 1);
/// ```
pub struct BufferPool {
    /// Identity stamped into every node this pool constructs.
    id: u64,

    /// Free stacks and memory accounting. Shared weakly with every node so
    /// a node dropped without `release` can hand back its budget.
    state: Arc<Mutex<PoolState>>,

    /// Immutable after construction.
    config: PoolConfig,

    /// Performance statistics.
    stats: PoolStats,
}

pub(crate) struct PoolState {
    /// Free nodes per size class, indexed by `SizeClass::index()`.
    free_lists: [Vec<BufferNode>; SizeClass::COUNT],

    /// Nodes ever constructed per size class.
    created: [usize; SizeClass::COUNT],

    /// Memory held by live nodes, in KB. Grows with every fresh node and
    /// shrinks only when a node is dropped instead of released.
    allocated_kb: u64,

    /// Sequence number for the next fresh node.
    next_seq: u64,
}

impl BufferPool {
    /// Create a pool with the given configuration.
    ///
    /// Services construct one pool at startup and hand an `Arc` of it to
    /// every connection.
    pub fn new(config: PoolConfig) -> Self {
        Self {
            id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
            state: Arc::new(Mutex::new(PoolState {
                free_lists: std::array::from_fn(|_| Vec::new()),
                created: [0; SizeClass::COUNT],
                allocated_kb: 0,
                next_seq: 0,
            })),
            config,
            stats: PoolStats::new(),
        }
    }

    /// The process-wide pool, built with the default configuration on first
    /// use. Concurrent first calls construct it exactly once.
    pub fn instance() -> Arc<BufferPool> {
        Arc::clone(INSTANCE.get_or_init(|| Arc::new(BufferPool::new(PoolConfig::default()))))
    }

    // ========================================================================
    // Public API: Allocate and release
    // ========================================================================

    /// Allocate a node able to hold `requested` bytes.
    ///
    /// The node's capacity is the smallest size class `>= requested`.
    ///
    /// # Errors
    /// - `Error::UnsupportedSize` if `requested` exceeds the largest class
    /// - `Error::MemoryExhausted` if a fresh node would reach the ceiling and
    ///   the policy is `Backpressure`
    ///
    /// Under the `Abort` policy, reaching the ceiling terminates the process.
    pub fn allocate(&self, requested: usize) -> Result<BufferNode> {
        match SizeClass::fit(requested) {
            Some(class) => self.allocate_class(class),
            None => {
                self.stats.unsupported.fetch_add(1, Ordering::Relaxed);
                debug!(requested, "rejecting allocation above largest size class");
                Err(Error::UnsupportedSize { requested })
            }
        }
    }

    /// Allocate a node of the smallest class (4K).
    pub fn allocate_default(&self) -> Result<BufferNode> {
        self.allocate_class(SizeClass::SMALLEST)
    }

    /// Allocate a node of exactly `class`.
    pub fn allocate_class(&self, class: SizeClass) -> Result<BufferNode> {
        let seq = {
            let mut state = self.state.lock();

            // Fast path: reuse a free node
            if let Some(node) = state.free_lists[class.index()].pop() {
                drop(state);
                self.stats.reuses.fetch_add(1, Ordering::Relaxed);
                trace!(node = %node.id(), %class, "reused node");
                return Ok(node);
            }

            let allocated_kb = state.allocated_kb;
            if allocated_kb + class.kilobytes() >= self.config.mem_limit_kb {
                drop(state);
                return self.exhausted(class, allocated_kb);
            }

            // Reserve under the lock, construct after releasing it
            state.allocated_kb += class.kilobytes();
            state.created[class.index()] += 1;
            let seq = state.next_seq;
            state.next_seq += 1;
            seq
        };

        self.stats.fresh.fetch_add(1, Ordering::Relaxed);
        debug!(pool = self.id, seq, %class, "constructing fresh node");
        Ok(BufferNode::new(
            NodeId::new(self.id, seq),
            class,
            Arc::downgrade(&self.state),
        ))
    }

    /// Return a node to the free stack of its size class.
    ///
    /// The node's window is cleared, so no stale data reaches the next owner.
    ///
    /// # Panics
    /// Panics if the node was constructed by a different pool.
    pub fn release(&self, mut node: BufferNode) {
        assert_eq!(
            node.id().pool(),
            self.id,
            "{} released to a pool that did not construct it",
            node.id()
        );
        let class = node.size_class();
        debug_assert_eq!(SizeClass::from_capacity(node.capacity()), Some(class));

        node.clear();
        trace!(node = %node.id(), %class, "released node");

        self.state.lock().free_lists[class.index()].push(node);
        self.stats.releases.fetch_add(1, Ordering::Relaxed);
    }

    // ========================================================================
    // Public API: Stats and info
    // ========================================================================

    /// Identity stamped into every node this pool constructs.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Get pool statistics.
    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }

    /// Number of nodes waiting on the free stack of `class`.
    pub fn free_count(&self, class: SizeClass) -> usize {
        self.state.lock().free_lists[class.index()].len()
    }

    /// Number of live nodes of `class`, on the free stack or held by callers.
    pub fn created_count(&self, class: SizeClass) -> usize {
        self.state.lock().created[class.index()]
    }

    /// Memory held by all live nodes, in KB.
    pub fn allocated_kb(&self) -> u64 {
        self.state.lock().allocated_kb
    }

    // ========================================================================
    // Internal
    // ========================================================================

    /// Apply the exhaustion policy.
    fn exhausted(&self, class: SizeClass, allocated_kb: u64) -> Result<BufferNode> {
        self.stats.exhausted.fetch_add(1, Ordering::Relaxed);
        let limit_kb = self.config.mem_limit_kb;

        match self.config.exhaustion_policy {
            ExhaustionPolicy::Abort => {
                error!(
                    %class,
                    allocated_kb,
                    limit_kb,
                    "buffer pool uses too much memory, exiting"
                );
                std::process::exit(1);
            }
            ExhaustionPolicy::Backpressure => {
                warn!(%class, allocated_kb, limit_kb, "buffer pool at memory limit");
                Err(Error::MemoryExhausted {
                    requested_kb: class.kilobytes(),
                    allocated_kb,
                    limit_kb,
                })
            }
        }
    }
}

impl PoolState {
    /// Forget a node that was dropped instead of released.
    pub(crate) fn forget(&mut self, id: NodeId, class: SizeClass) {
        self.allocated_kb = self.allocated_kb.saturating_sub(class.kilobytes());
        let created = &mut self.created[class.index()];
        *created = created.saturating_sub(1);
        debug!(node = %id, %class, allocated_kb = self.allocated_kb, "node dropped without release");
    }
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("allocated_kb", &self.allocated_kb())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;
    use tracing_test::traced_test;

    fn backpressure_pool(mem_limit_kb: u64) -> BufferPool {
        BufferPool::new(
            PoolConfig::new()
                .with_mem_limit_kb(mem_limit_kb)
                .with_exhaustion_policy(ExhaustionPolicy::Backpressure),
        )
    }

    fn class(capacity: usize) -> SizeClass {
        SizeClass::from_capacity(capacity).unwrap()
    }

    #[test]
    fn test_allocate_rounds_to_class() {
        let pool = BufferPool::new(PoolConfig::default());

        let node = pool.allocate(5000).unwrap();
        assert_eq!(node.capacity(), 16384);
        assert!(node.is_empty());
        pool.release(node);

        let node = pool.allocate(100_000).unwrap();
        assert_eq!(node.capacity(), 262144);
        pool.release(node);
    }

    #[test]
    fn test_allocate_default_is_4k() {
        let pool = BufferPool::new(PoolConfig::default());
        let node = pool.allocate_default().unwrap();
        assert_eq!(node.capacity(), 4096);
        pool.release(node);
    }

    #[test]
    fn test_unsupported_size() {
        let pool = BufferPool::new(PoolConfig::default());

        let result = pool.allocate(8 * 1024 * 1024 + 1);
        assert!(matches!(result, Err(Error::UnsupportedSize { .. })));
        assert_eq!(pool.stats().snapshot().unsupported, 1);
        assert_eq!(pool.allocated_kb(), 0);
    }

    #[test]
    fn test_release_then_reuse() {
        let pool = BufferPool::new(PoolConfig::default());

        let mut node = pool.allocate(10).unwrap();
        let id = node.id();
        node.extend_from_slice(b"secret");
        pool.release(node);
        assert_eq!(pool.free_count(SizeClass::SMALLEST), 1);

        // Same node comes back, with an empty window
        let node = pool.allocate(10).unwrap();
        assert_eq!(node.id(), id);
        assert!(node.is_empty());
        assert_eq!(node.head(), 0);
        assert_eq!(pool.free_count(SizeClass::SMALLEST), 0);
        assert_eq!(pool.created_count(SizeClass::SMALLEST), 1);

        let snapshot = pool.stats().snapshot();
        assert_eq!(snapshot.fresh, 1);
        assert_eq!(snapshot.reuses, 1);
        pool.release(node);
    }

    #[test]
    fn test_free_lists_are_per_class() {
        let pool = BufferPool::new(PoolConfig::default());

        let small = pool.allocate(1).unwrap();
        pool.release(small);

        // A 16K request must not take the free 4K node
        let medium = pool.allocate(5000).unwrap();
        assert_eq!(medium.capacity(), 16384);
        assert_eq!(pool.free_count(SizeClass::SMALLEST), 1);
        pool.release(medium);
    }

    #[test]
    fn test_memory_accounting() {
        let pool = BufferPool::new(PoolConfig::default());

        let a = pool.allocate(4096).unwrap();
        let b = pool.allocate(65536).unwrap();
        assert_eq!(pool.allocated_kb(), 4 + 64);

        pool.release(a);
        pool.release(b);
        // Released nodes stay allocated
        assert_eq!(pool.allocated_kb(), 68);
    }

    #[test]
    fn test_backpressure_at_ceiling() {
        let pool = backpressure_pool(8);

        let first = pool.allocate_default().unwrap();
        // 4 + 4 >= 8
        let result = pool.allocate_default();
        match result {
            Err(Error::MemoryExhausted {
                requested_kb,
                allocated_kb,
                limit_kb,
            }) => {
                assert_eq!(requested_kb, 4);
                assert_eq!(allocated_kb, 4);
                assert_eq!(limit_kb, 8);
            }
            other => panic!("Expected MemoryExhausted, got {:?}", other),
        }
        assert_eq!(pool.stats().snapshot().exhausted, 1);

        // Reuse still works at the ceiling
        pool.release(first);
        let again = pool.allocate_default().unwrap();
        pool.release(again);
    }

    #[test]
    #[should_panic(expected = "released to a pool that did not construct it")]
    fn test_release_to_foreign_pool() {
        let a = BufferPool::new(PoolConfig::default());
        let b = BufferPool::new(PoolConfig::default());

        let node = a.allocate_default().unwrap();
        b.release(node);
    }

    #[test]
    fn test_instance_is_shared() {
        let first = BufferPool::instance();
        let second = BufferPool::instance();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.config(), &PoolConfig::default());
    }

    #[test]
    fn test_instance_concurrent_init() {
        let handles: Vec<_> = (0..8)
            .map(|_| thread::spawn(|| BufferPool::instance().id()))
            .collect();

        let ids: HashSet<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn test_concurrent_allocate_release() {
        let pool = Arc::new(BufferPool::new(PoolConfig::default()));
        let mut handles = vec![];

        for _ in 0..8 {
            let pool = Arc::clone(&pool);
            handles.push(thread::spawn(move || {
                for i in 0..200 {
                    let node = pool.allocate(1 + (i % 3) * 5000).unwrap();
                    pool.release(node);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        // Conservation: everything created is back on a free stack
        for class in SizeClass::all() {
            assert_eq!(pool.created_count(class), pool.free_count(class));
        }
        let snapshot = pool.stats().snapshot();
        assert_eq!(snapshot.allocations(), 1600);
        assert_eq!(snapshot.releases, 1600);
    }

    #[test]
    fn test_exact_class_allocation() {
        let pool = BufferPool::new(PoolConfig::default());
        let node = pool.allocate_class(class(1048576)).unwrap();
        assert_eq!(node.size_class(), class(1048576));
        assert_eq!(node.capacity(), 1048576);
        pool.release(node);
    }

    #[test]
    fn test_dropped_node_returns_budget() {
        let pool = backpressure_pool(12);

        let a = pool.allocate_default().unwrap();
        let b = pool.allocate_default().unwrap();
        assert_eq!(pool.allocated_kb(), 8);

        drop(a);
        drop(b);
        assert_eq!(pool.allocated_kb(), 0);
        assert_eq!(pool.created_count(SizeClass::SMALLEST), 0);
        assert_eq!(pool.free_count(SizeClass::SMALLEST), 0);

        // Budget is usable again: two fit, the third reaches the ceiling
        let c = pool.allocate_default().unwrap();
        let d = pool.allocate_default().unwrap();
        assert!(matches!(
            pool.allocate_default(),
            Err(Error::MemoryExhausted { allocated_kb: 8, .. })
        ));
        pool.release(c);
        pool.release(d);
        assert_eq!(pool.allocated_kb(), 8);
    }

    #[test]
    fn test_node_outlives_pool() {
        let node = {
            let pool = BufferPool::new(PoolConfig::default());
            let free = pool.allocate_default().unwrap();
            pool.release(free);
            pool.allocate(5000).unwrap()
        };
        assert_eq!(node.capacity(), 16384);
        drop(node);
    }

    #[traced_test]
    #[test]
    fn test_dropped_node_is_logged() {
        let pool = BufferPool::new(PoolConfig::default());
        drop(pool.allocate_default().unwrap());

        assert!(logs_contain("node dropped without release"));
    }

    #[traced_test]
    #[test]
    fn test_fresh_node_is_logged() {
        let pool = BufferPool::new(PoolConfig::default());
        let node = pool.allocate_default().unwrap();
        pool.release(node);

        assert!(logs_contain("constructing fresh node"));
    }

    #[traced_test]
    #[test]
    fn test_backpressure_is_logged() {
        let pool = backpressure_pool(4);
        assert!(pool.allocate_default().is_err());

        assert!(logs_contain("buffer pool at memory limit"));
    }
}
