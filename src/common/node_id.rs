//! Buffer node identifier type.

use std::fmt;

/// Identifies a buffer node and the pool that constructed it.
///
/// Every node gets a fresh `seq` from its pool at construction and keeps it
/// across reuse, so two live chains holding the same `NodeId` would mean the
/// pool issued one node twice. `pool` ties the node back to its origin.
///
/// # Example
/// ```
/// use netbuf::NodeId;
///
/// let id = NodeId::new(1, 7);
/// assert_eq!(id.pool(), 1);
/// assert_eq!(id.seq(), 7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pool: u64,
    seq: u64,
}

impl NodeId {
    /// Create a new NodeId.
    #[inline]
    pub fn new(pool: u64, seq: u64) -> Self {
        NodeId { pool, seq }
    }

    /// Identity of the pool that constructed the node.
    #[inline]
    pub fn pool(&self) -> u64 {
        self.pool
    }

    /// Construction sequence number within that pool.
    #[inline]
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({}.{})", self.pool, self.seq)
    }
}
