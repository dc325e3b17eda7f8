//! Error types for netbuf.

use thiserror::Error;

use crate::common::NodeId;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
/// This is a common Rust pattern (see `std::io::Result`).
pub type Result<T> = std::result::Result<T, Error>;

/// All errors surfaced by the pool, nodes and chains.
#[derive(Debug, Error)]
pub enum Error {
    /// Requested allocation is larger than the largest size class.
    #[error("Unsupported buffer size: {requested} bytes")]
    UnsupportedSize { requested: usize },

    /// A fresh node would push live pool memory past the ceiling.
    ///
    /// Only returned under `ExhaustionPolicy::Backpressure`.
    #[error("Buffer pool memory exhausted: {allocated_kb}KB + {requested_kb}KB reaches limit {limit_kb}KB")]
    MemoryExhausted {
        requested_kb: u64,
        allocated_kb: u64,
        limit_kb: u64,
    },

    /// A capacity that is not one of the size classes.
    #[error("Capacity {0} is not a size class")]
    UnknownSizeClass(usize),

    /// Tried to consume more bytes than are buffered.
    #[error("Cannot pop {requested} bytes, only {available} buffered")]
    PopOutOfRange { requested: usize, available: usize },

    /// Source window does not fit in the destination node.
    #[error("Cannot copy {needed} bytes into a node of capacity {capacity}")]
    CopyOverflow { needed: usize, capacity: usize },

    /// Tried to commit more bytes than the node has free at its tail.
    #[error("Cannot commit {requested} bytes, only {available} free")]
    CommitOutOfRange { requested: usize, available: usize },

    /// A node was handed to a chain drawing from a different pool.
    #[error("{node} belongs to pool {}, not pool {pool}", .node.pool())]
    ForeignNode { node: NodeId, pool: u64 },

    /// I/O error from a descriptor read or write.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for a descriptor that is not ready yet; the caller should retry
    /// once its event loop reports readiness.
    pub fn is_would_block(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::WouldBlock)
    }
}
