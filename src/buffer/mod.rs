//! Buffer pool management.
//!
//! The buffer pool supplies fixed-capacity byte blocks to connection chains
//! and takes them back for reuse, so steady-state socket traffic does not
//! hit the heap.
//!
//! # Components
//! - [`BufferPool`] - Size-classed free stacks with a memory ceiling
//! - [`BufferNode`] - A fixed-capacity block with a valid-data window
//! - [`PoolStats`] - Performance statistics

mod node;
mod pool;
mod stats;

pub use node::BufferNode;
pub use pool::BufferPool;
pub(crate) use pool::PoolState;
pub use stats::{PoolStats, StatsSnapshot};
