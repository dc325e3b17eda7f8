//! BufferChain - an ordered run of nodes forming one byte stream.
//!
//! Concatenating every node's valid window, front to back, yields exactly
//! the bytes buffered for one direction of a connection.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::trace;

use crate::buffer::{BufferNode, BufferPool};
use crate::error::{Error, Result};

/// The generic chain shared by [`InputBuffer`](crate::InputBuffer) and
/// [`OutputBuffer`](crate::OutputBuffer).
///
/// A chain exclusively owns its nodes. Nodes leave it only by being
/// released to the pool it draws from; dropping the chain releases them all.
///
/// # Example
/// ```
/// use netbuf::{BufferChain, BufferPool, PoolConfig};
/// use std::sync::Arc;
///
/// let pool = Arc::new(BufferPool::new(PoolConfig::default()));
/// let mut chain = BufferChain::new(Arc::clone(&pool));
/// assert!(chain.is_empty());
///
/// let mut node = pool.allocate_default().unwrap();
/// node.extend_from_slice(b"abc");
/// chain.push_back(node).unwrap();
///
/// chain.pop(1).unwrap();
/// assert_eq!(chain.to_vec(), b"bc");
/// ```
pub struct BufferChain {
    pool: Arc<BufferPool>,
    nodes: VecDeque<BufferNode>,
}

impl BufferChain {
    /// Create an empty chain drawing from `pool`.
    pub fn new(pool: Arc<BufferPool>) -> Self {
        Self {
            pool,
            nodes: VecDeque::new(),
        }
    }

    /// The pool this chain allocates from and releases to.
    pub fn pool(&self) -> &Arc<BufferPool> {
        &self.pool
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Total buffered bytes across every node.
    pub fn len(&self) -> usize {
        self.nodes.iter().map(BufferNode::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.iter().all(BufferNode::is_empty)
    }

    /// Number of nodes currently owned.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes in stream order.
    pub fn nodes(&self) -> impl Iterator<Item = &BufferNode> {
        self.nodes.iter()
    }

    /// Non-empty valid windows in stream order.
    pub fn chunks(&self) -> impl Iterator<Item = &[u8]> {
        self.nodes
            .iter()
            .map(BufferNode::as_slice)
            .filter(|s| !s.is_empty())
    }

    /// Gather the logical stream into one vector.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        for chunk in self.chunks() {
            out.extend_from_slice(chunk);
        }
        out
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Consume `len` bytes from the front of the stream.
    ///
    /// Nodes drained completely are released to the pool; the node holding
    /// the last consumed byte keeps its remainder with `head` advanced.
    ///
    /// # Errors
    /// `Error::PopOutOfRange` if `len` exceeds [`len()`](Self::len). The
    /// chain is left untouched.
    pub fn pop(&mut self, len: usize) -> Result<()> {
        let available = self.len();
        if len > available {
            return Err(Error::PopOutOfRange {
                requested: len,
                available,
            });
        }

        let mut remaining = len;
        while let Some(front) = self.nodes.front_mut() {
            if front.len() <= remaining {
                remaining -= front.len();
                if let Some(drained) = self.nodes.pop_front() {
                    self.pool.release(drained);
                }
                if remaining == 0 {
                    break;
                }
            } else {
                front.pop(remaining)?;
                break;
            }
        }

        trace!(popped = len, left = available - len, "popped from chain");
        Ok(())
    }

    /// Release every node, leaving the chain empty.
    pub fn clear(&mut self) {
        for node in self.nodes.drain(..) {
            self.pool.release(node);
        }
    }

    /// Append an owned node at the tail.
    ///
    /// # Errors
    /// `Error::ForeignNode` if `node` was constructed by a pool other than
    /// this chain's. The node is dropped, which hands its memory back to its
    /// own pool.
    pub fn push_back(&mut self, node: BufferNode) -> Result<()> {
        if node.id().pool() != self.pool.id() {
            return Err(Error::ForeignNode {
                node: node.id(),
                pool: self.pool.id(),
            });
        }
        self.nodes.push_back(node);
        Ok(())
    }

    pub(crate) fn front_mut(&mut self) -> Option<&mut BufferNode> {
        self.nodes.front_mut()
    }

    pub(crate) fn back_mut(&mut self) -> Option<&mut BufferNode> {
        self.nodes.back_mut()
    }

    pub(crate) fn pop_back(&mut self) -> Option<BufferNode> {
        self.nodes.pop_back()
    }

    pub(crate) fn front(&self) -> Option<&BufferNode> {
        self.nodes.front()
    }
}

impl Drop for BufferChain {
    fn drop(&mut self) {
        self.clear();
    }
}

impl std::fmt::Debug for BufferChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferChain")
            .field("len", &self.len())
            .field("nodes", &self.nodes)
            .finish()
    }
}
