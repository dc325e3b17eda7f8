//! BufferNode - the unit of allocation and reuse.
//!
//! A [`BufferNode`] is a fixed-capacity byte block plus a valid-data window:
//! - `head`: offset where valid data begins
//! - `len`: number of valid bytes
//! - `capacity`: fixed at construction, always one size class
//!
//! Invariant: `head + len <= capacity`. Bytes outside `[head, head + len)`
//! are never treated as data.

use std::sync::Weak;

use parking_lot::Mutex;

use crate::buffer::PoolState;
use crate::common::{NodeId, SizeClass};
use crate::error::{Error, Result};

/// A fixed-capacity buffer owned either by a pool free stack or by exactly
/// one chain.
///
/// `BufferNode` is move-only: it implements neither `Clone` nor `Copy`, so
/// the compiler rules out a node sitting in two places at once. Nodes are
/// only constructed by [`BufferPool`](crate::BufferPool).
///
/// Hand a node back with [`BufferPool::release`](crate::BufferPool::release)
/// to reuse it. A node dropped instead frees its storage and returns its
/// share of the memory ceiling to the pool.
pub struct BufferNode {
    id: NodeId,
    class: SizeClass,
    head: usize,
    len: usize,
    data: Box<[u8]>,
    /// Accounting of the pool that constructed this node.
    home: Weak<Mutex<PoolState>>,
}

impl BufferNode {
    /// Construct a zeroed node of the given class.
    ///
    /// Called by the pool outside its lock.
    pub(crate) fn new(id: NodeId, class: SizeClass, home: Weak<Mutex<PoolState>>) -> Self {
        Self {
            id,
            class,
            head: 0,
            len: 0,
            data: vec![0u8; class.capacity()].into_boxed_slice(),
            home,
        }
    }

    // ========================================================================
    // Geometry
    // ========================================================================

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    pub fn size_class(&self) -> SizeClass {
        self.class
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of valid bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Offset of the first valid byte.
    #[inline]
    pub fn head(&self) -> usize {
        self.head
    }

    /// Free bytes after the valid window.
    #[inline]
    pub fn tail_room(&self) -> usize {
        self.capacity() - self.head - self.len
    }

    // ========================================================================
    // Data access
    // ========================================================================

    /// The valid-data window.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[self.head..self.head + self.len]
    }

    /// Free space after the valid window, for reads to land in.
    ///
    /// Bytes written here become data only after [`commit`](Self::commit).
    #[inline]
    pub fn spare_mut(&mut self) -> &mut [u8] {
        let end = self.head + self.len;
        &mut self.data[end..]
    }

    /// Mark `n` bytes of the spare region as valid.
    pub fn commit(&mut self, n: usize) -> Result<()> {
        let available = self.tail_room();
        if n > available {
            return Err(Error::CommitOutOfRange {
                requested: n,
                available,
            });
        }
        self.len += n;
        Ok(())
    }

    /// Copy as much of `bytes` as fits into the tail. Returns bytes copied.
    pub fn extend_from_slice(&mut self, bytes: &[u8]) -> usize {
        let n = bytes.len().min(self.tail_room());
        self.spare_mut()[..n].copy_from_slice(&bytes[..n]);
        self.len += n;
        n
    }

    // ========================================================================
    // Window operations
    // ========================================================================

    /// Reset the window to empty. Storage contents are left as they are.
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Move the valid window to offset 0 so all free space sits at the tail.
    ///
    /// No-op when already aligned. Never changes `len` or the bytes in the
    /// window.
    pub fn adjust(&mut self) {
        if self.head != 0 {
            if self.len != 0 {
                self.data.copy_within(self.head..self.head + self.len, 0);
            }
            self.head = 0;
        }
    }

    /// Overwrite this node with `other`'s valid window.
    ///
    /// # Errors
    /// `Error::CopyOverflow` if the window is larger than this node.
    pub fn copy(&mut self, other: &BufferNode) -> Result<()> {
        let needed = other.len;
        if needed > self.capacity() {
            return Err(Error::CopyOverflow {
                needed,
                capacity: self.capacity(),
            });
        }
        self.data[..needed].copy_from_slice(other.as_slice());
        self.head = 0;
        self.len = needed;
        Ok(())
    }

    /// Discard the first `n` valid bytes.
    ///
    /// # Errors
    /// `Error::PopOutOfRange` if `n` exceeds the valid length; the node is
    /// left untouched.
    pub fn pop(&mut self, n: usize) -> Result<()> {
        if n > self.len {
            return Err(Error::PopOutOfRange {
                requested: n,
                available: self.len,
            });
        }
        self.head += n;
        self.len -= n;
        Ok(())
    }
}

impl Drop for BufferNode {
    fn drop(&mut self) {
        // Free-stack nodes drop with their pool, after `home` is gone
        if let Some(home) = self.home.upgrade() {
            home.lock().forget(self.id, self.class);
        }
    }
}

impl std::fmt::Debug for BufferNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferNode")
            .field("id", &self.id)
            .field("class", &self.class)
            .field("head", &self.head)
            .field("len", &self.len)
            .finish()
    }
}
