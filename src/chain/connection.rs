//! Per-connection buffer pair.

use std::os::fd::RawFd;
use std::sync::Arc;

use crate::buffer::BufferPool;
use crate::chain::{InputBuffer, OutputBuffer};
use crate::error::Result;

/// The read-side and write-side chains of one connection.
///
/// Both draw from the same shared pool. The owning connection drives them
/// from one thread at a time; the pool lock is the only synchronization
/// between connections.
///
/// # Example
/// ```
/// use netbuf::{BufferPool, ConnectionBuffers, PoolConfig};
/// use std::sync::Arc;
///
/// let pool = Arc::new(BufferPool::new(PoolConfig::default()));
/// let mut conn = ConnectionBuffers::new(&pool);
///
/// conn.output.append(b"pong").unwrap();
/// assert_eq!(conn.pending_write(), 4);
/// assert_eq!(conn.pending_read(), 0);
/// ```
#[derive(Debug)]
pub struct ConnectionBuffers {
    pub input: InputBuffer,
    pub output: OutputBuffer,
}

impl ConnectionBuffers {
    pub fn new(pool: &Arc<BufferPool>) -> Self {
        Self {
            input: InputBuffer::new(Arc::clone(pool)),
            output: OutputBuffer::new(Arc::clone(pool)),
        }
    }

    /// Bytes read but not yet consumed.
    pub fn pending_read(&self) -> usize {
        self.input.len()
    }

    /// Bytes appended but not yet flushed.
    pub fn pending_write(&self) -> usize {
        self.output.len()
    }

    /// Read once from `fd` into the input chain.
    pub fn read(&mut self, fd: RawFd) -> Result<usize> {
        self.input.read_fd(fd)
    }

    /// Flush the output chain to `fd`.
    pub fn flush(&mut self, fd: RawFd) -> Result<usize> {
        self.output.flush_fd(fd)
    }

    /// Return every node of both chains to the pool.
    pub fn clear(&mut self) {
        self.input.clear();
        self.output.clear();
    }
}
