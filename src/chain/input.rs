//! InputBuffer - the read side of a connection.

use std::io::{self, Read};
use std::ops::{Deref, DerefMut};
use std::os::fd::RawFd;
use std::sync::Arc;

use tracing::{trace, warn};

use crate::buffer::BufferPool;
use crate::chain::BufferChain;
use crate::common::config::DEFAULT_READ_HINT;
use crate::common::SizeClass;
use crate::error::Result;
use crate::net::Descriptor;

/// A chain that grows by reading from a descriptor.
///
/// Derefs to [`BufferChain`] for `len`, `pop` and `clear`.
///
/// # Example
/// ```
/// use netbuf::{BufferPool, InputBuffer, PoolConfig};
/// use std::sync::Arc;
///
/// let pool = Arc::new(BufferPool::new(PoolConfig::default()));
/// let mut input = InputBuffer::new(pool);
///
/// let mut src: &[u8] = b"GET / HTTP/1.1\r\n";
/// let n = input.read_from(&mut src).unwrap();
/// assert_eq!(n, 16);
/// assert_eq!(input.data(), b"GET / HTTP/1.1\r\n");
///
/// input.pop(4).unwrap();
/// assert_eq!(input.data(), b"/ HTTP/1.1\r\n");
/// ```
#[derive(Debug)]
pub struct InputBuffer {
    chain: BufferChain,
    /// Size requested from the pool when a new node is needed.
    read_hint: usize,
}

impl InputBuffer {
    pub fn new(pool: Arc<BufferPool>) -> Self {
        Self {
            chain: BufferChain::new(pool),
            read_hint: DEFAULT_READ_HINT,
        }
    }

    /// Set the expected read size used to pick new nodes' size class.
    ///
    /// Clamped to the largest size class.
    pub fn with_read_hint(mut self, read_hint: usize) -> Self {
        self.read_hint = clamp_hint(read_hint);
        self
    }

    pub fn read_hint(&self) -> usize {
        self.read_hint
    }

    /// Readable bytes of the front node.
    ///
    /// Empty when the chain is empty. Bytes in later nodes follow once the
    /// front node is fully popped; see [`BufferChain::chunks`] for all of them.
    pub fn data(&self) -> &[u8] {
        self.chain.front().map(|node| node.as_slice()).unwrap_or(&[])
    }

    /// Compact the front node so its free space is contiguous at the tail.
    pub fn adjust(&mut self) {
        if let Some(front) = self.chain.front_mut() {
            front.adjust();
        }
    }

    /// Read once from `fd` into the chain.
    ///
    /// New nodes are sized to the larger of the read hint and the bytes the
    /// descriptor reports pending.
    ///
    /// Returns the bytes read, `0` on end of stream.
    ///
    /// # Errors
    /// `Error::Io` for both would-block (check
    /// [`Error::is_would_block`](crate::Error::is_would_block)) and fatal
    /// descriptor errors.
    pub fn read_fd(&mut self, fd: RawFd) -> Result<usize> {
        let mut descriptor = Descriptor::new(fd);
        let pending = descriptor.bytes_available().unwrap_or(0);
        let hint = clamp_hint(self.read_hint.max(pending));
        self.read_with_hint(&mut descriptor, hint)
    }

    /// Read once from `src` into the chain.
    ///
    /// Same contract as [`read_fd`](Self::read_fd), for any reader.
    pub fn read_from<R: Read>(&mut self, src: &mut R) -> Result<usize> {
        self.read_with_hint(src, self.read_hint)
    }

    fn read_with_hint<R: Read>(&mut self, src: &mut R, hint: usize) -> Result<usize> {
        let mut fresh = false;

        match self.chain.back_mut() {
            Some(tail) => {
                // A partly drained tail is also the front; compact before refilling
                tail.adjust();
                if tail.tail_room() == 0 {
                    let node = self.chain.pool().allocate(hint)?;
                    self.chain.push_back(node)?;
                    fresh = true;
                }
            }
            None => {
                let node = self.chain.pool().allocate(hint)?;
                self.chain.push_back(node)?;
                fresh = true;
            }
        }

        let result = match self.chain.back_mut() {
            Some(tail) => match read_into(src, tail.spare_mut()) {
                Ok(n) => tail.commit(n).map(|()| n),
                Err(e) => Err(e),
            },
            None => Ok(0),
        };

        // Don't keep an empty node around when nothing arrived
        if fresh && !matches!(result, Ok(n) if n > 0) {
            if let Some(node) = self.chain.pop_back() {
                self.chain.pool().release(node);
            }
        }

        match &result {
            Ok(n) => trace!(read = n, buffered = self.chain.len(), "read into chain"),
            Err(e) if e.is_would_block() => {}
            Err(e) => warn!(error = %e, "read failed"),
        }
        result
    }
}

/// One read, retried on `EINTR`.
fn read_into<R: Read>(src: &mut R, buf: &mut [u8]) -> Result<usize> {
    loop {
        match src.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

fn clamp_hint(hint: usize) -> usize {
    hint.min(SizeClass::LARGEST.capacity())
}

impl Deref for InputBuffer {
    type Target = BufferChain;

    #[inline]
    fn deref(&self) -> &BufferChain {
        &self.chain
    }
}

impl DerefMut for InputBuffer {
    #[inline]
    fn deref_mut(&mut self) -> &mut BufferChain {
        &mut self.chain
    }
}
