//! OutputBuffer - the write side of a connection.

use std::io::{self, IoSlice, Write};
use std::ops::{Deref, DerefMut};
use std::os::fd::RawFd;
use std::sync::Arc;

use libc::UIO_MAXIOV;
use tracing::{trace, warn};

use crate::buffer::BufferPool;
use crate::chain::BufferChain;
use crate::common::SizeClass;
use crate::error::{Error, Result};
use crate::net::Descriptor;

/// A chain that grows by copying caller bytes in and drains by flushing to a
/// descriptor.
///
/// Derefs to [`BufferChain`] for `len`, `pop` and `clear`.
///
/// # Example
/// ```
/// use netbuf::{BufferPool, OutputBuffer, PoolConfig};
/// use std::sync::Arc;
///
/// let pool = Arc::new(BufferPool::new(PoolConfig::default()));
/// let mut output = OutputBuffer::new(pool);
///
/// output.append(b"hello").unwrap();
/// output.append(b" world").unwrap();
///
/// let mut sink = Vec::new();
/// assert_eq!(output.flush_to(&mut sink).unwrap(), 11);
/// assert_eq!(sink, b"hello world");
/// assert!(output.is_empty());
/// ```
#[derive(Debug)]
pub struct OutputBuffer {
    chain: BufferChain,
}

impl OutputBuffer {
    pub fn new(pool: Arc<BufferPool>) -> Self {
        Self {
            chain: BufferChain::new(pool),
        }
    }

    /// Copy `bytes` onto the end of the stream.
    ///
    /// Fills the tail node first, then chains fresh nodes sized to what is
    /// left (capped at the largest size class).
    ///
    /// Returns the bytes accepted. Under the `Abort` exhaustion policy this
    /// is always `bytes.len()`. Under `Backpressure` a result short of
    /// `bytes.len()` means the pool hit its memory ceiling part way; the
    /// accepted prefix stays buffered.
    ///
    /// # Errors
    /// `Error::MemoryExhausted` if the ceiling was hit before any byte was
    /// accepted.
    pub fn append(&mut self, bytes: &[u8]) -> Result<usize> {
        let mut accepted = 0;

        while accepted < bytes.len() {
            let rest = &bytes[accepted..];

            if let Some(tail) = self.chain.back_mut() {
                if tail.tail_room() < rest.len() {
                    tail.adjust();
                }
                accepted += tail.extend_from_slice(rest);
                if accepted == bytes.len() {
                    break;
                }
            }

            let rest = bytes.len() - accepted;
            let class = SizeClass::fit(rest).unwrap_or(SizeClass::LARGEST);
            match self.chain.pool().allocate_class(class) {
                Ok(node) => self.chain.push_back(node)?,
                Err(e @ Error::MemoryExhausted { .. }) if accepted > 0 => {
                    warn!(accepted, dropped = rest, error = %e, "append cut short");
                    return Ok(accepted);
                }
                Err(e) => return Err(e),
            }
        }

        trace!(appended = accepted, buffered = self.chain.len(), "appended to chain");
        Ok(accepted)
    }

    /// Write as much of the stream to `fd` as it accepts, in one system call.
    ///
    /// See [`flush_to`](Self::flush_to).
    pub fn flush_fd(&mut self, fd: RawFd) -> Result<usize> {
        self.flush_to(&mut Descriptor::new(fd))
    }

    /// Write as much of the stream to `dst` as it accepts.
    ///
    /// A single node goes out with `write`; several are gathered into one
    /// `write_vectored`. Written bytes are popped, releasing drained nodes.
    ///
    /// Returns the bytes written; `0` when the chain is empty or `dst` would
    /// block.
    ///
    /// # Errors
    /// `Error::Io` on a fatal write error. The chain is left intact.
    pub fn flush_to<W: Write>(&mut self, dst: &mut W) -> Result<usize> {
        if self.chain.is_empty() {
            return Ok(0);
        }

        let written = loop {
            let result = {
                let slices: Vec<IoSlice<'_>> = self
                    .chain
                    .chunks()
                    .take(UIO_MAXIOV as usize)
                    .map(IoSlice::new)
                    .collect();
                if slices.len() == 1 {
                    dst.write(&slices[0])
                } else {
                    dst.write_vectored(&slices)
                }
            };

            match result {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(0),
                Err(e) => {
                    warn!(error = %e, buffered = self.chain.len(), "flush failed");
                    return Err(e.into());
                }
            }
        };

        self.chain.pop(written)?;
        trace!(written, left = self.chain.len(), "flushed chain");
        Ok(written)
    }
}

impl Deref for OutputBuffer {
    type Target = BufferChain;

    #[inline]
    fn deref(&self) -> &BufferChain {
        &self.chain
    }
}

impl DerefMut for OutputBuffer {
    #[inline]
    fn deref_mut(&mut self) -> &mut BufferChain {
        &mut self.chain
    }
}
