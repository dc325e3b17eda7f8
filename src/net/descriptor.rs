//! Descriptor - raw descriptor I/O for buffer chains.
//!
//! The [`Descriptor`] performs the three system calls the chains need:
//! - `read(2)` into a node's free tail
//! - `write(2)` / `writev(2)` from node windows
//! - `ioctl(FIONREAD)` to size the next read
//!
//! It borrows the descriptor number: it never opens, closes or configures
//! the underlying file or socket.

use std::io::{self, IoSlice, Read, Write};
use std::os::fd::{AsRawFd, RawFd};

use libc::{c_int, c_void, iovec, UIO_MAXIOV};

/// A borrowed raw descriptor.
///
/// # Thread Safety
/// `Descriptor` is `Copy`; it carries no state beyond the number. Ordering
/// of reads and writes on one descriptor is the owning connection's job.
///
/// # Example
/// ```
/// use std::io::{Read, Write};
/// use std::os::fd::AsRawFd;
/// use std::os::unix::net::UnixStream;
/// use netbuf::Descriptor;
///
/// let (a, b) = UnixStream::pair().unwrap();
/// Descriptor::new(a.as_raw_fd()).write_all(b"ping").unwrap();
///
/// let mut buf = [0u8; 4];
/// Descriptor::new(b.as_raw_fd()).read_exact(&mut buf).unwrap();
/// assert_eq!(&buf, b"ping");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor(RawFd);

impl Descriptor {
    #[inline]
    pub fn new(fd: RawFd) -> Self {
        Descriptor(fd)
    }

    /// Bytes that can be read without blocking, per `FIONREAD`.
    pub fn bytes_available(&self) -> io::Result<usize> {
        let mut pending: c_int = 0;
        // Safety: FIONREAD writes a single c_int through the pointer, which
        // is valid for the duration of the call.
        let res = unsafe { libc::ioctl(self.0, libc::FIONREAD, &mut pending as *mut c_int) };
        if res == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(pending.max(0) as usize)
    }
}

impl AsRawFd for Descriptor {
    fn as_raw_fd(&self) -> RawFd {
        self.0
    }
}

impl From<RawFd> for Descriptor {
    fn from(fd: RawFd) -> Self {
        Descriptor(fd)
    }
}

/// Map a syscall return value to `io::Result`.
fn cvt(res: isize) -> io::Result<usize> {
    if res < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(res as usize)
    }
}

impl Read for Descriptor {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        // Safety: buf is valid for writes of buf.len() bytes.
        let res = unsafe { libc::read(self.0, buf.as_mut_ptr() as *mut c_void, buf.len()) };
        cvt(res)
    }
}

impl Write for Descriptor {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // Safety: buf is valid for reads of buf.len() bytes.
        let res = unsafe { libc::write(self.0, buf.as_ptr() as *const c_void, buf.len()) };
        cvt(res)
    }

    fn write_vectored(&mut self, bufs: &[IoSlice<'_>]) -> io::Result<usize> {
        let iovs: Vec<iovec> = bufs
            .iter()
            .take(UIO_MAXIOV as usize)
            .map(|b| iovec {
                iov_base: b.as_ptr() as *mut c_void,
                iov_len: b.len(),
            })
            .collect();

        // Safety: every iovec points into a slice borrowed for this call.
        let res = unsafe { libc::writev(self.0, iovs.as_ptr(), iovs.len() as c_int) };
        cvt(res)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
