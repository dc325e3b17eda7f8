//! netbuf - pooled, size-classed buffers for connection I/O.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            netbuf                               │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │          Connection Layer (chain/connection)            │   │
//! │  │            ConnectionBuffers = input + output           │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │                  Chains (chain/)                         │   │
//! │  │   InputBuffer (read, adjust)  OutputBuffer (append,     │   │
//! │  │              ╲                 ╱        flush)           │   │
//! │  │               BufferChain (len, pop, clear)              │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │                   Buffer Pool (buffer/)                  │   │
//! │  │   4K │ 16K │ 64K │ 256K │ 1M │ 4M │ 8M  free stacks      │   │
//! │  │      BufferPool + BufferNode + Statistics                │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │                 Descriptor I/O (net/)                    │   │
//! │  │              read │ write │ writev │ FIONREAD            │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (SizeClass, NodeId, config)
//! - [`error`] - Error type and `Result` alias
//! - [`buffer`] - Buffer pool and nodes
//! - [`chain`] - Buffer chains for the read and write side
//! - [`net`] - Raw descriptor I/O
//!
//! # Quick Start
//! ```
//! use netbuf::{BufferPool, ConnectionBuffers, PoolConfig};
//! use std::sync::Arc;
//!
//! // One pool per process, shared by every connection
//! let pool = Arc::new(BufferPool::new(PoolConfig::default()));
//! let mut conn = ConnectionBuffers::new(&pool);
//!
//! conn.output.append(b"HTTP/1.1 200 OK\r\n\r\n").unwrap();
//! let mut socket = Vec::new();
//! conn.output.flush_to(&mut socket).unwrap();
//! assert_eq!(socket, b"HTTP/1.1 200 OK\r\n\r\n");
//! ```

pub mod buffer;
pub mod chain;
pub mod common;
pub mod error;
pub mod net;

// Re-export commonly used items at crate root for convenience
pub use common::config::{DEFAULT_MEM_LIMIT_KB, SIZE_CLASSES};
pub use common::{ExhaustionPolicy, NodeId, PoolConfig, SizeClass};
pub use error::{Error, Result};

pub use buffer::{BufferNode, BufferPool, PoolStats, StatsSnapshot};
pub use chain::{BufferChain, ConnectionBuffers, InputBuffer, OutputBuffer};
pub use net::Descriptor;
