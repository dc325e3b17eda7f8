//! Buffer chains - per-connection byte streams built from pool nodes.
//!
//! # Components
//! - [`BufferChain`] - Generic chain: length, front consumption, release
//! - [`InputBuffer`] - Read side: grows by reading from a descriptor
//! - [`OutputBuffer`] - Write side: grows by appending, drains by flushing
//! - [`ConnectionBuffers`] - One input and one output chain per connection

mod buffer_chain;
mod connection;
mod input;
mod output;

pub use buffer_chain::BufferChain;
pub use connection::ConnectionBuffers;
pub use input::InputBuffer;
pub use output::OutputBuffer;
