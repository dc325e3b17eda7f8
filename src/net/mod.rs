//! Descriptor-level I/O.
//!
//! - [`Descriptor`] - `read`/`write`/`writev` on a borrowed raw descriptor

mod descriptor;

pub use descriptor::Descriptor;
