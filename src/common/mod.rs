//! Common types and utilities shared across netbuf.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration constants and [`PoolConfig`]
//! - Identifiers ([`SizeClass`], [`NodeId`])

pub mod config;
mod node_id;
mod size_class;

pub use config::{ExhaustionPolicy, PoolConfig};
pub use node_id::NodeId;
pub use size_class::SizeClass;
