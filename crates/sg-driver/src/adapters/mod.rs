//! # Adapters Module
//!
//! Adapter implementations for the driver's outbound ports.
//!
//! ## Modules
//!
//! - `memory`: in-process block service speaking the wire protocol

pub mod memory;

pub use memory::{InMemoryBlockService, ServiceCounters, DEFAULT_NODE_COUNT};
