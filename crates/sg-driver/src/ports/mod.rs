//! # Ports Layer
//!
//! Defines the port traits for the Scatter/Gather driver.
//!
//! ## Hexagonal Architecture
//!
//! - `inbound.rs` - Driving ports (file-level API exposed to callers)
//! - `outbound.rs` - Driven ports (the transport the driver requires)

pub mod inbound;
pub mod outbound;
