//! # Outbound Ports (Driven Ports)
//!
//! Dependencies required by the driver.
//!
//! Production: a network client posting frames to the block service.
//! Testing: `InMemoryBlockService` (adapters/memory.rs) or a closure.

use crate::error::TransportError;

/// Moves one serialized request to the block service and returns the
/// serialized response.
///
/// A single blocking call: no pipelining, no retries. Timeout policy, if
/// any, belongs to the implementation.
pub trait BlockTransport: Send {
    fn post(&mut self, request: &[u8]) -> Result<Vec<u8>, TransportError>;
}

impl<F> BlockTransport for F
where
    F: FnMut(&[u8]) -> Result<Vec<u8>, TransportError> + Send,
{
    fn post(&mut self, request: &[u8]) -> Result<Vec<u8>, TransportError> {
        self(request)
    }
}
