//! Shared helpers for the integration suite and benchmarks.

use sg_driver::domain::DATA_PACKET_SIZE;
use sg_driver::{
    BlockTransport, DriverConfig, DriverConfigBuilder, InMemoryBlockService, Packet, SgDriver,
    TransportError, QUADRANT_SIZE,
};
use sg_telemetry::{init_tracing, TelemetryConfig};

/// Install a quiet subscriber once per test binary. Later calls are no-ops.
pub fn quiet_tracing() {
    let _ = init_tracing(&TelemetryConfig::default().with_log_level("warn"));
}

/// Driver over a fresh in-memory service.
pub fn driver_with_capacity(capacity: usize, seed: u64) -> SgDriver<InMemoryBlockService> {
    let config = DriverConfigBuilder::new()
        .cache_capacity(capacity)
        .build()
        .expect("valid test config");
    SgDriver::new(config, InMemoryBlockService::new(seed)).expect("driver")
}

/// Quadrant whose bytes encode `tag` and their own position.
pub fn patterned_quadrant(tag: u8) -> [u8; QUADRANT_SIZE] {
    let mut quadrant = [0u8; QUADRANT_SIZE];
    for (i, byte) in quadrant.iter_mut().enumerate() {
        *byte = tag.wrapping_mul(31).wrapping_add(i as u8);
    }
    quadrant
}

/// Transport that records every decoded request before forwarding it.
pub struct RecordingTransport {
    pub inner: InMemoryBlockService,
    pub requests: Vec<Packet>,
}

impl RecordingTransport {
    pub fn new(inner: InMemoryBlockService) -> Self {
        Self {
            inner,
            requests: Vec::new(),
        }
    }
}

impl BlockTransport for RecordingTransport {
    fn post(&mut self, request: &[u8]) -> Result<Vec<u8>, TransportError> {
        let packet = Packet::decode(request, request.len() == DATA_PACKET_SIZE)
            .map_err(|e| TransportError::Rejected(e.to_string()))?;
        self.requests.push(packet);
        self.inner.post(request)
    }
}

/// Driver over a single-node recording transport.
pub fn recording_driver(seed: u64) -> SgDriver<RecordingTransport> {
    let transport = RecordingTransport::new(InMemoryBlockService::with_nodes(1, seed));
    SgDriver::new(DriverConfig::default(), transport).expect("driver")
}
