//! Domain Layer - Pure driver logic
//!
//! This layer contains:
//! - Protocol types and wire constants
//! - Packet codec
//! - Sequence tracking
//! - Block cache
//! - File directory
//! - Block/quadrant addressing
//! - Configuration
//!
//! RULES:
//! - No I/O operations
//! - No logging
//! - No async code

pub mod addressing;
pub mod cache;
pub mod config;
pub mod directory;
pub mod packet;
pub mod sequence;
pub mod types;

pub use addressing::{block_index, quadrant_of, quadrant_offset, segments, BlockSegment};
pub use cache::{BlockCache, CacheStats};
pub use config::{DriverConfig, DriverConfigBuilder, SeekPolicy};
pub use directory::{FileDirectory, FileRecord};
pub use packet::Packet;
pub use sequence::{advance_sequence, SequenceTracker};
pub use types::{
    BlockId, BlockIdentity, DataBlock, FileHandle, NodeId, Operation, SeqNum, BASE_PACKET_SIZE,
    BLOCK_SIZE, BLOCK_UNKNOWN, DATA_PACKET_SIZE, INITIAL_SEQNO, MAGIC_VALUE, NODE_UNKNOWN,
    QUADRANT_COUNT, QUADRANT_SIZE, SEQNO_UNKNOWN,
};
