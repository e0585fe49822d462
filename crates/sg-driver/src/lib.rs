//! # Scatter/Gather Driver
//!
//! Client-side driver presenting a byte-addressable file interface
//! (`open`/`read`/`write`/`seek`/`close`) over a remote block service.
//!
//! ## Architecture
//!
//! Files are split into 1024-byte blocks, each held on a remote node and
//! addressed by a `(remote node id, block id)` pair assigned by the
//! service when the block is created. Each block is divided into four
//! 256-byte quadrants.
//!
//! ```text
//! read/write ──→ File Directory ──→ Block Cache ──hit──→ caller
//!                                       │ miss
//!                                       ↓
//!                 Sequence Tracker → Packet Codec → BlockTransport ──→ service
//! ```
//!
//! ## Invariants
//!
//! | Area | Invariant |
//! |------|-----------|
//! | Identity | Zero is never a valid node or block id; a block's identity never changes once assigned |
//! | Cache | Entries are unique by identity and never exceed the configured capacity |
//! | Cache | Every remote write leaves the cache holding the written block |
//! | Sequence | Each peer's sequence strictly increases; a response behind local state is an error |
//! | Directory | One handle per open path; reopening rewinds the cursor |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Pure logic (codec, sequence tracker, cache, directory, addressing, config)
//! - `ports/` - Port traits (inbound file API, outbound transport)
//! - `adapters/` - In-memory block service
//! - `service/` - `SgDriver` session and its mutex-serialized `SharedDriver`
//!
//! ## Usage
//!
//! ```
//! use sg_driver::{DriverConfig, InMemoryBlockService, ScatterGatherApi, SgDriver};
//!
//! let mut driver = SgDriver::new(DriverConfig::default(), InMemoryBlockService::new(7))?;
//! let fh = driver.open("notes.txt")?;
//! driver.write(fh, &[0x42; 256])?;
//! driver.seek(fh, 0)?;
//!
//! let mut buf = [0u8; 256];
//! assert_eq!(driver.read(fh, &mut buf)?, 256);
//!
//! let stats = driver.shutdown()?;
//! println!("hit rate: {:.1}%", stats.hit_rate);
//! # Ok::<(), sg_driver::DriverError>(())
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

// Re-export key types for convenience
pub use adapters::{InMemoryBlockService, ServiceCounters};
pub use domain::{
    BlockCache, BlockIdentity, CacheStats, DriverConfig, DriverConfigBuilder, FileDirectory,
    FileHandle, FileRecord, NodeId, Operation, Packet, SeekPolicy, SequenceTracker, BLOCK_SIZE,
    QUADRANT_SIZE,
};
pub use error::{CacheError, DriverError, PacketError, TransportError};
pub use ports::inbound::ScatterGatherApi;
pub use ports::outbound::BlockTransport;
pub use service::{EndpointState, SgDriver, SharedDriver};
