//! Error types for the Scatter/Gather driver

use crate::domain::types::{BlockIdentity, FileHandle, NodeId, SeqNum};
use thiserror::Error;

/// Validation failures raised by the packet codec.
///
/// One variant per malformed field so callers can tell exactly which part
/// of a frame was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PacketError {
    #[error("Packet buffer is empty")]
    EmptyBuffer,

    #[error("Bad local node id (zero)")]
    BadLocalId,

    #[error("Bad remote node id (zero)")]
    BadRemoteId,

    #[error("Bad block id (zero)")]
    BadBlockId,

    #[error("Bad operation code: {code}")]
    BadOperation { code: u32 },

    #[error("Bad sender sequence number (zero)")]
    BadSenderSeq,

    #[error("Bad receiver sequence number (zero)")]
    BadReceiverSeq,

    #[error("Bad payload length: {len} (expected {expected})")]
    BadPayloadLength { len: usize, expected: usize },

    #[error("Truncated frame: {len} bytes, need {needed}")]
    Truncated { len: usize, needed: usize },

    #[error("Bad frame magic: {found:#x}")]
    BadMagic { found: u32 },

    #[error("Bad payload flag: {flag}")]
    BadPayloadFlag { flag: u8 },

    #[error("Frame carries a payload the caller did not expect")]
    UnexpectedPayload,

    #[error("Frame is missing the expected payload")]
    MissingPayload,
}

/// Failures reported by the transport collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Transport unavailable: {0}")]
    Unavailable(String),

    #[error("Request rejected by service: {0}")]
    Rejected(String),
}

/// Block cache failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("Invalid cache capacity: {capacity}")]
    InvalidCapacity { capacity: usize },

    #[error("Cannot allocate cache storage for {capacity} blocks")]
    Allocation { capacity: usize },

    #[error("Reserved block identity {remote:#x}/{block:#x}")]
    ReservedIdentity { remote: u64, block: u64 },
}

/// Errors returned by every public driver entry point.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Packet error: {0}")]
    Packet(#[from] PacketError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Invalid file handle: {handle}")]
    InvalidHandle { handle: FileHandle },

    #[error("File handle {handle} is not open")]
    FileNotOpen { handle: FileHandle },

    #[error("Read past end of file: cursor {cursor}, size {size}")]
    ReadPastEnd { cursor: u64, size: u64 },

    #[error("Seek out of range: offset {offset}, size {size}")]
    SeekOutOfRange { offset: u64, size: u64 },

    #[error("Access of {len} bytes at cursor {cursor} overflows the file offset range")]
    OffsetOverflow { cursor: u64, len: usize },

    #[error("Reserved identity returned by service: remote {remote:#x}, block {block:#x}")]
    ReservedIdentity { remote: NodeId, block: u64 },

    #[error("Response names block {answered} instead of {requested}")]
    IdentityMismatch {
        requested: BlockIdentity,
        answered: BlockIdentity,
    },

    #[error("Stale sequence from node {remote:#x}: expected at least {expected}, got {received}")]
    StaleSequence {
        remote: NodeId,
        expected: SeqNum,
        received: SeqNum,
    },

    #[error("Unexpected operation in response: sent {sent}, received {received}")]
    UnexpectedOperation { sent: String, received: String },

    #[error("Endpoint initialization rejected: local id {local:#x}")]
    EndpointRejected { local: NodeId },

    #[error("Block {index} of handle {handle} already has an identity")]
    BlockAlreadyAssigned { handle: FileHandle, index: u64 },

    #[error("Session has been shut down")]
    SessionStopped,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DriverError {
    /// C-style status value for callers that need the sentinel convention.
    pub fn status_code(&self) -> i32 {
        -1
    }

    /// Whether the error aborts the in-flight call independently of its
    /// arguments. The session itself stays usable unless it was stopped.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DriverError::Transport(_)
                | DriverError::Cache(CacheError::Allocation { .. })
                | DriverError::EndpointRejected { .. }
                | DriverError::SessionStopped
        )
    }
}
