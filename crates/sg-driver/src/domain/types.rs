//! # Protocol Types and Constants
//!
//! Identities, operation codes and the fixed sizes of the wire protocol.
//! These are protocol constants, not configuration: both ends of the wire
//! must agree on them.

use crate::error::PacketError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a node (the local endpoint or a remote storage node).
pub type NodeId = u64;

/// Identifier of a block on a remote node.
pub type BlockId = u64;

/// Per-exchange ordering token.
pub type SeqNum = u16;

/// Handle of an open file, dense from zero.
pub type FileHandle = usize;

/// Size of one block in bytes.
pub const BLOCK_SIZE: usize = 1024;

/// Number of quadrants a block is divided into.
pub const QUADRANT_COUNT: usize = 4;

/// Size of one quadrant in bytes.
pub const QUADRANT_SIZE: usize = BLOCK_SIZE / QUADRANT_COUNT;

/// One block worth of payload.
pub type DataBlock = [u8; BLOCK_SIZE];

/// Frame delimiter written at the start and end of every packet.
pub const MAGIC_VALUE: u32 = 0xfefe;

/// Reserved "unknown" node id. Non-zero, so it is legal on the wire.
pub const NODE_UNKNOWN: NodeId = u64::MAX;

/// Reserved "unknown" block id.
pub const BLOCK_UNKNOWN: BlockId = u64::MAX;

/// Reserved "unknown" sequence number.
pub const SEQNO_UNKNOWN: SeqNum = u16::MAX;

/// First sequence number a fresh endpoint sends.
pub const INITIAL_SEQNO: SeqNum = 1;

/// Frame without payload:
/// magic(4) + local(8) + remote(8) + block(8) + op(4) + sseq(2) + rseq(2) + flag(1) + magic(4).
pub const BASE_PACKET_SIZE: usize = 4 + 8 + 8 + 8 + 4 + 2 + 2 + 1 + 4;

/// Frame carrying one block of payload.
pub const DATA_PACKET_SIZE: usize = BASE_PACKET_SIZE + BLOCK_SIZE;

/// Operations understood by the block service.
///
/// The codes form the closed range `0..=6`; anything else is rejected by
/// the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum Operation {
    InitEndpoint = 0,
    StopEndpoint = 1,
    CreateBlock = 2,
    UpdateBlock = 3,
    ObtainBlock = 4,
    DeleteBlock = 5,
    /// Reserved slot, valid on the wire but never issued by the driver.
    Reserved = 6,
}

impl Operation {
    /// All operations in code order.
    pub const ALL: [Operation; 7] = [
        Operation::InitEndpoint,
        Operation::StopEndpoint,
        Operation::CreateBlock,
        Operation::UpdateBlock,
        Operation::ObtainBlock,
        Operation::DeleteBlock,
        Operation::Reserved,
    ];

    /// Wire code of this operation.
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Parse a wire code.
    pub fn from_code(code: u32) -> Result<Self, PacketError> {
        Self::ALL
            .get(code as usize)
            .copied()
            .ok_or(PacketError::BadOperation { code })
    }

    /// Short name used in log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::InitEndpoint => "init-endpoint",
            Operation::StopEndpoint => "stop-endpoint",
            Operation::CreateBlock => "create-block",
            Operation::UpdateBlock => "update-block",
            Operation::ObtainBlock => "obtain-block",
            Operation::DeleteBlock => "delete-block",
            Operation::Reserved => "reserved",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Location of a block: the remote node holding it and its id there.
///
/// Assigned once by the remote side on creation and immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockIdentity {
    pub remote: NodeId,
    pub block: BlockId,
}

impl BlockIdentity {
    pub fn new(remote: NodeId, block: BlockId) -> Self {
        Self { remote, block }
    }

    /// True if either component is the zero "unset" value.
    pub fn is_unset(&self) -> bool {
        self.remote == 0 || self.block == 0
    }

    /// True if the identity names a real block: neither zero nor an
    /// unknown sentinel.
    pub fn is_assigned(&self) -> bool {
        !self.is_unset() && self.remote != NODE_UNKNOWN && self.block != BLOCK_UNKNOWN
    }
}

impl fmt::Display for BlockIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}/{:#x}", self.remote, self.block)
    }
}
