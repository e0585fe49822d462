//! # Packet Codec
//!
//! Encodes and decodes the fixed Scatter/Gather wire frame. Pure and
//! stateless: no I/O, no logging.
//!
//! ## Frame Layout (little-endian)
//!
//! ```text
//! +-------+-------+--------+-------+----+------+------+------+-----------+-------+
//! | magic | local | remote | block | op | sseq | rseq | flag | [payload] | magic |
//! |  u32  |  u64  |  u64   |  u64  |u32 | u16  | u16  |  u8  | 1024 B    |  u32  |
//! +-------+-------+--------+-------+----+------+------+------+-----------+-------+
//! ```
//!
//! The payload is present iff `flag == 1`. Frames are either
//! `BASE_PACKET_SIZE` or `DATA_PACKET_SIZE` bytes long.

use crate::domain::types::{
    BlockId, DataBlock, NodeId, Operation, SeqNum, BASE_PACKET_SIZE, BLOCK_SIZE, DATA_PACKET_SIZE,
    MAGIC_VALUE,
};
use crate::error::PacketError;

/// A decoded (or to-be-encoded) Scatter/Gather frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub local: NodeId,
    pub remote: NodeId,
    pub block: BlockId,
    pub op: Operation,
    pub sender_seq: SeqNum,
    pub receiver_seq: SeqNum,
    pub payload: Option<Box<DataBlock>>,
}

impl Packet {
    /// Build a frame without payload.
    pub fn new(
        local: NodeId,
        remote: NodeId,
        block: BlockId,
        op: Operation,
        sender_seq: SeqNum,
        receiver_seq: SeqNum,
    ) -> Self {
        Self {
            local,
            remote,
            block,
            op,
            sender_seq,
            receiver_seq,
            payload: None,
        }
    }

    /// Attach one block of payload.
    pub fn with_payload(mut self, payload: &DataBlock) -> Self {
        self.payload = Some(Box::new(*payload));
        self
    }

    /// Expected encoded length of this frame.
    pub fn encoded_len(&self) -> usize {
        if self.payload.is_some() {
            DATA_PACKET_SIZE
        } else {
            BASE_PACKET_SIZE
        }
    }

    /// Encode into a freshly allocated buffer.
    pub fn encode(&self) -> Result<Vec<u8>, PacketError> {
        let mut out = Vec::with_capacity(self.encoded_len());
        encode_fields(
            self.local,
            self.remote,
            self.block,
            self.op.code(),
            self.sender_seq,
            self.receiver_seq,
            self.payload.as_deref().map(|p| p.as_slice()),
            &mut out,
        )?;
        Ok(out)
    }

    /// Decode a frame. `expect_payload` states whether the caller is
    /// prepared to receive a block of data.
    pub fn decode(buf: &[u8], expect_payload: bool) -> Result<Self, PacketError> {
        decode(buf, expect_payload)
    }
}

/// Validate header fields in wire order. Shared by encode and decode.
fn validate_fields(
    local: NodeId,
    remote: NodeId,
    block: BlockId,
    op: u32,
    sender_seq: SeqNum,
    receiver_seq: SeqNum,
) -> Result<Operation, PacketError> {
    if local == 0 {
        return Err(PacketError::BadLocalId);
    }
    if remote == 0 {
        return Err(PacketError::BadRemoteId);
    }
    if block == 0 {
        return Err(PacketError::BadBlockId);
    }
    let op = Operation::from_code(op)?;
    if sender_seq == 0 {
        return Err(PacketError::BadSenderSeq);
    }
    if receiver_seq == 0 {
        return Err(PacketError::BadReceiverSeq);
    }
    Ok(op)
}

/// Encode raw fields, appending the frame to `out`.
///
/// Takes the operation as a raw code so that out-of-range codes coming
/// from untyped callers are rejected here rather than truncated.
/// Returns the number of bytes written.
#[allow(clippy::too_many_arguments)]
pub fn encode_fields(
    local: NodeId,
    remote: NodeId,
    block: BlockId,
    op: u32,
    sender_seq: SeqNum,
    receiver_seq: SeqNum,
    payload: Option<&[u8]>,
    out: &mut Vec<u8>,
) -> Result<usize, PacketError> {
    validate_fields(local, remote, block, op, sender_seq, receiver_seq)?;
    if let Some(data) = payload {
        if data.len() != BLOCK_SIZE {
            return Err(PacketError::BadPayloadLength {
                len: data.len(),
                expected: BLOCK_SIZE,
            });
        }
    }

    let start = out.len();
    out.extend_from_slice(&MAGIC_VALUE.to_le_bytes());
    out.extend_from_slice(&local.to_le_bytes());
    out.extend_from_slice(&remote.to_le_bytes());
    out.extend_from_slice(&block.to_le_bytes());
    out.extend_from_slice(&op.to_le_bytes());
    out.extend_from_slice(&sender_seq.to_le_bytes());
    out.extend_from_slice(&receiver_seq.to_le_bytes());
    match payload {
        Some(data) => {
            out.push(1);
            out.extend_from_slice(data);
        }
        None => out.push(0),
    }
    out.extend_from_slice(&MAGIC_VALUE.to_le_bytes());

    Ok(out.len() - start)
}

/// Decode a frame, validating framing first and then every header field.
pub fn decode(buf: &[u8], expect_payload: bool) -> Result<Packet, PacketError> {
    if buf.is_empty() {
        return Err(PacketError::EmptyBuffer);
    }
    if buf.len() < BASE_PACKET_SIZE {
        return Err(PacketError::Truncated {
            len: buf.len(),
            needed: BASE_PACKET_SIZE,
        });
    }

    let mut reader = FrameReader::new(buf);
    let magic = reader.u32();
    if magic != MAGIC_VALUE {
        return Err(PacketError::BadMagic { found: magic });
    }
    let local = reader.u64();
    let remote = reader.u64();
    let block = reader.u64();
    let op = reader.u32();
    let sender_seq = reader.u16();
    let receiver_seq = reader.u16();
    let flag = reader.u8();

    let payload = match flag {
        0 => {
            if buf.len() != BASE_PACKET_SIZE {
                return Err(PacketError::BadPayloadLength {
                    len: buf.len(),
                    expected: BASE_PACKET_SIZE,
                });
            }
            if expect_payload {
                return Err(PacketError::MissingPayload);
            }
            None
        }
        1 => {
            if buf.len() != DATA_PACKET_SIZE {
                return Err(PacketError::BadPayloadLength {
                    len: buf.len(),
                    expected: DATA_PACKET_SIZE,
                });
            }
            if !expect_payload {
                return Err(PacketError::UnexpectedPayload);
            }
            let mut data = Box::new([0u8; BLOCK_SIZE]);
            data.copy_from_slice(reader.bytes(BLOCK_SIZE));
            Some(data)
        }
        other => return Err(PacketError::BadPayloadFlag { flag: other }),
    };

    let trailer = reader.u32();
    if trailer != MAGIC_VALUE {
        return Err(PacketError::BadMagic { found: trailer });
    }

    let op = validate_fields(local, remote, block, op, sender_seq, receiver_seq)?;

    Ok(Packet {
        local,
        remote,
        block,
        op,
        sender_seq,
        receiver_seq,
        payload,
    })
}

/// Sequential little-endian reader over a frame whose length has already
/// been checked.
struct FrameReader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> FrameReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    fn bytes(&mut self, len: usize) -> &'a [u8] {
        let slice = &self.buf[self.offset..self.offset + len];
        self.offset += len;
        slice
    }

    fn array<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N));
        out
    }

    fn u8(&mut self) -> u8 {
        self.bytes(1)[0]
    }

    fn u16(&mut self) -> u16 {
        u16::from_le_bytes(self.array())
    }

    fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.array())
    }

    fn u64(&mut self) -> u64 {
        u64::from_le_bytes(self.array())
    }
}
