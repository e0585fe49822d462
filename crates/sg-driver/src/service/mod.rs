//! # Scatter/Gather Driver Service
//!
//! The session object implementing the file-level API.
//!
//! ## Architecture
//!
//! This service:
//! 1. Brings the endpoint up lazily on first `open` and down on `shutdown`
//! 2. Splits every read/write into per-block segments
//! 3. Creates, obtains and updates remote blocks through the packet codec
//!    and the injected [`BlockTransport`]
//! 4. Stamps and checks per-peer sequence numbers on every exchange
//! 5. Keeps the block cache coherent with every remote write
//!
//! All state lives in the session; nothing is process-wide. The driver is
//! single-threaded; wrap it in [`SharedDriver`] to share it.

mod shared;

pub use shared::SharedDriver;

use crate::domain::addressing::{segments, BlockSegment};
use crate::domain::cache::{BlockCache, CacheStats};
use crate::domain::config::DriverConfig;
use crate::domain::directory::{FileDirectory, FileRecord};
use crate::domain::packet::Packet;
use crate::domain::sequence::SequenceTracker;
use crate::domain::types::{
    BlockIdentity, DataBlock, FileHandle, NodeId, Operation, SeqNum, BLOCK_SIZE, BLOCK_UNKNOWN,
    NODE_UNKNOWN, SEQNO_UNKNOWN,
};
use crate::error::{DriverError, PacketError};
use crate::ports::inbound::ScatterGatherApi;
use crate::ports::outbound::BlockTransport;
use tracing::{debug, error, info, warn};

/// Lifecycle of the local endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointState {
    /// Not yet registered with the service.
    Offline,
    /// Registered; carries the local node id.
    Online(NodeId),
    /// Shut down. Terminal.
    Stopped,
}

/// Scatter/Gather client session.
pub struct SgDriver<T: BlockTransport> {
    /// Driver configuration.
    pub(crate) config: DriverConfig,
    /// Transport to the block service.
    pub(crate) transport: T,
    /// Block cache; `None` once torn down.
    pub(crate) cache: Option<BlockCache>,
    /// Open files and their block maps.
    pub(crate) directory: FileDirectory,
    /// Local and per-peer sequence numbers.
    pub(crate) sequences: SequenceTracker,
    /// Endpoint lifecycle.
    pub(crate) state: EndpointState,
}

impl<T: BlockTransport> SgDriver<T> {
    /// Create a driver over `transport`.
    ///
    /// Validates `config` and allocates the cache. No traffic is sent
    /// until the first `open` (or an explicit [`init_endpoint`]).
    ///
    /// [`init_endpoint`]: SgDriver::init_endpoint
    pub fn new(config: DriverConfig, transport: T) -> Result<Self, DriverError> {
        config.validate()?;
        let cache = BlockCache::new(config.cache_capacity)?;
        Ok(Self {
            config,
            transport,
            cache: Some(cache),
            directory: FileDirectory::new(),
            sequences: SequenceTracker::new(),
            state: EndpointState::Offline,
        })
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn state(&self) -> EndpointState {
        self.state
    }

    /// Local node id, once the endpoint is up.
    pub fn local_node_id(&self) -> Option<NodeId> {
        match self.state {
            EndpointState::Online(local) => Some(local),
            _ => None,
        }
    }

    /// Record of an open file.
    pub fn file_info(&self, handle: FileHandle) -> Result<&FileRecord, DriverError> {
        self.directory.get(handle)
    }

    /// Live cache statistics; `None` after shutdown.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(BlockCache::stats)
    }

    /// Last sequence number negotiated with `remote`.
    pub fn peer_sequence(&self, remote: NodeId) -> Option<SeqNum> {
        self.sequences.peer_sequence(remote)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Register the endpoint with the block service.
    ///
    /// Idempotent while online. Fails with `EndpointRejected` when the
    /// service answers with the unknown node id.
    pub fn init_endpoint(&mut self) -> Result<NodeId, DriverError> {
        match self.state {
            EndpointState::Online(local) => return Ok(local),
            EndpointState::Stopped => return Err(DriverError::SessionStopped),
            EndpointState::Offline => {}
        }

        let request = Packet::new(
            NODE_UNKNOWN,
            NODE_UNKNOWN,
            BLOCK_UNKNOWN,
            Operation::InitEndpoint,
            self.sequences.next_local_sequence(),
            SEQNO_UNKNOWN,
        );
        let response = self.exchange(&request, false)?;

        if response.local == NODE_UNKNOWN {
            error!("[sg] Endpoint initialization rejected by service");
            return Err(DriverError::EndpointRejected {
                local: response.local,
            });
        }

        self.state = EndpointState::Online(response.local);
        info!(local = format_args!("{:#x}", response.local), "[sg] Endpoint initialized");
        Ok(response.local)
    }

    fn local_id(&mut self) -> Result<NodeId, DriverError> {
        match self.state {
            EndpointState::Online(local) => Ok(local),
            EndpointState::Offline => self.init_endpoint(),
            EndpointState::Stopped => Err(DriverError::SessionStopped),
        }
    }

    fn ensure_active(&self) -> Result<(), DriverError> {
        if self.state == EndpointState::Stopped {
            return Err(DriverError::SessionStopped);
        }
        Ok(())
    }

    fn cache_mut(&mut self) -> Result<&mut BlockCache, DriverError> {
        self.cache.as_mut().ok_or(DriverError::SessionStopped)
    }

    /// One request/response round trip.
    fn exchange(&mut self, request: &Packet, expect_payload: bool) -> Result<Packet, DriverError> {
        let bytes = request.encode().map_err(|e| {
            error!(op = %request.op, "[sg] Cannot encode request: {}", e);
            e
        })?;

        debug!(
            op = %request.op,
            remote = format_args!("{:#x}", request.remote),
            block = format_args!("{:#x}", request.block),
            sseq = request.sender_seq,
            rseq = request.receiver_seq,
            "[sg] -> request"
        );

        let reply = self.transport.post(&bytes).map_err(|e| {
            error!(op = %request.op, "[sg] Transport failure: {}", e);
            e
        })?;

        let response = Packet::decode(&reply, expect_payload).map_err(|e| {
            error!(op = %request.op, "[sg] Malformed response: {}", e);
            e
        })?;

        if self.config.verify_response_operation && response.op != request.op {
            error!(sent = %request.op, received = %response.op, "[sg] Response operation mismatch");
            return Err(DriverError::UnexpectedOperation {
                sent: request.op.to_string(),
                received: response.op.to_string(),
            });
        }

        debug!(
            op = %response.op,
            remote = format_args!("{:#x}", response.remote),
            block = format_args!("{:#x}", response.block),
            rseq = response.receiver_seq,
            "[sg] <- response"
        );
        Ok(response)
    }

    /// Identity named by a response; sentinels are a remote error.
    fn response_identity(response: &Packet) -> Result<BlockIdentity, DriverError> {
        let identity = BlockIdentity::new(response.remote, response.block);
        if !identity.is_assigned() {
            error!(identity = %identity, "[sg] Reserved identity in response");
            return Err(DriverError::ReservedIdentity {
                remote: identity.remote,
                block: identity.block,
            });
        }
        Ok(identity)
    }

    /// Accept `received` from `remote` if it is not behind `expected`.
    fn check_sequence(
        &mut self,
        remote: NodeId,
        expected: SeqNum,
        received: SeqNum,
    ) -> Result<(), DriverError> {
        if received < expected {
            warn!(
                remote = format_args!("{:#x}", remote),
                expected, received, "[sg] Stale sequence number in response"
            );
            return Err(DriverError::StaleSequence {
                remote,
                expected,
                received,
            });
        }
        self.sequences.confirm_peer_sequence(remote, received);
        Ok(())
    }

    /// Create a remote block holding `data`.
    fn create_block(&mut self, data: &DataBlock) -> Result<BlockIdentity, DriverError> {
        let local = self.local_id()?;
        let request = Packet::new(
            local,
            NODE_UNKNOWN,
            BLOCK_UNKNOWN,
            Operation::CreateBlock,
            self.sequences.next_local_sequence(),
            SEQNO_UNKNOWN,
        )
        .with_payload(data);

        let response = self.exchange(&request, false)?;
        let identity = Self::response_identity(&response)?;

        // First contact registers the peer at its reported value
        let expected = self
            .sequences
            .expected_peer_sequence(identity.remote, response.receiver_seq);
        self.check_sequence(identity.remote, expected, response.receiver_seq)?;

        info!(identity = %identity, "[sg] Created block");
        Ok(identity)
    }

    /// Exchange a request addressed to an existing block.
    ///
    /// The peer's stored sequence only moves once a validated response
    /// confirms it, so a failed exchange leaves it untouched.
    fn block_request(
        &mut self,
        identity: BlockIdentity,
        op: Operation,
        data: Option<&DataBlock>,
    ) -> Result<Packet, DriverError> {
        let local = self.local_id()?;
        let rseq = self.sequences.outgoing_peer_sequence(identity.remote);
        let mut request = Packet::new(
            local,
            identity.remote,
            identity.block,
            op,
            self.sequences.next_local_sequence(),
            rseq,
        );
        if let Some(data) = data {
            request = request.with_payload(data);
        }

        let response = self.exchange(&request, op == Operation::ObtainBlock)?;
        let answered = Self::response_identity(&response)?;
        if answered != identity {
            error!(requested = %identity, answered = %answered, "[sg] Response names another block");
            return Err(DriverError::IdentityMismatch {
                requested: identity,
                answered,
            });
        }

        if rseq == SEQNO_UNKNOWN {
            self.sequences
                .confirm_peer_sequence(identity.remote, response.receiver_seq);
        } else {
            self.check_sequence(identity.remote, rseq, response.receiver_seq)?;
        }
        Ok(response)
    }

    fn obtain_block(&mut self, identity: BlockIdentity) -> Result<Box<DataBlock>, DriverError> {
        let response = self.block_request(identity, Operation::ObtainBlock, None)?;
        let data = response.payload.ok_or(PacketError::MissingPayload)?;
        Ok(data)
    }

    fn update_block(&mut self, identity: BlockIdentity, data: &DataBlock) -> Result<(), DriverError> {
        self.block_request(identity, Operation::UpdateBlock, Some(data))?;
        Ok(())
    }

    /// Contents of a block, from the cache when resident.
    fn fetch_block(&mut self, identity: BlockIdentity) -> Result<Box<DataBlock>, DriverError> {
        let cached = self.cache_mut()?.lookup(identity).map(|data| Box::new(*data));
        if let Some(data) = cached {
            debug!(identity = %identity, "[sg] Cache hit");
            return Ok(data);
        }

        debug!(identity = %identity, "[sg] Cache miss");
        let data = self.obtain_block(identity)?;
        self.cache_mut()?.insert_or_update(identity, &data)?;
        Ok(data)
    }

    fn read_segment(
        &mut self,
        handle: FileHandle,
        segment: &BlockSegment,
        out: &mut [u8],
    ) -> Result<(), DriverError> {
        match self.directory.resolve_block(handle, segment.index)? {
            // Never written: a hole left by seeking past the end
            None => out.fill(0),
            Some(identity) => {
                let block = self.fetch_block(identity)?;
                out.copy_from_slice(&block[segment.offset..segment.offset + segment.len]);
            }
        }
        Ok(())
    }

    fn write_segment(
        &mut self,
        handle: FileHandle,
        segment: &BlockSegment,
        bytes: &[u8],
    ) -> Result<(), DriverError> {
        let range = segment.offset..segment.offset + segment.len;
        debug!(
            handle,
            index = segment.index,
            quadrants = ?segment.quadrants(),
            "[sg] Writing segment"
        );

        let (identity, block) = match self.directory.resolve_block(handle, segment.index)? {
            None => {
                let mut block = Box::new([0u8; BLOCK_SIZE]);
                block[range].copy_from_slice(bytes);
                let identity = self.create_block(&block)?;
                self.directory.record_block(handle, segment.index, identity)?;
                (identity, block)
            }
            Some(identity) => {
                let mut block = self.fetch_block(identity)?;
                block[range].copy_from_slice(bytes);
                self.update_block(identity, &block)?;
                // Read-through refresh of the updated entry
                self.cache_mut()?.lookup(identity);
                (identity, block)
            }
        };

        self.cache_mut()?.insert_or_update(identity, &block)?;

        let record = self.directory.get_mut(handle)?;
        record.extend_to(segment.end_position());
        record.set_cursor(segment.end_position());
        Ok(())
    }
}

impl<T: BlockTransport> ScatterGatherApi for SgDriver<T> {
    fn open(&mut self, path: &str) -> Result<FileHandle, DriverError> {
        self.local_id()?;
        let handle = self.directory.open(path);
        debug!(handle, path, "[sg] Opened file");
        Ok(handle)
    }

    fn read(&mut self, handle: FileHandle, buf: &mut [u8]) -> Result<usize, DriverError> {
        self.ensure_active()?;
        let record = self.directory.get(handle)?;
        let (cursor, size) = (record.cursor(), record.size());

        if cursor >= size {
            warn!(handle, cursor, size, "[sg] Read past end of file");
            return Err(DriverError::ReadPastEnd { cursor, size });
        }

        let len = (size - cursor).min(buf.len() as u64) as usize;
        let spans = segments(cursor, len).ok_or(DriverError::OffsetOverflow { cursor, len })?;
        for segment in spans {
            let out = &mut buf[segment.buf_offset..segment.buf_offset + segment.len];
            self.read_segment(handle, &segment, out)?;
        }

        self.directory
            .get_mut(handle)?
            .set_cursor(cursor + len as u64);
        Ok(len)
    }

    fn write(&mut self, handle: FileHandle, buf: &[u8]) -> Result<usize, DriverError> {
        self.ensure_active()?;
        let cursor = self.directory.get(handle)?.cursor();
        let spans = segments(cursor, buf.len()).ok_or_else(|| {
            warn!(handle, cursor, len = buf.len(), "[sg] Write past the last file offset");
            DriverError::OffsetOverflow {
                cursor,
                len: buf.len(),
            }
        })?;

        for segment in spans {
            let bytes = &buf[segment.buf_offset..segment.buf_offset + segment.len];
            self.write_segment(handle, &segment, bytes)?;
        }
        Ok(buf.len())
    }

    fn seek(&mut self, handle: FileHandle, offset: u64) -> Result<u64, DriverError> {
        self.ensure_active()?;
        self.directory.seek(handle, offset, self.config.seek_policy)
    }

    fn close(&mut self, handle: FileHandle) -> Result<(), DriverError> {
        self.ensure_active()?;
        let record = self.directory.close(handle)?;
        debug!(
            handle,
            name = record.name(),
            size = record.size(),
            blocks = record.block_count(),
            "[sg] Closed file"
        );
        Ok(())
    }

    fn shutdown(&mut self) -> Result<CacheStats, DriverError> {
        match self.state {
            EndpointState::Stopped => return Err(DriverError::SessionStopped),
            EndpointState::Online(local) => {
                let request = Packet::new(
                    local,
                    NODE_UNKNOWN,
                    BLOCK_UNKNOWN,
                    Operation::StopEndpoint,
                    self.sequences.next_local_sequence(),
                    SEQNO_UNKNOWN,
                );
                self.exchange(&request, false)?;
                info!(local = format_args!("{:#x}", local), "[sg] Endpoint stopped");
            }
            EndpointState::Offline => {}
        }

        let stats = self
            .cache
            .take()
            .map(BlockCache::teardown)
            .ok_or(DriverError::SessionStopped)?;
        self.sequences.clear();
        self.state = EndpointState::Stopped;

        info!(
            lookups = stats.lookups,
            hits = stats.hits,
            entries = stats.entries,
            "[sg] Cache hit rate {:.2}%",
            stats.hit_rate
        );
        Ok(stats)
    }
}
