//! In-process simulated block service.
//!
//! Decodes every request frame, emulates a small cluster of storage nodes
//! and answers with a real response frame, so the driver is exercised
//! end to end through the codec.
//!
//! Each node keeps its own sequence counter. A request carrying a known
//! receiver sequence must present exactly the successor of that counter;
//! a request carrying `SEQNO_UNKNOWN` (first contact) simply advances it.
//! Responses report the counter in their receiver sequence field.

use crate::domain::packet::Packet;
use crate::domain::sequence::advance_sequence;
use crate::domain::types::{
    BlockIdentity, DataBlock, NodeId, Operation, SeqNum, BLOCK_UNKNOWN, DATA_PACKET_SIZE,
    NODE_UNKNOWN, SEQNO_UNKNOWN,
};
use crate::error::TransportError;
use crate::ports::outbound::BlockTransport;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::HashMap;

/// Nodes emulated when no count is given.
pub const DEFAULT_NODE_COUNT: usize = 4;

/// Requests served, per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ServiceCounters {
    pub init: u64,
    pub stop: u64,
    pub create: u64,
    pub update: u64,
    pub obtain: u64,
    pub delete: u64,
    /// Requests refused (malformed, unknown block, out-of-order sequence)
    pub rejected: u64,
}

/// Block service held entirely in memory.
///
/// Node, endpoint and block ids come from a seeded RNG, so two services
/// built with the same seed hand out the same ids.
pub struct InMemoryBlockService {
    rng: StdRng,
    nodes: Vec<NodeId>,
    next_node: usize,
    node_seqs: HashMap<NodeId, SeqNum>,
    blocks: HashMap<BlockIdentity, Box<DataBlock>>,
    endpoint: Option<NodeId>,
    counters: ServiceCounters,
    pending_failure: Option<TransportError>,
}

impl InMemoryBlockService {
    /// Service with `DEFAULT_NODE_COUNT` nodes.
    pub fn new(seed: u64) -> Self {
        Self::with_nodes(DEFAULT_NODE_COUNT, seed)
    }

    /// Service with `node_count` nodes (at least one).
    pub fn with_nodes(node_count: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut nodes = Vec::with_capacity(node_count.max(1));
        let mut node_seqs = HashMap::new();

        while nodes.len() < node_count.max(1) {
            let node = random_id(&mut rng);
            if node_seqs.contains_key(&node) {
                continue;
            }
            node_seqs.insert(node, rng.gen_range(1..1000));
            nodes.push(node);
        }

        Self {
            rng,
            nodes,
            next_node: 0,
            node_seqs,
            blocks: HashMap::new(),
            endpoint: None,
            counters: ServiceCounters::default(),
            pending_failure: None,
        }
    }

    pub fn counters(&self) -> ServiceCounters {
        self.counters
    }

    /// Obtain requests served so far.
    pub fn obtain_count(&self) -> u64 {
        self.counters.obtain
    }

    pub fn node_ids(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Current sequence counter of `node`.
    pub fn node_sequence(&self, node: NodeId) -> Option<SeqNum> {
        self.node_seqs.get(&node).copied()
    }

    /// Endpoint id handed out by the last init, if still registered.
    pub fn endpoint(&self) -> Option<NodeId> {
        self.endpoint
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Stored contents of a block.
    pub fn stored_block(&self, identity: BlockIdentity) -> Option<&DataBlock> {
        self.blocks.get(&identity).map(|b| &**b)
    }

    /// Make the next `post` fail with `error` without touching any state.
    pub fn inject_failure(&mut self, error: TransportError) {
        self.pending_failure = Some(error);
    }

    fn reject(&mut self, reason: String) -> TransportError {
        self.counters.rejected += 1;
        tracing::warn!("[sg-mem] rejected request: {}", reason);
        TransportError::Rejected(reason)
    }

    fn fresh_block_id(&mut self, node: NodeId) -> u64 {
        loop {
            let block = random_id(&mut self.rng);
            if block != BLOCK_UNKNOWN && !self.blocks.contains_key(&BlockIdentity::new(node, block))
            {
                return block;
            }
        }
    }

    /// Check `rseq` against the node's counter and return the new counter.
    fn accept_sequence(&mut self, node: NodeId, rseq: SeqNum) -> Result<SeqNum, TransportError> {
        let current = match self.node_seqs.get(&node).copied() {
            Some(seq) => seq,
            None => return Err(self.reject(format!("unknown node {:#x}", node))),
        };
        let expected = advance_sequence(current);
        if rseq != SEQNO_UNKNOWN && rseq != expected {
            return Err(self.reject(format!(
                "out-of-order sequence for node {:#x}: expected {}, got {}",
                node, expected, rseq
            )));
        }
        self.node_seqs.insert(node, expected);
        Ok(expected)
    }

    fn existing_block(&mut self, request: &Packet) -> Result<BlockIdentity, TransportError> {
        let identity = BlockIdentity::new(request.remote, request.block);
        if !self.blocks.contains_key(&identity) {
            return Err(self.reject(format!("no such block {}", identity)));
        }
        Ok(identity)
    }

    fn handle(&mut self, request: Packet) -> Result<Packet, TransportError> {
        if request.op == Operation::InitEndpoint {
            if self.endpoint.is_some() {
                return Err(self.reject("endpoint already initialised".to_string()));
            }
            let local = random_id(&mut self.rng);
            self.endpoint = Some(local);
            self.counters.init += 1;
            return Ok(Packet::new(
                local,
                NODE_UNKNOWN,
                BLOCK_UNKNOWN,
                Operation::InitEndpoint,
                request.sender_seq,
                SEQNO_UNKNOWN,
            ));
        }

        if self.endpoint != Some(request.local) {
            return Err(self.reject(format!("unknown endpoint {:#x}", request.local)));
        }

        match request.op {
            Operation::StopEndpoint => {
                self.endpoint = None;
                self.counters.stop += 1;
                Ok(Packet::new(
                    request.local,
                    NODE_UNKNOWN,
                    BLOCK_UNKNOWN,
                    Operation::StopEndpoint,
                    request.sender_seq,
                    SEQNO_UNKNOWN,
                ))
            }
            Operation::CreateBlock => {
                let payload = match request.payload {
                    Some(payload) => payload,
                    None => return Err(self.reject("create without payload".to_string())),
                };
                let node = self.nodes[self.next_node % self.nodes.len()];
                let seq = self.accept_sequence(node, request.receiver_seq)?;
                self.next_node += 1;
                let block = self.fresh_block_id(node);
                self.blocks.insert(BlockIdentity::new(node, block), payload);
                self.counters.create += 1;
                tracing::debug!("[sg-mem] created block {:#x}/{:#x}", node, block);
                Ok(Packet::new(
                    request.local,
                    node,
                    block,
                    Operation::CreateBlock,
                    request.sender_seq,
                    seq,
                ))
            }
            Operation::UpdateBlock => {
                let identity = self.existing_block(&request)?;
                let payload = match request.payload {
                    Some(payload) => payload,
                    None => return Err(self.reject("update without payload".to_string())),
                };
                let seq = self.accept_sequence(identity.remote, request.receiver_seq)?;
                self.blocks.insert(identity, payload);
                self.counters.update += 1;
                Ok(Packet::new(
                    request.local,
                    identity.remote,
                    identity.block,
                    Operation::UpdateBlock,
                    request.sender_seq,
                    seq,
                ))
            }
            Operation::ObtainBlock => {
                let identity = self.existing_block(&request)?;
                let seq = self.accept_sequence(identity.remote, request.receiver_seq)?;
                self.counters.obtain += 1;
                let response = Packet::new(
                    request.local,
                    identity.remote,
                    identity.block,
                    Operation::ObtainBlock,
                    request.sender_seq,
                    seq,
                );
                let data: Option<DataBlock> = self.blocks.get(&identity).map(|b| **b);
                match data {
                    Some(data) => Ok(response.with_payload(&data)),
                    None => Err(self.reject(format!("no such block {}", identity))),
                }
            }
            Operation::DeleteBlock => {
                let identity = self.existing_block(&request)?;
                let seq = self.accept_sequence(identity.remote, request.receiver_seq)?;
                self.blocks.remove(&identity);
                self.counters.delete += 1;
                Ok(Packet::new(
                    request.local,
                    identity.remote,
                    identity.block,
                    Operation::DeleteBlock,
                    request.sender_seq,
                    seq,
                ))
            }
            op => Err(self.reject(format!("unsupported operation {}", op))),
        }
    }
}

impl BlockTransport for InMemoryBlockService {
    fn post(&mut self, request: &[u8]) -> Result<Vec<u8>, TransportError> {
        if let Some(error) = self.pending_failure.take() {
            return Err(error);
        }
        let request = match Packet::decode(request, request.len() == DATA_PACKET_SIZE) {
            Ok(packet) => packet,
            Err(e) => return Err(self.reject(format!("malformed request: {}", e))),
        };
        let response = self.handle(request)?;
        response
            .encode()
            .map_err(|e| TransportError::Rejected(format!("cannot encode response: {}", e)))
    }
}

/// Non-zero id that is not the unknown sentinel.
fn random_id(rng: &mut StdRng) -> u64 {
    loop {
        let id: u64 = rng.gen();
        if id != 0 && id != NODE_UNKNOWN {
            return id;
        }
    }
}
