//! # Sequence Tracker
//!
//! Owns the local outgoing sequence counter and the last sequence number
//! negotiated with every remote peer.
//!
//! The tracker itself never fails. Deciding that a response is stale is
//! the caller's job, using [`SequenceTracker::peer_sequence`].

use crate::domain::types::{NodeId, SeqNum, INITIAL_SEQNO, SEQNO_UNKNOWN};
use std::collections::HashMap;

/// Local and per-peer sequence state for one session.
#[derive(Debug, Clone)]
pub struct SequenceTracker {
    next_local: SeqNum,
    peers: HashMap<NodeId, SeqNum>,
}

impl Default for SequenceTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self {
            next_local: INITIAL_SEQNO,
            peers: HashMap::new(),
        }
    }

    /// Return the next local sender sequence number.
    ///
    /// Zero and `SEQNO_UNKNOWN` are never handed out; after the last usable
    /// value the counter restarts at `INITIAL_SEQNO`.
    pub fn next_local_sequence(&mut self) -> SeqNum {
        let seq = self.next_local;
        self.next_local = advance_sequence(seq);
        seq
    }

    /// Sequence number for `remote` after a response that carried
    /// `observed`.
    ///
    /// Unknown peer: registered at `observed`, which is returned.
    /// Known peer: its sequence is incremented and returned.
    pub fn next_peer_sequence(&mut self, remote: NodeId, observed: SeqNum) -> SeqNum {
        let seq = self.expected_peer_sequence(remote, observed);
        self.peers.insert(remote, seq);
        seq
    }

    /// What [`next_peer_sequence`] would return, without recording it.
    ///
    /// [`next_peer_sequence`]: SequenceTracker::next_peer_sequence
    pub fn expected_peer_sequence(&self, remote: NodeId, observed: SeqNum) -> SeqNum {
        match self.peers.get(&remote) {
            Some(&seq) => advance_sequence(seq),
            None => observed,
        }
    }

    /// Receiver sequence to stamp on the next request to `remote`.
    ///
    /// Known peers get the successor of their stored value; unknown peers
    /// get `SEQNO_UNKNOWN`. Nothing is recorded until the peer answers
    /// and the value is confirmed.
    pub fn outgoing_peer_sequence(&self, remote: NodeId) -> SeqNum {
        match self.peers.get(&remote) {
            Some(&seq) => advance_sequence(seq),
            None => SEQNO_UNKNOWN,
        }
    }

    /// Record a sequence number confirmed by `remote`. Never moves a peer
    /// backwards.
    pub fn confirm_peer_sequence(&mut self, remote: NodeId, observed: SeqNum) {
        self.peers
            .entry(remote)
            .and_modify(|seq| *seq = (*seq).max(observed))
            .or_insert(observed);
    }

    /// Last sequence number negotiated with `remote`, if any.
    pub fn peer_sequence(&self, remote: NodeId) -> Option<SeqNum> {
        self.peers.get(&remote).copied()
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Forget every peer. Used at shutdown.
    pub fn clear(&mut self) {
        self.peers.clear();
    }
}

/// Successor of `seq`, skipping zero and `SEQNO_UNKNOWN`.
pub fn advance_sequence(seq: SeqNum) -> SeqNum {
    match seq.wrapping_add(1) {
        0 | SEQNO_UNKNOWN => INITIAL_SEQNO,
        next => next,
    }
}
