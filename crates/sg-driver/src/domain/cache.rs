//! # Block Cache
//!
//! Bounded store of block payloads keyed by [`BlockIdentity`], with
//! least-recently-used eviction driven by a logical clock.
//!
//! ## Invariants
//!
//! - Entries are unique by identity.
//! - `len() <= capacity()` at all times.
//! - Every hit and every insert advances the clock; the entry with the
//!   smallest timestamp is the eviction victim (first found on ties).
//!
//! Lookups scan linearly. Capacity is a small configuration constant, so
//! the scan is cheaper than maintaining an index.

use crate::domain::types::{BlockIdentity, DataBlock};
use crate::error::CacheError;
use serde::{Deserialize, Serialize};

#[derive(Debug)]
struct CacheEntry {
    identity: BlockIdentity,
    data: Box<DataBlock>,
    last_used: u64,
}

/// Aggregate cache statistics, reported at teardown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Total lookups performed
    pub lookups: u64,
    /// Lookups that found their block
    pub hits: u64,
    /// Lookups that did not
    pub misses: u64,
    /// `hits / lookups * 100`, zero when nothing was looked up
    pub hit_rate: f64,
    /// Entries resident when the snapshot was taken
    pub entries: usize,
    /// Entries replaced to make room
    pub evictions: u64,
}

/// LRU block cache.
#[derive(Debug)]
pub struct BlockCache {
    entries: Vec<CacheEntry>,
    capacity: usize,
    clock: u64,
    lookups: u64,
    hits: u64,
    evictions: u64,
}

impl BlockCache {
    /// Allocate a cache holding at most `capacity` blocks.
    pub fn new(capacity: usize) -> Result<Self, CacheError> {
        if capacity == 0 {
            return Err(CacheError::InvalidCapacity { capacity });
        }
        let mut entries = Vec::new();
        entries
            .try_reserve_exact(capacity)
            .map_err(|_| CacheError::Allocation { capacity })?;

        Ok(Self {
            entries,
            capacity,
            clock: 0,
            lookups: 0,
            hits: 0,
            evictions: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Look up a block. A hit refreshes the entry's timestamp.
    pub fn lookup(&mut self, identity: BlockIdentity) -> Option<&DataBlock> {
        self.lookups += 1;
        let index = self.position(identity)?;
        let now = self.tick();
        self.hits += 1;

        let entry = &mut self.entries[index];
        entry.last_used = now;
        Some(&*entry.data)
    }

    /// Insert a block, overwriting an existing entry for the same identity
    /// or evicting the least recently used one when full.
    pub fn insert_or_update(
        &mut self,
        identity: BlockIdentity,
        data: &DataBlock,
    ) -> Result<(), CacheError> {
        if identity.is_unset() {
            return Err(CacheError::ReservedIdentity {
                remote: identity.remote,
                block: identity.block,
            });
        }
        let now = self.tick();

        if let Some(index) = self.position(identity) {
            let entry = &mut self.entries[index];
            entry.data.copy_from_slice(data);
            entry.last_used = now;
            return Ok(());
        }

        if self.entries.len() < self.capacity {
            self.entries.push(CacheEntry {
                identity,
                data: Box::new(*data),
                last_used: now,
            });
            return Ok(());
        }

        // min_by_key keeps the first of equal minima
        let victim = self
            .entries
            .iter_mut()
            .min_by_key(|entry| entry.last_used)
            .ok_or(CacheError::InvalidCapacity {
                capacity: self.capacity,
            })?;
        victim.identity = identity;
        victim.data.copy_from_slice(data);
        victim.last_used = now;
        self.evictions += 1;
        Ok(())
    }

    /// Whether `identity` is resident. Does not touch statistics or
    /// timestamps.
    pub fn contains(&self, identity: BlockIdentity) -> bool {
        self.position(identity).is_some()
    }

    /// Resident identities, most recently used first.
    pub fn resident(&self) -> Vec<BlockIdentity> {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_by(|a, b| b.last_used.cmp(&a.last_used));
        entries.into_iter().map(|e| e.identity).collect()
    }

    /// Current statistics.
    pub fn stats(&self) -> CacheStats {
        let hit_rate = if self.lookups > 0 {
            self.hits as f64 / self.lookups as f64 * 100.0
        } else {
            0.0
        };
        CacheStats {
            lookups: self.lookups,
            hits: self.hits,
            misses: self.lookups - self.hits,
            hit_rate,
            entries: self.entries.len(),
            evictions: self.evictions,
        }
    }

    /// Release the cache, returning its final statistics.
    pub fn teardown(self) -> CacheStats {
        self.stats()
    }

    fn position(&self, identity: BlockIdentity) -> Option<usize> {
        self.entries.iter().position(|e| e.identity == identity)
    }
}
