//! # File Directory
//!
//! Open-file table: handle → record, plus the per-file map from local
//! block index to the remote identity holding that block.
//!
//! ## Invariants
//!
//! - A path maps to at most one open handle; reopening an open path
//!   returns the same handle with its cursor reset to zero.
//! - Handles are dense and never reused for a different path while the
//!   first one is open.
//! - Once a block index has an identity it keeps it until close.

use crate::domain::config::SeekPolicy;
use crate::domain::types::{BlockIdentity, FileHandle};
use crate::error::DriverError;
use std::collections::{BTreeMap, HashMap};

/// Bookkeeping for one open file.
#[derive(Debug, Clone)]
pub struct FileRecord {
    handle: FileHandle,
    name: String,
    cursor: u64,
    size: u64,
    blocks: BTreeMap<u64, BlockIdentity>,
}

impl FileRecord {
    fn new(handle: FileHandle, name: &str) -> Self {
        Self {
            handle,
            name: name.to_string(),
            cursor: 0,
            size: 0,
            blocks: BTreeMap::new(),
        }
    }

    pub fn handle(&self) -> FileHandle {
        self.handle
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Identity assigned to local block `index`, if created.
    pub fn block(&self, index: u64) -> Option<BlockIdentity> {
        self.blocks.get(&index).copied()
    }

    /// All assigned blocks in index order.
    pub fn blocks(&self) -> impl Iterator<Item = (u64, BlockIdentity)> + '_ {
        self.blocks.iter().map(|(index, id)| (*index, *id))
    }

    pub(crate) fn set_cursor(&mut self, cursor: u64) {
        self.cursor = cursor;
    }

    /// Grow the logical size to cover `end`. Never shrinks.
    pub(crate) fn extend_to(&mut self, end: u64) {
        self.size = self.size.max(end);
    }
}

/// Handle-addressed table of open files.
#[derive(Debug, Default)]
pub struct FileDirectory {
    files: HashMap<FileHandle, FileRecord>,
    by_name: HashMap<String, FileHandle>,
    next_handle: FileHandle,
}

impl FileDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `path`, reusing the existing record if it is already open.
    pub fn open(&mut self, path: &str) -> FileHandle {
        if let Some(&handle) = self.by_name.get(path) {
            if let Some(record) = self.files.get_mut(&handle) {
                record.cursor = 0;
                return handle;
            }
        }

        let handle = self.next_handle;
        self.next_handle += 1;
        self.files.insert(handle, FileRecord::new(handle, path));
        self.by_name.insert(path.to_string(), handle);
        handle
    }

    /// Close `handle`, dropping its block map. Returns the unlinked record.
    pub fn close(&mut self, handle: FileHandle) -> Result<FileRecord, DriverError> {
        self.check_range(handle)?;
        let record = self
            .files
            .remove(&handle)
            .ok_or(DriverError::FileNotOpen { handle })?;
        self.by_name.remove(&record.name);
        Ok(record)
    }

    pub fn get(&self, handle: FileHandle) -> Result<&FileRecord, DriverError> {
        self.check_range(handle)?;
        self.files
            .get(&handle)
            .ok_or(DriverError::FileNotOpen { handle })
    }

    pub(crate) fn get_mut(&mut self, handle: FileHandle) -> Result<&mut FileRecord, DriverError> {
        self.check_range(handle)?;
        self.files
            .get_mut(&handle)
            .ok_or(DriverError::FileNotOpen { handle })
    }

    /// Identity of local block `index` of `handle`, if created.
    pub fn resolve_block(
        &self,
        handle: FileHandle,
        index: u64,
    ) -> Result<Option<BlockIdentity>, DriverError> {
        Ok(self.get(handle)?.block(index))
    }

    /// Associate local block `index` with `identity`. An index that
    /// already has an identity cannot be reassigned.
    pub fn record_block(
        &mut self,
        handle: FileHandle,
        index: u64,
        identity: BlockIdentity,
    ) -> Result<(), DriverError> {
        let record = self.get_mut(handle)?;
        match record.blocks.get(&index) {
            Some(existing) if *existing == identity => Ok(()),
            Some(_) => Err(DriverError::BlockAlreadyAssigned { handle, index }),
            None => {
                record.blocks.insert(index, identity);
                Ok(())
            }
        }
    }

    /// Move the cursor of `handle` to `offset`.
    ///
    /// `Permissive` reproduces the historical contract: the requested
    /// offset is always reported, but the cursor only moves while it does
    /// not exceed the file size. `Strict` rejects offsets past the size
    /// and otherwise always moves.
    pub fn seek(
        &mut self,
        handle: FileHandle,
        offset: u64,
        policy: SeekPolicy,
    ) -> Result<u64, DriverError> {
        let record = self.get_mut(handle)?;
        match policy {
            SeekPolicy::Permissive => {
                if record.cursor <= record.size {
                    record.cursor = offset;
                }
            }
            SeekPolicy::Strict => {
                if offset > record.size {
                    return Err(DriverError::SeekOutOfRange {
                        offset,
                        size: record.size,
                    });
                }
                record.cursor = offset;
            }
        }
        Ok(offset)
    }

    /// Number of files currently open.
    pub fn open_count(&self) -> usize {
        self.files.len()
    }

    /// Handles ever assigned.
    pub fn assigned_handles(&self) -> usize {
        self.next_handle
    }

    fn check_range(&self, handle: FileHandle) -> Result<(), DriverError> {
        if handle >= self.next_handle {
            return Err(DriverError::InvalidHandle { handle });
        }
        Ok(())
    }
}
