//! # Inbound Ports (Driving Ports)
//!
//! The file-level API of the driver.

use crate::domain::cache::CacheStats;
use crate::domain::types::FileHandle;
use crate::error::DriverError;

/// Byte-addressable file interface over the remote block service.
///
/// Every method returns `Err` instead of a sentinel; use
/// [`DriverError::status_code`] where the `-1` convention is required.
pub trait ScatterGatherApi {
    /// Open `path`, initialising the endpoint on first use.
    ///
    /// Reopening a path that is already open returns the same handle and
    /// rewinds its cursor to zero.
    fn open(&mut self, path: &str) -> Result<FileHandle, DriverError>;

    /// Read up to `buf.len()` bytes at the cursor.
    ///
    /// ## Errors
    ///
    /// - `InvalidHandle` / `FileNotOpen`: unknown handle
    /// - `ReadPastEnd`: cursor is at or beyond the file size
    fn read(&mut self, handle: FileHandle, buf: &mut [u8]) -> Result<usize, DriverError>;

    /// Write `buf` at the cursor, creating remote blocks as needed.
    fn write(&mut self, handle: FileHandle, buf: &[u8]) -> Result<usize, DriverError>;

    /// Move the cursor. Returns the requested offset.
    ///
    /// Bounds handling follows the configured
    /// [`SeekPolicy`](crate::domain::config::SeekPolicy).
    fn seek(&mut self, handle: FileHandle, offset: u64) -> Result<u64, DriverError>;

    /// Close `handle`, forgetting its block map.
    fn close(&mut self, handle: FileHandle) -> Result<(), DriverError>;

    /// Stop the endpoint and release the cache, returning its statistics.
    ///
    /// The session is unusable afterwards.
    fn shutdown(&mut self) -> Result<CacheStats, DriverError>;
}
