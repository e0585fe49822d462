//! Mutex-serialized driver handle for multi-threaded callers.

use super::SgDriver;
use crate::domain::cache::CacheStats;
use crate::domain::types::FileHandle;
use crate::error::DriverError;
use crate::ports::inbound::ScatterGatherApi;
use crate::ports::outbound::BlockTransport;
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

/// Cloneable handle to one driver session.
///
/// Every entry point takes the same lock, so calls from different threads
/// are applied one at a time in lock order.
pub struct SharedDriver<T: BlockTransport> {
    inner: Arc<Mutex<SgDriver<T>>>,
}

impl<T: BlockTransport> Clone for SharedDriver<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: BlockTransport> SharedDriver<T> {
    pub fn new(driver: SgDriver<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(driver)),
        }
    }

    /// Lock the session for a sequence of calls that must not interleave.
    pub fn lock(&self) -> MutexGuard<'_, SgDriver<T>> {
        self.inner.lock()
    }

    /// Run `f` with exclusive access to the session.
    pub fn with<R>(&self, f: impl FnOnce(&mut SgDriver<T>) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

impl<T: BlockTransport> ScatterGatherApi for SharedDriver<T> {
    fn open(&mut self, path: &str) -> Result<FileHandle, DriverError> {
        self.inner.lock().open(path)
    }

    fn read(&mut self, handle: FileHandle, buf: &mut [u8]) -> Result<usize, DriverError> {
        self.inner.lock().read(handle, buf)
    }

    fn write(&mut self, handle: FileHandle, buf: &[u8]) -> Result<usize, DriverError> {
        self.inner.lock().write(handle, buf)
    }

    fn seek(&mut self, handle: FileHandle, offset: u64) -> Result<u64, DriverError> {
        self.inner.lock().seek(handle, offset)
    }

    fn close(&mut self, handle: FileHandle) -> Result<(), DriverError> {
        self.inner.lock().close(handle)
    }

    fn shutdown(&mut self) -> Result<CacheStats, DriverError> {
        self.inner.lock().shutdown()
    }
}
