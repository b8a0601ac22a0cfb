//! Stable storage for the queue record
//!
//! The queue persists one opaque document. Storage backends only move bytes:
//! no partial updates, no append log.
//!
//! - [`MemoryStorage`]: a byte buffer, with switchable failures for tests
//! - [`FileStorage`]: a single file on a host filesystem (requires `std`)
//!
//! On a device the same trait wraps the flash filesystem.

use alloc::vec::Vec;

use crate::errors::StorageError;

/// Whole-document storage backend
pub trait QueueStorage {
    /// Read the stored record; `Ok(None)` when nothing has been stored yet
    fn load(&mut self) -> Result<Option<Vec<u8>>, StorageError>;

    /// Replace the stored record
    fn store(&mut self, record: &[u8]) -> Result<(), StorageError>;
}

impl<S: QueueStorage + ?Sized> QueueStorage for &mut S {
    fn load(&mut self) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).load()
    }

    fn store(&mut self, record: &[u8]) -> Result<(), StorageError> {
        (**self).store(record)
    }
}

/// In-memory storage
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    record: Option<Vec<u8>>,
    fail_reads: bool,
    fail_writes: bool,
    writes: usize,
}

impl MemoryStorage {
    /// Empty storage (no record)
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-loaded with a record
    pub fn with_contents(record: &[u8]) -> Self {
        Self {
            record: Some(record.to_vec()),
            ..Self::default()
        }
    }

    /// Current record, if any
    pub fn contents(&self) -> Option<&[u8]> {
        self.record.as_deref()
    }

    /// Make subsequent loads fail
    pub fn fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Make subsequent stores fail
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Successful stores so far
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl QueueStorage for MemoryStorage {
    fn load(&mut self) -> Result<Option<Vec<u8>>, StorageError> {
        if self.fail_reads {
            return Err(StorageError::ReadFailed);
        }
        Ok(self.record.clone())
    }

    fn store(&mut self, record: &[u8]) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::WriteFailed);
        }
        self.record = Some(record.to_vec());
        self.writes += 1;
        Ok(())
    }
}

/// Single-file storage
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: std::path::PathBuf,
}

#[cfg(feature = "std")]
impl FileStorage {
    /// Store the record at `path`
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the record
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[cfg(feature = "std")]
impl QueueStorage for FileStorage {
    fn load(&mut self) -> Result<Option<Vec<u8>>, StorageError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => {
                log_warn!("Cannot read {}: {}", self.path.display(), err);
                Err(StorageError::ReadFailed)
            }
        }
    }

    fn store(&mut self, record: &[u8]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|_| StorageError::Unavailable)?;
            }
        }
        std::fs::write(&self.path, record).map_err(|err| {
            log_warn!("Cannot write {}: {}", self.path.display(), err);
            StorageError::WriteFailed
        })
    }
}
