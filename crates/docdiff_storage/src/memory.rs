//! In-memory storage backend.
//!
//! Besides holding scratch stores for tests and benchmarks, the memory
//! backend can replay the ways a store file ends up damaged on disk: a
//! writer that dies part way through an append, a file opened read-only,
//! and single-bit rot.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::io;

/// An in-memory store file image.
///
/// # Example
///
/// ```rust
/// use docdiff_storage::{StorageBackend, InMemoryBackend};
///
/// // The writer "crashes" after 12 bytes reach the image.
/// let mut backend = InMemoryBackend::new().crash_after(12);
/// assert_eq!(backend.append(b"complete").unwrap(), 0);
/// assert!(backend.append(b"torn block").is_err());
/// assert_eq!(backend.data(), b"completetorn");
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    image: RwLock<Vec<u8>>,
    crash_at: Option<u64>,
    read_only: bool,
}

impl InMemoryBackend {
    /// Creates an empty image.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a writable backend over an existing file image.
    #[must_use]
    pub fn with_data(image: Vec<u8>) -> Self {
        Self {
            image: RwLock::new(image),
            ..Self::default()
        }
    }

    /// Creates a backend over an image that rejects appends, like a file
    /// opened by the diagnostic tools.
    #[must_use]
    pub fn read_only(image: Vec<u8>) -> Self {
        Self {
            image: RwLock::new(image),
            read_only: true,
            ..Self::default()
        }
    }

    /// Simulates a writer crash once the image reaches `len` bytes.
    ///
    /// The append that crosses the limit keeps only the bytes that fit and
    /// fails; every later append fails without writing.
    #[must_use]
    pub fn crash_after(mut self, len: u64) -> Self {
        self.crash_at = Some(len);
        self
    }

    /// Returns a copy of the image.
    #[must_use]
    pub fn data(&self) -> Vec<u8> {
        self.image.read().clone()
    }

    /// Cuts the image down to `len` bytes.
    pub fn truncate(&self, len: u64) {
        let len = usize::try_from(len).unwrap_or(usize::MAX);
        self.image.write().truncate(len);
    }

    /// Flips the lowest bit of the byte at `offset`.
    ///
    /// Returns `false` if `offset` is past the end of the image.
    pub fn flip_bit(&self, offset: u64) -> bool {
        let mut image = self.image.write();
        match usize::try_from(offset).ok().and_then(|i| image.get_mut(i)) {
            Some(byte) => {
                *byte ^= 0x01;
                true
            }
            None => false,
        }
    }
}

impl StorageBackend for InMemoryBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let image = self.image.read();
        let size = image.len() as u64;
        let end = offset.saturating_add(len as u64);

        if end > size {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }

        Ok(image[offset as usize..end as usize].to_vec())
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        if self.read_only {
            return Err(StorageError::ReadOnly("in-memory image".to_string()));
        }

        let mut image = self.image.write();
        let offset = image.len() as u64;

        if let Some(limit) = self.crash_at {
            let room = usize::try_from(limit.saturating_sub(offset)).unwrap_or(usize::MAX);
            if data.len() > room {
                image.extend_from_slice(&data[..room]);
                return Err(StorageError::Io(io::Error::new(
                    io::ErrorKind::WriteZero,
                    format!("simulated crash at byte {limit}"),
                )));
            }
        }

        image.extend_from_slice(data);
        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.image.read().len() as u64)
    }

    fn sync(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }
}
