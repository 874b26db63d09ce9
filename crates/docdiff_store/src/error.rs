//! Error types for store file access.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised while reading or writing a store file.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] docdiff_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A block or structure inside the file is malformed.
    #[error("store corrupted at offset {offset}: {message}")]
    Corrupted {
        /// File offset of the offending block.
        offset: u64,
        /// Description of the corruption.
        message: String,
    },

    /// Stored and computed block checksums differ.
    #[error("checksum mismatch at offset {offset}: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// File offset of the block.
        offset: u64,
        /// Checksum stored in the block.
        expected: u32,
        /// Checksum computed over the block.
        actual: u32,
    },

    /// The file is not a store file or uses an unsupported version.
    #[error("invalid store format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },

    /// The file holds no complete header.
    #[error("no valid header found")]
    NoHeader,

    /// A compressed body could not be decompressed.
    #[error("decompression failed: {0}")]
    Decompress(String),

    /// A document has no body to read.
    #[error("document {key:?} has no body")]
    NoBody {
        /// The document key, lossily rendered.
        key: String,
    },
}

impl StoreError {
    /// Creates a corruption error.
    pub fn corrupted(offset: u64, message: impl Into<String>) -> Self {
        Self::Corrupted {
            offset,
            message: message.into(),
        }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }
}
