//! Checksummed block framing.
//!
//! A store file is nothing but a sequence of blocks appended one after the
//! other:
//!
//! ```text
//! | magic (4) | version (2) | type (1) | length (4) | payload (N) | crc32 (4) |
//! ```
//!
//! The CRC covers everything before it. Integers are little endian.
//!
//! ## Recovery Policy
//!
//! - A block that does not fit in the remaining bytes is a torn write from a
//!   crashed writer. The scan stops there and everything before it is used.
//! - Bad magic, an unknown type, a future version, an oversized length or a
//!   CRC mismatch is corruption and fails the read.

use docdiff_storage::StorageBackend;
use tracing::{trace, warn};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};

/// Magic bytes opening every block.
pub const BLOCK_MAGIC: [u8; 4] = *b"DDSB";

/// Current block format version.
pub const BLOCK_VERSION: u16 = 1;

/// magic (4) + version (2) + type (1) + length (4)
pub const BLOCK_HEADER_SIZE: usize = 11;

/// Trailing checksum size.
pub const BLOCK_CRC_SIZE: usize = 4;

/// Kind of payload a block carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockType {
    /// A document body, raw or compressed.
    Body,
    /// A full by-key snapshot of doc infos.
    Index,
    /// A commit header.
    Header,
}

impl BlockType {
    /// Parses the on-disk type byte.
    #[must_use]
    pub const fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x01 => Some(Self::Body),
            0x02 => Some(Self::Index),
            0x03 => Some(Self::Header),
            _ => None,
        }
    }

    /// Returns the on-disk type byte.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        match self {
            Self::Body => 0x01,
            Self::Index => 0x02,
            Self::Header => 0x03,
        }
    }
}

/// A block read back from a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// File offset of the block's magic.
    pub offset: u64,
    /// Payload kind.
    pub block_type: BlockType,
    /// Payload bytes.
    pub payload: Vec<u8>,
}

impl Block {
    /// Size of the framed block on disk.
    #[must_use]
    pub fn encoded_len(&self) -> u64 {
        framed_len(self.payload.len())
    }

    /// Offset just past this block.
    #[must_use]
    pub fn end(&self) -> u64 {
        self.offset + self.encoded_len()
    }
}

/// On-disk size of a block carrying `payload_len` bytes.
#[must_use]
pub fn framed_len(payload_len: usize) -> u64 {
    (BLOCK_HEADER_SIZE + payload_len + BLOCK_CRC_SIZE) as u64
}

/// Frames a payload as a block.
#[must_use]
pub fn encode_block(block_type: BlockType, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(BLOCK_HEADER_SIZE + payload.len() + BLOCK_CRC_SIZE);
    buf.extend_from_slice(&BLOCK_MAGIC);
    buf.extend_from_slice(&BLOCK_VERSION.to_le_bytes());
    buf.push(block_type.as_byte());
    buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    buf.extend_from_slice(payload);
    let crc = crc32fast::hash(&buf);
    buf.extend_from_slice(&crc.to_le_bytes());
    buf
}

/// Reads the block at `offset`.
///
/// Returns `Ok(None)` when the block is incomplete (end of usable file).
///
/// # Errors
///
/// Returns an error for corruption or an I/O failure.
pub fn read_block(
    backend: &dyn StorageBackend,
    offset: u64,
    config: &StoreConfig,
) -> StoreResult<Option<Block>> {
    let size = backend.size()?;
    let header_end = offset
        .checked_add(BLOCK_HEADER_SIZE as u64)
        .ok_or_else(|| StoreError::corrupted(offset, "block offset out of range"))?;
    if header_end > size {
        return Ok(None);
    }

    let header = backend.read_at(offset, BLOCK_HEADER_SIZE)?;

    if header[0..4] != BLOCK_MAGIC {
        return Err(StoreError::corrupted(offset, "invalid block magic"));
    }

    let version = u16::from_le_bytes([header[4], header[5]]);
    if version > BLOCK_VERSION {
        return Err(StoreError::invalid_format(format!(
            "unsupported block version {version} at offset {offset}"
        )));
    }

    let type_byte = header[6];
    let block_type = BlockType::from_byte(type_byte).ok_or_else(|| {
        StoreError::corrupted(offset, format!("unknown block type {type_byte:#04x}"))
    })?;

    let len = u32::from_le_bytes([header[7], header[8], header[9], header[10]]);
    if len > config.max_block_size {
        return Err(StoreError::corrupted(
            offset,
            format!("block length {len} exceeds limit {}", config.max_block_size),
        ));
    }

    let len = len as usize;
    match offset.checked_add(framed_len(len)) {
        Some(end) if end <= size => {}
        Some(_) => return Ok(None),
        None => return Err(StoreError::corrupted(offset, "block offset out of range")),
    }

    let rest = backend.read_at(header_end, len + BLOCK_CRC_SIZE)?;
    let (payload, crc_bytes) = rest.split_at(len);

    if config.verify_checksums {
        let expected = u32::from_le_bytes([crc_bytes[0], crc_bytes[1], crc_bytes[2], crc_bytes[3]]);
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&header);
        hasher.update(payload);
        let actual = hasher.finalize();
        if expected != actual {
            return Err(StoreError::ChecksumMismatch {
                offset,
                expected,
                actual,
            });
        }
    }

    trace!(offset, ?block_type, len, "read block");

    Ok(Some(Block {
        offset,
        block_type,
        payload: payload.to_vec(),
    }))
}

/// Forward scan over every block in a file.
///
/// Yields blocks in file order. Stops cleanly at a torn tail, recording
/// where it was found; stops with an error at the first corrupt block.
pub struct BlockScanner<'a> {
    backend: &'a dyn StorageBackend,
    config: &'a StoreConfig,
    offset: u64,
    torn_tail: Option<u64>,
    finished: bool,
}

impl<'a> BlockScanner<'a> {
    /// Starts a scan at `offset`.
    pub fn new(backend: &'a dyn StorageBackend, config: &'a StoreConfig, offset: u64) -> Self {
        Self {
            backend,
            config,
            offset,
            torn_tail: None,
            finished: false,
        }
    }

    /// Offset of the incomplete trailing block, if the scan stopped on one.
    #[must_use]
    pub fn torn_tail(&self) -> Option<u64> {
        self.torn_tail
    }

    fn next_block(&mut self) -> StoreResult<Option<Block>> {
        match read_block(self.backend, self.offset, self.config)? {
            Some(block) => {
                self.offset = block.end();
                Ok(Some(block))
            }
            None => {
                if self.offset < self.backend.size()? {
                    warn!(offset = self.offset, "ignoring torn block at end of file");
                    self.torn_tail = Some(self.offset);
                }
                Ok(None)
            }
        }
    }
}

impl Iterator for BlockScanner<'_> {
    type Item = StoreResult<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_block() {
            Ok(Some(block)) => Some(Ok(block)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
