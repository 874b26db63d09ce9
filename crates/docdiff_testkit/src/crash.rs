//! Torn-write and corruption testing for store files.
//!
//! A writer that dies mid-append leaves a partial block at the end of the
//! file. Readers must fall back to the last complete header. Damage inside
//! the file is a different matter and must be reported, never skipped.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docdiff_testkit::crash::{tear_tail, CrashPoint};
//!
//! let store = history_store();
//! tear_tail(store.path(), CrashPoint::DuringHeader);
//! let db = store.open();
//! ```

use docdiff_storage::{InMemoryBackend, StorageBackend};
use docdiff_store::block::{framed_len, BLOCK_HEADER_SIZE};
use docdiff_store::{Db, DbWriter, NewDoc, StoreResult};
use std::fs::{self, OpenOptions};
use std::path::Path;

use crate::fixtures::test_config;

/// Where a simulated crash cut the last append short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrashPoint {
    /// Only part of the last block's frame header reached disk.
    DuringFrameHeader,
    /// The last header block is missing its checksum.
    DuringHeader,
}

/// Truncates the file to simulate a crash while appending its final block.
///
/// Returns the new file length.
pub fn tear_tail(path: &Path, point: CrashPoint) -> u64 {
    let len = fs::metadata(path).expect("Failed to stat store").len();
    let cut = match point {
        CrashPoint::DuringFrameHeader => len - last_block_len(path) + (BLOCK_HEADER_SIZE as u64 / 2),
        CrashPoint::DuringHeader => len - 2,
    };
    truncate(path, cut);
    cut
}

/// Appends bytes that look like the start of a block but stop short.
pub fn append_garbage_tail(path: &Path, bytes: &[u8]) {
    let mut data = fs::read(path).expect("Failed to read store");
    data.extend_from_slice(bytes);
    fs::write(path, data).expect("Failed to write store");
}

/// Flips one bit of the byte at `offset`.
pub fn flip_bit(path: &Path, offset: u64) {
    let mut data = fs::read(path).expect("Failed to read store");
    let idx = usize::try_from(offset).expect("offset fits in memory");
    data[idx] ^= 0x01;
    fs::write(path, data).expect("Failed to write store");
}

/// Truncates the file to `len` bytes.
pub fn truncate(path: &Path, len: u64) {
    let file = OpenOptions::new()
        .write(true)
        .open(path)
        .expect("Failed to open store for truncation");
    file.set_len(len).expect("Failed to truncate store");
}

/// Commits `committed`, then replays a writer that dies `survived` bytes
/// into saving and committing `pending`.
///
/// Returns the image left behind.
pub fn crashed_writer_image(committed: Vec<NewDoc>, pending: Vec<NewDoc>, survived: u64) -> Vec<u8> {
    let config = test_config();
    let mut writer = DbWriter::with_backend(Box::new(InMemoryBackend::new()), &config)
        .expect("Failed to create writer");
    for doc in committed {
        writer.save(doc).expect("Failed to save doc");
    }
    writer.commit().expect("Failed to commit");
    let image = backend_image(writer.into_backend().as_ref());

    let crash_at = image.len() as u64 + survived;
    let backend = InMemoryBackend::with_data(image).crash_after(crash_at);
    let mut writer =
        DbWriter::with_backend(Box::new(backend), &config).expect("Failed to resume writer");
    // Whichever append crosses the crash point fails; the rest is moot.
    let _ = pending
        .into_iter()
        .try_for_each(|doc| writer.save(doc).map(drop))
        .and_then(|()| writer.commit().map(drop));
    backend_image(writer.into_backend().as_ref())
}

/// Opens an image the way the diagnostic tools open files: read-only.
pub fn open_image(image: Vec<u8>) -> StoreResult<Db> {
    Db::open_backend(Box::new(InMemoryBackend::read_only(image)), "image", &test_config())
}

fn backend_image(backend: &dyn StorageBackend) -> Vec<u8> {
    let size = backend.size().expect("Failed to size image");
    backend
        .read_at(0, usize::try_from(size).expect("image fits in memory"))
        .expect("Failed to read image")
}

/// Length on disk of the last block in the file.
fn last_block_len(path: &Path) -> u64 {
    let data = fs::read(path).expect("Failed to read store");
    let mut offset = 0usize;
    let mut last = 0u64;
    while offset + BLOCK_HEADER_SIZE <= data.len() {
        let len = u32::from_le_bytes(
            data[offset + 7..offset + 11]
                .try_into()
                .expect("four length bytes"),
        ) as usize;
        last = framed_len(len);
        offset += last as usize;
    }
    last
}
