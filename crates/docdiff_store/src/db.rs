//! Read-only access to a store file.

use std::path::Path;

use docdiff_core::{check_sorted, compare_keys, Entry, RawKeyOrdering};
use docdiff_storage::{FileBackend, StorageBackend};
use tracing::debug;

use crate::block::{read_block, BlockScanner, BlockType};
use crate::config::StoreConfig;
use crate::docinfo::DocInfo;
use crate::error::{StoreError, StoreResult};
use crate::header::Header;
use crate::index::decode_index;

/// How [`Db::open_doc`] returns a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocReadMode {
    /// Bytes exactly as stored.
    Raw,
    /// Compressed bodies are decompressed.
    Decompress,
}

/// Summary of the selected header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbInfo {
    /// Live documents.
    pub doc_count: u64,
    /// Deleted documents.
    pub deleted_count: u64,
    /// Highest assigned sequence number.
    pub update_seq: u64,
    /// Offset of the selected header.
    pub header_position: u64,
}

/// An open store file positioned at one header.
///
/// Opening selects the newest complete header. [`rewind_header`](Self::rewind_header)
/// steps back through older ones; every accessor answers for the selected
/// header's snapshot.
pub struct Db {
    backend: Box<dyn StorageBackend>,
    label: String,
    config: StoreConfig,
    headers: Vec<Header>,
    current: usize,
    docs: Vec<DocInfo>,
}

impl std::fmt::Debug for Db {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Db")
            .field("label", &self.label)
            .field("headers", &self.headers.len())
            .field("current", &self.current)
            .field("docs", &self.docs.len())
            .finish()
    }
}

impl Db {
    /// Opens a store file read-only.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened, holds no complete header, or is
    /// corrupt.
    pub fn open(path: &Path, config: &StoreConfig) -> StoreResult<Self> {
        let backend = FileBackend::open_read_only(path)?;
        Self::open_backend(Box::new(backend), path.display().to_string(), config)
    }

    /// Opens a store held by an arbitrary backend; `label` names it in output.
    ///
    /// # Errors
    ///
    /// Fails if the backend holds no complete header or is corrupt.
    pub fn open_backend(
        backend: Box<dyn StorageBackend>,
        label: impl Into<String>,
        config: &StoreConfig,
    ) -> StoreResult<Self> {
        let label = label.into();
        let headers = scan_headers(backend.as_ref(), config)?;
        let current = headers.len().checked_sub(1).ok_or(StoreError::NoHeader)?;
        let docs = load_index(backend.as_ref(), &headers[current], config)?;

        debug!(
            file = %label,
            headers = headers.len(),
            update_seq = headers[current].update_seq,
            docs = docs.len(),
            "opened store"
        );

        Ok(Self {
            backend,
            label,
            config: config.clone(),
            headers,
            current,
            docs,
        })
    }

    /// The name the store was opened under.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.label
    }

    /// The selected header.
    #[must_use]
    pub fn header(&self) -> &Header {
        &self.headers[self.current]
    }

    /// Every complete header in file order, oldest first.
    #[must_use]
    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    /// Counts and sequence of the selected header.
    #[must_use]
    pub fn info(&self) -> DbInfo {
        let header = self.header();
        DbInfo {
            doc_count: header.doc_count,
            deleted_count: header.deleted_count,
            update_seq: header.update_seq,
            header_position: header.position,
        }
    }

    /// Size of the underlying file in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot report its size.
    pub fn file_size(&self) -> StoreResult<u64> {
        Ok(self.backend.size()?)
    }

    /// Every document of the snapshot, in ascending key order.
    #[must_use]
    pub fn all_docs(&self) -> &[DocInfo] {
        &self.docs
    }

    /// The snapshot as diff engine entries, in ascending key order.
    #[must_use]
    pub fn entries(&self) -> Vec<Entry> {
        self.docs.iter().map(|d| d.entry().clone()).collect()
    }

    /// Looks up one document by key.
    #[must_use]
    pub fn docinfo_by_id(&self, id: &[u8]) -> Option<&DocInfo> {
        self.docs
            .binary_search_by(|d| compare_keys(d.id(), id))
            .ok()
            .map(|i| &self.docs[i])
    }

    /// Documents written at or after sequence `since`, in sequence order.
    #[must_use]
    pub fn changes_since(&self, since: u64) -> Vec<&DocInfo> {
        let mut changes: Vec<&DocInfo> = self.docs.iter().filter(|d| d.db_seq() >= since).collect();
        changes.sort_by_key(|d| d.db_seq());
        changes
    }

    /// Reads a document body.
    ///
    /// # Errors
    ///
    /// Fails if the document has no body, the body block is missing or
    /// corrupt, or decompression fails.
    pub fn open_doc(&self, info: &DocInfo, mode: DocReadMode) -> StoreResult<Vec<u8>> {
        let body = info.body().ok_or_else(|| StoreError::NoBody {
            key: String::from_utf8_lossy(info.id()).into_owned(),
        })?;

        let block = read_block(self.backend.as_ref(), body.pos, &self.config)?
            .ok_or_else(|| StoreError::corrupted(body.pos, "body block is truncated"))?;
        if block.block_type != BlockType::Body {
            return Err(StoreError::corrupted(body.pos, "expected a body block"));
        }
        if block.payload.len() != body.len as usize {
            return Err(StoreError::corrupted(
                body.pos,
                format!(
                    "body length {} does not match doc info length {}",
                    block.payload.len(),
                    body.len
                ),
            ));
        }

        match mode {
            DocReadMode::Decompress if info.content_meta().is_compressed() => {
                zstd::decode_all(block.payload.as_slice())
                    .map_err(|e| StoreError::Decompress(e.to_string()))
            }
            _ => Ok(block.payload),
        }
    }

    /// Looks up a local document of the selected header.
    #[must_use]
    pub fn local_doc(&self, name: &str) -> Option<&str> {
        self.header().local_doc(name).map(|d| d.json.as_str())
    }

    /// Selects the header before the current one.
    ///
    /// Returns `Ok(false)`, leaving the selection unchanged, when the current
    /// header is the oldest.
    ///
    /// # Errors
    ///
    /// Fails if the older header's index is corrupt.
    pub fn rewind_header(&mut self) -> StoreResult<bool> {
        if self.current == 0 {
            return Ok(false);
        }
        let previous = self.current - 1;
        self.docs = load_index(self.backend.as_ref(), &self.headers[previous], &self.config)?;
        self.current = previous;
        debug!(
            file = %self.label,
            position = self.headers[previous].position,
            update_seq = self.headers[previous].update_seq,
            "rewound header"
        );
        Ok(true)
    }
}

/// Collects every complete header in the file, oldest first.
pub(crate) fn scan_headers(
    backend: &dyn StorageBackend,
    config: &StoreConfig,
) -> StoreResult<Vec<Header>> {
    let mut headers = Vec::new();
    for block in BlockScanner::new(backend, config, 0) {
        let block = block?;
        if block.block_type == BlockType::Header {
            headers.push(Header::decode(&block.payload, block.offset)?);
        }
    }
    Ok(headers)
}

/// Loads and validates the index a header points at.
pub(crate) fn load_index(
    backend: &dyn StorageBackend,
    header: &Header,
    config: &StoreConfig,
) -> StoreResult<Vec<DocInfo>> {
    let block = read_block(backend, header.index_pos, config)?
        .ok_or_else(|| StoreError::corrupted(header.index_pos, "index block is truncated"))?;
    if block.block_type != BlockType::Index {
        return Err(StoreError::corrupted(
            header.index_pos,
            "header does not point at an index block",
        ));
    }

    let docs = decode_index(&block.payload, block.offset)?;

    check_sorted(&docs, &RawKeyOrdering)
        .map_err(|e| StoreError::corrupted(block.offset, e.to_string()))?;

    let deleted = docs.iter().filter(|d| d.is_deleted()).count() as u64;
    let live = docs.len() as u64 - deleted;
    if live != header.doc_count || deleted != header.deleted_count {
        return Err(StoreError::corrupted(
            header.position,
            format!(
                "header counts {}/{} disagree with index counts {live}/{deleted}",
                header.doc_count, header.deleted_count
            ),
        ));
    }

    Ok(docs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docinfo::{BodyRef, ContentMeta, RevMeta};
    use crate::writer::{DbWriter, NewDoc};
    use tempfile::tempdir;

    fn config() -> StoreConfig {
        StoreConfig::new().sync_on_commit(false)
    }

    fn doc_at(pos: u64, len: u32) -> DocInfo {
        DocInfo::new(
            b"forged".to_vec(),
            1,
            1,
            RevMeta::default().encode(),
            false,
            ContentMeta::NONE,
            Some(BodyRef { pos, len }),
        )
    }

    fn write_two_commits(path: &Path) {
        let mut writer = DbWriter::create(path, &config()).unwrap();
        writer
            .save(NewDoc::new("alpha", 1, RevMeta::new(10, 0, 0)).with_body("first"))
            .unwrap();
        writer.commit().unwrap();
        writer
            .save(NewDoc::new("beta", 1, RevMeta::new(11, 0, 0)).with_body("second"))
            .unwrap();
        writer.commit().unwrap();
    }

    #[test]
    fn open_file_selects_newest_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("store.ddb");
        write_two_commits(&path);

        let mut db = Db::open(&path, &config()).unwrap();
        assert_eq!(db.path(), path.display().to_string());
        assert_eq!(db.headers().len(), 2);
        assert_eq!(db.info().update_seq, 2);
        assert_eq!(db.all_docs().len(), 2);
        assert_eq!(db.file_size().unwrap(), std::fs::metadata(&path).unwrap().len());

        let beta = db.docinfo_by_id(b"beta").unwrap();
        assert_eq!(db.open_doc(beta, DocReadMode::Decompress).unwrap(), b"second");

        assert!(db.rewind_header().unwrap());
        assert_eq!(db.info().update_seq, 1);
        assert!(db.docinfo_by_id(b"beta").is_none());
        assert!(!db.rewind_header().unwrap());
    }

    #[test]
    fn empty_file_has_no_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.ddb");
        std::fs::write(&path, b"").unwrap();

        assert!(matches!(Db::open(&path, &config()), Err(StoreError::NoHeader)));
    }

    #[test]
    fn body_offset_near_u64_max_is_corruption() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.ddb");
        write_two_commits(&path);
        let db = Db::open(&path, &config()).unwrap();

        let result = db.open_doc(&doc_at(u64::MAX - 2, 4), DocReadMode::Raw);
        assert!(matches!(result, Err(StoreError::Corrupted { .. })), "{result:?}");
    }

    #[test]
    fn body_offset_past_end_is_corruption() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.ddb");
        write_two_commits(&path);
        let db = Db::open(&path, &config()).unwrap();

        let past_end = db.file_size().unwrap() + 10;
        let result = db.open_doc(&doc_at(past_end, 4), DocReadMode::Raw);
        assert!(matches!(result, Err(StoreError::Corrupted { offset, .. }) if offset == past_end));
    }

    #[test]
    fn body_pointing_at_index_block_is_corruption() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.ddb");
        write_two_commits(&path);
        let db = Db::open(&path, &config()).unwrap();

        let index_pos = db.header().index_pos;
        let result = db.open_doc(&doc_at(index_pos, 4), DocReadMode::Raw);
        assert!(matches!(result, Err(StoreError::Corrupted { offset, .. }) if offset == index_pos));
    }

    #[test]
    fn changes_since_orders_by_sequence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.ddb");
        write_two_commits(&path);
        let db = Db::open(&path, &config()).unwrap();

        let keys: Vec<&[u8]> = db.changes_since(0).into_iter().map(DocInfo::id).collect();
        assert_eq!(keys, vec![&b"alpha"[..], &b"beta"[..]]);
        assert_eq!(db.changes_since(2).len(), 1);
        assert!(db.changes_since(3).is_empty());
    }
}
