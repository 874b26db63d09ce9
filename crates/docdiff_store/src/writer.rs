//! Appending documents and commits to a store file.
//!
//! The diagnostic tools never write; the writer exists so fixtures and
//! benchmarks can produce real store files with a header history.

use std::collections::BTreeMap;
use std::path::Path;

use docdiff_storage::{FileBackend, StorageBackend};
use tracing::debug;

use crate::block::{encode_block, BlockType};
use crate::config::StoreConfig;
use crate::db::{load_index, scan_headers};
use crate::docinfo::{BodyRef, ContentMeta, DocInfo, RevMeta};
use crate::error::{StoreError, StoreResult};
use crate::header::{Header, LocalDoc};
use crate::index::encode_index;

/// A document to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDoc {
    /// Document key.
    pub id: Vec<u8>,
    /// Revision sequence.
    pub rev_seq: u64,
    /// Raw rev meta bytes.
    pub rev_meta: Vec<u8>,
    /// Whether this write is a deletion.
    pub deleted: bool,
    /// Application datatype tag (low seven bits of the content meta).
    pub datatype: u8,
    /// Body bytes, uncompressed.
    pub body: Option<Vec<u8>>,
}

impl NewDoc {
    /// Creates a live document with standard rev meta and no body.
    #[must_use]
    pub fn new(id: impl Into<Vec<u8>>, rev_seq: u64, rev_meta: RevMeta) -> Self {
        Self {
            id: id.into(),
            rev_seq,
            rev_meta: rev_meta.encode(),
            deleted: false,
            datatype: 0,
            body: None,
        }
    }

    /// Attaches a body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Marks the write as a deletion.
    #[must_use]
    pub fn deleted(mut self) -> Self {
        self.deleted = true;
        self
    }

    /// Replaces the rev meta with arbitrary bytes.
    #[must_use]
    pub fn with_raw_rev_meta(mut self, rev_meta: Vec<u8>) -> Self {
        self.rev_meta = rev_meta;
        self
    }
}

/// Builds a store file one commit at a time.
///
/// Saved documents are staged in memory until [`commit`](Self::commit),
/// which appends an index block holding the full snapshot followed by a
/// header pointing at it.
pub struct DbWriter {
    backend: Box<dyn StorageBackend>,
    config: StoreConfig,
    docs: BTreeMap<Vec<u8>, DocInfo>,
    local_docs: BTreeMap<String, String>,
    update_seq: u64,
}

impl DbWriter {
    /// Creates a store file, or resumes one that already has headers.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened or an existing file is corrupt.
    pub fn create(path: &Path, config: &StoreConfig) -> StoreResult<Self> {
        let backend = FileBackend::open_with_create_dirs(path)?;
        Self::with_backend(Box::new(backend), config)
    }

    /// Writes into an arbitrary backend, resuming from its last header.
    ///
    /// # Errors
    ///
    /// Fails if the backend is read-only or holds a corrupt store.
    pub fn with_backend(backend: Box<dyn StorageBackend>, config: &StoreConfig) -> StoreResult<Self> {
        if backend.is_read_only() {
            return Err(docdiff_storage::StorageError::ReadOnly(
                "store writer needs a writable backend".to_string(),
            )
            .into());
        }

        let mut writer = Self {
            backend,
            config: config.clone(),
            docs: BTreeMap::new(),
            local_docs: BTreeMap::new(),
            update_seq: 0,
        };

        if writer.backend.size()? > 0 {
            let headers = scan_headers(writer.backend.as_ref(), &writer.config)?;
            let last = headers.last().ok_or(StoreError::NoHeader)?;
            let docs = load_index(writer.backend.as_ref(), last, &writer.config)?;
            writer.update_seq = last.update_seq;
            writer.docs = docs.into_iter().map(|d| (d.id().to_vec(), d)).collect();
            writer.local_docs = last
                .local_docs
                .iter()
                .map(|d| (d.name.clone(), d.json.clone()))
                .collect();
            debug!(update_seq = writer.update_seq, "resumed store");
        }

        Ok(writer)
    }

    /// Highest sequence number assigned so far.
    #[must_use]
    pub fn update_seq(&self) -> u64 {
        self.update_seq
    }

    /// Stages a document write and returns its sequence number.
    ///
    /// # Errors
    ///
    /// Fails if the body cannot be compressed or appended, the key is longer
    /// than 65535 bytes, or the stored body exceeds the configured block size.
    pub fn save(&mut self, doc: NewDoc) -> StoreResult<u64> {
        if doc.id.len() > usize::from(u16::MAX) || doc.rev_meta.len() > usize::from(u16::MAX) {
            return Err(StoreError::invalid_format("key or rev meta longer than 65535 bytes"));
        }

        let mut content_meta = ContentMeta::from_byte(doc.datatype & !ContentMeta::COMPRESSED);
        let body = match doc.body {
            Some(bytes) => {
                let stored = if self.config.compress_bodies {
                    content_meta = content_meta.with_compressed();
                    zstd::encode_all(bytes.as_slice(), 0)?
                } else {
                    bytes
                };
                let len = self.checked_block_len(stored.len(), "document body")?;
                let pos = self.backend.append(&encode_block(BlockType::Body, &stored))?;
                Some(BodyRef { pos, len })
            }
            None => None,
        };

        self.update_seq += 1;
        let info = DocInfo::new(
            doc.id.clone(),
            self.update_seq,
            doc.rev_seq,
            doc.rev_meta,
            doc.deleted,
            content_meta,
            body,
        );
        self.docs.insert(doc.id, info);
        Ok(self.update_seq)
    }

    /// Stages a local document.
    pub fn set_local(&mut self, name: impl Into<String>, json: impl Into<String>) {
        self.local_docs.insert(name.into(), json.into());
    }

    /// Appends the staged snapshot and a header.
    ///
    /// # Errors
    ///
    /// Fails if the blocks cannot be appended or flushed, or the index
    /// exceeds the configured block size.
    pub fn commit(&mut self) -> StoreResult<Header> {
        let index = encode_index(self.docs.values());
        self.checked_block_len(index.len(), "index")?;
        let index_pos = self.backend.append(&encode_block(BlockType::Index, &index))?;

        let deleted_count = self.docs.values().filter(|d| d.is_deleted()).count() as u64;
        let mut header = Header {
            position: 0,
            update_seq: self.update_seq,
            doc_count: self.docs.len() as u64 - deleted_count,
            deleted_count,
            index_pos,
            local_docs: self
                .local_docs
                .iter()
                .map(|(name, json)| LocalDoc {
                    name: name.clone(),
                    json: json.clone(),
                })
                .collect(),
        };
        header.position = self
            .backend
            .append(&encode_block(BlockType::Header, &header.encode()))?;

        self.backend.flush()?;
        if self.config.sync_on_commit {
            self.backend.sync()?;
        }

        debug!(
            position = header.position,
            update_seq = header.update_seq,
            docs = self.docs.len(),
            "committed header"
        );
        Ok(header)
    }

    fn checked_block_len(&self, len: usize, what: &str) -> StoreResult<u32> {
        u32::try_from(len)
            .ok()
            .filter(|&len| len <= self.config.max_block_size)
            .ok_or_else(|| {
                StoreError::invalid_format(format!(
                    "{what} of {len} bytes exceeds block limit {}",
                    self.config.max_block_size
                ))
            })
    }

    /// Hands back the backend, for reopening it with [`Db::open_backend`](crate::Db::open_backend).
    #[must_use]
    pub fn into_backend(self) -> Box<dyn StorageBackend> {
        self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Db, DocReadMode};
    use docdiff_core::VersionFingerprint;
    use docdiff_storage::InMemoryBackend;

    fn writer(config: &StoreConfig) -> DbWriter {
        DbWriter::with_backend(Box::new(InMemoryBackend::new()), config).unwrap()
    }

    #[test]
    fn save_assigns_increasing_sequences() {
        let mut w = writer(&StoreConfig::default());
        assert_eq!(w.save(NewDoc::new("a", 1, RevMeta::default())).unwrap(), 1);
        assert_eq!(w.save(NewDoc::new("b", 1, RevMeta::default())).unwrap(), 2);
        assert_eq!(w.update_seq(), 2);
    }

    #[test]
    fn commit_then_open() {
        let config = StoreConfig::default();
        let mut w = writer(&config);
        w.save(NewDoc::new("zoop", 1, RevMeta::new(1000, 0, 0)).with_body("v"))
            .unwrap();
        w.save(NewDoc::new("bar", 2, RevMeta::new(1001, 0, 0)).deleted())
            .unwrap();
        w.set_local("_local/vbstate", r#"{"state":"replica"}"#);
        let header = w.commit().unwrap();

        let db = Db::open_backend(w.into_backend(), "mem", &config).unwrap();
        assert_eq!(db.header(), &header);
        assert_eq!(db.info().doc_count, 1);
        assert_eq!(db.info().deleted_count, 1);

        let keys: Vec<_> = db.all_docs().iter().map(|d| d.id().to_vec()).collect();
        assert_eq!(keys, vec![b"bar".to_vec(), b"zoop".to_vec()]);

        let bar = db.docinfo_by_id(b"bar").unwrap();
        assert!(bar.is_deleted());
        assert_eq!(bar.entry().fingerprint(), VersionFingerprint::new(2, 1001));
        assert_eq!(db.local_doc("_local/vbstate"), Some(r#"{"state":"replica"}"#));
    }

    #[test]
    fn overwrite_replaces_staged_doc() {
        let config = StoreConfig::default();
        let mut w = writer(&config);
        w.save(NewDoc::new("shelf", 9, RevMeta::new(4484, 0, 0))).unwrap();
        w.save(NewDoc::new("shelf", 8, RevMeta::new(9393, 0, 0))).unwrap();
        w.commit().unwrap();

        let db = Db::open_backend(w.into_backend(), "mem", &config).unwrap();
        assert_eq!(db.all_docs().len(), 1);
        let shelf = db.docinfo_by_id(b"shelf").unwrap();
        assert_eq!(shelf.rev_seq(), 8);
        assert_eq!(shelf.db_seq(), 2);
    }

    #[test]
    fn compressed_body_round_trip() {
        let config = StoreConfig::new().compress_bodies(true);
        let mut w = writer(&config);
        let body = "this would be a value ".repeat(32);
        w.save(NewDoc::new("doc", 1, RevMeta::default()).with_body(body.clone()))
            .unwrap();
        w.commit().unwrap();

        let db = Db::open_backend(w.into_backend(), "mem", &config).unwrap();
        let info = db.docinfo_by_id(b"doc").unwrap();
        assert!(info.content_meta().is_compressed());

        let raw = db.open_doc(info, DocReadMode::Raw).unwrap();
        assert_ne!(raw, body.as_bytes());
        let plain = db.open_doc(info, DocReadMode::Decompress).unwrap();
        assert_eq!(plain, body.as_bytes());
    }

    #[test]
    fn open_doc_without_body_fails() {
        let config = StoreConfig::default();
        let mut w = writer(&config);
        w.save(NewDoc::new("empty", 1, RevMeta::default())).unwrap();
        w.commit().unwrap();

        let db = Db::open_backend(w.into_backend(), "mem", &config).unwrap();
        let info = db.docinfo_by_id(b"empty").unwrap();
        assert!(matches!(
            db.open_doc(info, DocReadMode::Decompress),
            Err(StoreError::NoBody { .. })
        ));
    }

    #[test]
    fn resume_continues_sequence() {
        let config = StoreConfig::default();
        let mut w = writer(&config);
        w.save(NewDoc::new("a", 1, RevMeta::default())).unwrap();
        w.set_local("_local/vbstate", "{}");
        w.commit().unwrap();

        let mut resumed = DbWriter::with_backend(w.into_backend(), &config).unwrap();
        assert_eq!(resumed.update_seq(), 1);
        assert_eq!(resumed.save(NewDoc::new("b", 1, RevMeta::default())).unwrap(), 2);
        let header = resumed.commit().unwrap();
        assert_eq!(header.doc_count, 2);
        assert!(header.local_doc("_local/vbstate").is_some());
    }

    #[test]
    fn oversized_key_is_rejected() {
        let mut w = writer(&StoreConfig::default());
        let key = vec![b'k'; 70_000];
        assert!(matches!(
            w.save(NewDoc::new(key, 1, RevMeta::default())),
            Err(StoreError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn body_over_block_limit_is_rejected_before_append() {
        let config = StoreConfig::new().max_block_size(64);
        let mut w = writer(&config);

        assert!(matches!(
            w.save(NewDoc::new("big", 1, RevMeta::default()).with_body(vec![7u8; 65])),
            Err(StoreError::InvalidFormat { .. })
        ));
        assert_eq!(w.update_seq(), 0);

        w.save(NewDoc::new("fits", 1, RevMeta::default()).with_body(vec![7u8; 64]))
            .unwrap();
        w.commit().unwrap();

        let db = Db::open_backend(w.into_backend(), "mem", &config).unwrap();
        let info = db.docinfo_by_id(b"fits").unwrap();
        assert_eq!(db.open_doc(info, DocReadMode::Raw).unwrap(), vec![7u8; 64]);
        assert!(db.docinfo_by_id(b"big").is_none());
    }

    #[test]
    fn index_over_block_limit_fails_commit() {
        let config = StoreConfig::new().max_block_size(16);
        let mut w = writer(&config);
        w.save(NewDoc::new("a-key-long-enough", 1, RevMeta::default()))
            .unwrap();

        assert!(matches!(w.commit(), Err(StoreError::InvalidFormat { .. })));
        assert_eq!(w.into_backend().size().unwrap(), 0);
    }
}
