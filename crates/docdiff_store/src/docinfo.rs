//! Per-document metadata stored in index blocks.
//!
//! ```text
//! | key_len u16 | key | db_seq u64 | rev_seq u64 | rev_meta_len u16 | rev_meta |
//! | flags u8 | content_meta u8 | body_pos u64 | body_len u32 |
//! ```
//!
//! `body_pos == u64::MAX` marks a document without a body.

use docdiff_core::{Entry, VersionFingerprint};

use crate::codec::{put_u16_bytes, ByteReader};
use crate::error::StoreResult;

const NO_BODY: u64 = u64::MAX;
const FLAG_DELETED: u8 = 0x01;

/// Content metadata byte of a document.
///
/// The high bit records that the stored body is compressed; the low seven
/// bits are an opaque datatype tag owned by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContentMeta(u8);

impl ContentMeta {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// Body is stored compressed.
    pub const COMPRESSED: u8 = 0x80;

    /// Creates content meta from its raw byte.
    #[must_use]
    pub const fn from_byte(b: u8) -> Self {
        Self(b)
    }

    /// Returns the raw byte.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self.0
    }

    /// Checks the compressed bit.
    #[must_use]
    pub const fn is_compressed(self) -> bool {
        self.0 & Self::COMPRESSED != 0
    }

    /// Sets the compressed bit.
    #[must_use]
    pub const fn with_compressed(self) -> Self {
        Self(self.0 | Self::COMPRESSED)
    }

    /// The datatype tag without the compressed bit.
    #[must_use]
    pub const fn datatype(self) -> u8 {
        self.0 & !Self::COMPRESSED
    }
}

/// The 16-byte revision metadata the store's writers attach to each doc.
///
/// Big endian: `cas u64 | expiry u32 | flags u32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RevMeta {
    /// Compare-and-swap stamp of the mutation.
    pub cas: u64,
    /// Expiry time, 0 for none.
    pub expiry: u32,
    /// Application flags.
    pub flags: u32,
}

impl RevMeta {
    /// Encoded size.
    pub const SIZE: usize = 16;

    /// Creates rev meta.
    #[must_use]
    pub const fn new(cas: u64, expiry: u32, flags: u32) -> Self {
        Self { cas, expiry, flags }
    }

    /// Encodes to the 16-byte wire form.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::SIZE);
        buf.extend_from_slice(&self.cas.to_be_bytes());
        buf.extend_from_slice(&self.expiry.to_be_bytes());
        buf.extend_from_slice(&self.flags.to_be_bytes());
        buf
    }

    /// Parses rev meta; `None` unless `raw` is exactly 16 bytes.
    #[must_use]
    pub fn decode(raw: &[u8]) -> Option<Self> {
        if raw.len() != Self::SIZE {
            return None;
        }
        let cas = u64::from_be_bytes(raw[0..8].try_into().ok()?);
        let expiry = u32::from_be_bytes(raw[8..12].try_into().ok()?);
        let flags = u32::from_be_bytes(raw[12..16].try_into().ok()?);
        Some(Self { cas, expiry, flags })
    }
}

/// Reads the CAS from the leading bytes of raw rev meta.
///
/// Rev meta shorter than 8 bytes carries no CAS and yields 0.
#[must_use]
pub fn cas_from_rev_meta(raw: &[u8]) -> u64 {
    raw.get(0..8)
        .and_then(|b| b.try_into().ok())
        .map_or(0, u64::from_be_bytes)
}

/// Location of a document body block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyRef {
    /// Offset of the body block.
    pub pos: u64,
    /// Stored (possibly compressed) payload length.
    pub len: u32,
}

/// Metadata of one document as recorded by one header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocInfo {
    entry: Entry,
    rev_meta: Vec<u8>,
    content_meta: ContentMeta,
    body: Option<BodyRef>,
}

impl DocInfo {
    pub(crate) fn new(
        id: Vec<u8>,
        db_seq: u64,
        rev_seq: u64,
        rev_meta: Vec<u8>,
        deleted: bool,
        content_meta: ContentMeta,
        body: Option<BodyRef>,
    ) -> Self {
        let fingerprint = VersionFingerprint::new(rev_seq, cas_from_rev_meta(&rev_meta));
        let entry = Entry::new(id, fingerprint)
            .with_deleted(deleted)
            .with_sequence(db_seq)
            .with_content_flags(u32::from(content_meta.as_byte()));
        Self {
            entry,
            rev_meta,
            content_meta,
            body,
        }
    }

    /// Document key.
    #[must_use]
    pub fn id(&self) -> &[u8] {
        self.entry.key()
    }

    /// Store sequence number of the write.
    #[must_use]
    pub fn db_seq(&self) -> u64 {
        self.entry.sequence()
    }

    /// Revision sequence.
    #[must_use]
    pub fn rev_seq(&self) -> u64 {
        self.entry.fingerprint().rev_seq
    }

    /// Raw rev meta bytes.
    #[must_use]
    pub fn rev_meta(&self) -> &[u8] {
        &self.rev_meta
    }

    /// Parsed rev meta when it has the standard 16-byte layout.
    #[must_use]
    pub fn parsed_rev_meta(&self) -> Option<RevMeta> {
        RevMeta::decode(&self.rev_meta)
    }

    /// Whether this version is a deletion.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.entry.is_deleted()
    }

    /// Content metadata byte.
    #[must_use]
    pub fn content_meta(&self) -> ContentMeta {
        self.content_meta
    }

    /// Body location, if the document has one.
    #[must_use]
    pub fn body(&self) -> Option<BodyRef> {
        self.body
    }

    /// The diff engine's view of this document.
    #[must_use]
    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    pub(crate) fn encode(&self, buf: &mut Vec<u8>) {
        put_u16_bytes(buf, self.id());
        buf.extend_from_slice(&self.db_seq().to_le_bytes());
        buf.extend_from_slice(&self.rev_seq().to_le_bytes());
        put_u16_bytes(buf, &self.rev_meta);
        buf.push(if self.is_deleted() { FLAG_DELETED } else { 0 });
        buf.push(self.content_meta.as_byte());
        let (pos, len) = self.body.map_or((NO_BODY, 0), |b| (b.pos, b.len));
        buf.extend_from_slice(&pos.to_le_bytes());
        buf.extend_from_slice(&len.to_le_bytes());
    }

    pub(crate) fn decode(reader: &mut ByteReader<'_>) -> StoreResult<Self> {
        let key_len = reader.u16()? as usize;
        let id = reader.bytes(key_len)?.to_vec();
        let db_seq = reader.u64()?;
        let rev_seq = reader.u64()?;
        let meta_len = reader.u16()? as usize;
        let rev_meta = reader.bytes(meta_len)?.to_vec();
        let flags = reader.u8()?;
        let content_meta = ContentMeta::from_byte(reader.u8()?);
        let pos = reader.u64()?;
        let len = reader.u32()?;
        let body = (pos != NO_BODY).then_some(BodyRef { pos, len });
        Ok(Self::new(
            id,
            db_seq,
            rev_seq,
            rev_meta,
            flags & FLAG_DELETED != 0,
            content_meta,
            body,
        ))
    }
}

impl AsRef<Entry> for DocInfo {
    fn as_ref(&self) -> &Entry {
        &self.entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rev_meta_layout_is_big_endian() {
        let raw = RevMeta::new(0x0102_0304_0506_0708, 2, 3).encode();
        assert_eq!(raw.len(), RevMeta::SIZE);
        assert_eq!(&raw[0..8], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(&raw[8..12], &[0, 0, 0, 2]);
        assert_eq!(RevMeta::decode(&raw), Some(RevMeta::new(0x0102_0304_0506_0708, 2, 3)));
    }

    #[test]
    fn nonstandard_rev_meta() {
        assert_eq!(RevMeta::decode(&[0u8; 12]), None);
        assert_eq!(cas_from_rev_meta(&[0, 0, 0, 0, 0, 0, 0, 42, 9]), 42);
        assert_eq!(cas_from_rev_meta(&[1, 2, 3]), 0);
    }

    #[test]
    fn fingerprint_comes_from_rev_seq_and_cas() {
        let info = DocInfo::new(
            b"foo".to_vec(),
            4,
            7,
            RevMeta::new(1000, 0, 0).encode(),
            false,
            ContentMeta::NONE,
            None,
        );
        assert_eq!(info.entry().fingerprint(), VersionFingerprint::new(7, 1000));
        assert_eq!(info.entry().sequence(), 4);
    }

    #[test]
    fn encode_decode_with_and_without_body() {
        let with_body = DocInfo::new(
            b"neat".to_vec(),
            12,
            8,
            RevMeta::new(9393, 0, 1).encode(),
            false,
            ContentMeta::NONE.with_compressed(),
            Some(BodyRef { pos: 77, len: 19 }),
        );
        let tombstone = DocInfo::new(b"gone".to_vec(), 13, 9, Vec::new(), true, ContentMeta::NONE, None);

        let mut buf = Vec::new();
        with_body.encode(&mut buf);
        tombstone.encode(&mut buf);

        let mut reader = ByteReader::new(&buf, 0);
        assert_eq!(DocInfo::decode(&mut reader).unwrap(), with_body);
        assert_eq!(DocInfo::decode(&mut reader).unwrap(), tombstone);
        assert!(reader.finish().is_ok());
    }

    #[test]
    fn content_meta_bits() {
        let meta = ContentMeta::from_byte(0x03).with_compressed();
        assert!(meta.is_compressed());
        assert_eq!(meta.datatype(), 0x03);
        assert!(!ContentMeta::NONE.is_compressed());
    }

    fn docinfo_strategy() -> impl Strategy<Value = DocInfo> {
        (
            prop::collection::vec(any::<u8>(), 0..32),
            any::<u64>(),
            any::<u64>(),
            prop::collection::vec(any::<u8>(), 0..24),
            any::<bool>(),
            any::<u8>(),
            prop::option::of((0..u64::MAX, any::<u32>())),
        )
            .prop_map(|(id, db_seq, rev_seq, rev_meta, deleted, meta, body)| {
                DocInfo::new(
                    id,
                    db_seq,
                    rev_seq,
                    rev_meta,
                    deleted,
                    ContentMeta::from_byte(meta),
                    body.map(|(pos, len)| BodyRef { pos, len }),
                )
            })
    }

    proptest! {
        #[test]
        fn encoded_docinfos_decode_back(docs in prop::collection::vec(docinfo_strategy(), 0..8)) {
            let mut buf = Vec::new();
            for doc in &docs {
                doc.encode(&mut buf);
            }

            let mut reader = ByteReader::new(&buf, 0);
            for doc in &docs {
                prop_assert_eq!(&DocInfo::decode(&mut reader).unwrap(), doc);
            }
            prop_assert!(reader.finish().is_ok());
        }

        #[test]
        fn truncated_docinfo_never_panics(doc in docinfo_strategy(), cut in any::<prop::sample::Index>()) {
            let mut buf = Vec::new();
            doc.encode(&mut buf);
            let cut = cut.index(buf.len());

            let mut reader = ByteReader::new(&buf[..cut], 0);
            prop_assert!(DocInfo::decode(&mut reader).is_err());
        }
    }
}
