//! Commit headers.
//!
//! ```text
//! | update_seq u64 | doc_count u64 | deleted_count u64 | index_pos u64 |
//! | local_count u32 | (name_len u16 | name | json_len u32 | json) * local_count |
//! ```
//!
//! Every commit appends one header. Walking headers from the last one back
//! to the first replays the file's history.

use crate::codec::{put_u16_bytes, put_u32_bytes, ByteReader};
use crate::error::{StoreError, StoreResult};

/// A local (non-replicated) document stored in a header, such as
/// `_local/vbstate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDoc {
    /// Local document name.
    pub name: String,
    /// JSON body.
    pub json: String,
}

/// One commit point of a store file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// File offset of the header block.
    pub position: u64,
    /// Highest sequence number assigned at this commit.
    pub update_seq: u64,
    /// Live documents in the snapshot.
    pub doc_count: u64,
    /// Deleted documents in the snapshot.
    pub deleted_count: u64,
    /// Offset of the snapshot's index block.
    pub index_pos: u64,
    /// Local documents, sorted by name.
    pub local_docs: Vec<LocalDoc>,
}

impl Header {
    /// Total documents, live and deleted.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.doc_count.saturating_add(self.deleted_count)
    }

    /// Looks up a local document by name.
    #[must_use]
    pub fn local_doc(&self, name: &str) -> Option<&LocalDoc> {
        self.local_docs.iter().find(|d| d.name == name)
    }

    pub(crate) fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(36);
        buf.extend_from_slice(&self.update_seq.to_le_bytes());
        buf.extend_from_slice(&self.doc_count.to_le_bytes());
        buf.extend_from_slice(&self.deleted_count.to_le_bytes());
        buf.extend_from_slice(&self.index_pos.to_le_bytes());
        buf.extend_from_slice(&(self.local_docs.len() as u32).to_le_bytes());
        for doc in &self.local_docs {
            put_u16_bytes(&mut buf, doc.name.as_bytes());
            put_u32_bytes(&mut buf, doc.json.as_bytes());
        }
        buf
    }

    pub(crate) fn decode(payload: &[u8], position: u64) -> StoreResult<Self> {
        let mut reader = ByteReader::new(payload, position);
        let update_seq = reader.u64()?;
        let doc_count = reader.u64()?;
        let deleted_count = reader.u64()?;
        let index_pos = reader.u64()?;
        let local_count = reader.u32()? as usize;

        let mut local_docs = Vec::with_capacity(local_count.min(payload.len()));
        for _ in 0..local_count {
            let name_len = reader.u16()? as usize;
            let name = utf8(reader.bytes(name_len)?, position, "local doc name")?;
            let json_len = reader.u32()? as usize;
            let json = utf8(reader.bytes(json_len)?, position, "local doc body")?;
            local_docs.push(LocalDoc { name, json });
        }
        reader.finish()?;

        if index_pos >= position {
            return Err(StoreError::corrupted(
                position,
                format!("header points forward to index at {index_pos}"),
            ));
        }

        Ok(Self {
            position,
            update_seq,
            doc_count,
            deleted_count,
            index_pos,
            local_docs,
        })
    }
}

fn utf8(bytes: &[u8], position: u64, what: &str) -> StoreResult<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|_| StoreError::corrupted(position, format!("{what} is not UTF-8")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn header() -> Header {
        Header {
            position: 500,
            update_seq: 42,
            doc_count: 10,
            deleted_count: 2,
            index_pos: 300,
            local_docs: vec![LocalDoc {
                name: "_local/vbstate".to_string(),
                json: r#"{"state":"active"}"#.to_string(),
            }],
        }
    }

    #[test]
    fn header_round_trip() {
        let h = header();
        assert_eq!(Header::decode(&h.encode(), 500).unwrap(), h);
        assert_eq!(h.entry_count(), 12);
    }

    #[test]
    fn entry_count_saturates_on_forged_counts() {
        let h = Header {
            doc_count: u64::MAX,
            deleted_count: 3,
            ..header()
        };
        assert_eq!(h.entry_count(), u64::MAX);
    }

    #[test]
    fn local_doc_lookup() {
        let h = header();
        assert!(h.local_doc("_local/vbstate").is_some());
        assert!(h.local_doc("_local/other").is_none());
    }

    #[test]
    fn forward_index_pointer_is_corruption() {
        let h = header();
        assert!(matches!(
            Header::decode(&h.encode(), 200),
            Err(StoreError::Corrupted { offset: 200, .. })
        ));
    }

    fn header_strategy() -> impl Strategy<Value = Header> {
        (
            0..u64::MAX / 2,
            1..u64::MAX / 2,
            any::<u64>(),
            any::<u64>(),
            any::<u64>(),
            prop::collection::vec(("[a-z_/]{1,16}", "\\PC{0,32}"), 0..4),
        )
            .prop_map(|(index_pos, gap, update_seq, doc_count, deleted_count, locals)| Header {
                position: index_pos + gap,
                update_seq,
                doc_count,
                deleted_count,
                index_pos,
                local_docs: locals
                    .into_iter()
                    .map(|(name, json)| LocalDoc { name, json })
                    .collect(),
            })
    }

    proptest! {
        #[test]
        fn encoded_headers_decode_back(h in header_strategy()) {
            prop_assert_eq!(Header::decode(&h.encode(), h.position).unwrap(), h);
        }

        #[test]
        fn trailing_bytes_are_rejected(h in header_strategy(), extra in 1usize..8) {
            let mut payload = h.encode();
            payload.extend(std::iter::repeat(0u8).take(extra));
            prop_assert!(Header::decode(&payload, h.position).is_err());
        }
    }
}
